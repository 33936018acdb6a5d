//! First-run setup submission and the site configuration entry it produces.

use serde_json::{Map, Value, json};

use crate::domain::error::DomainError;

pub const SITE_CONFIGURATION_TITLE: &str = "Site Configuration";
pub const MISSING_REQUIRED_FIELDS: &str = "Owner name and site name are required";

/// Raw fields posted by the setup form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupSubmission {
    pub owner_name: Option<String>,
    pub owner_email: Option<String>,
    pub site_name: Option<String>,
    pub site_subtitle: Option<String>,
    pub bio: Option<String>,
}

/// A submission whose required fields are present and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSetup {
    pub owner_name: String,
    pub owner_email: String,
    pub site_name: String,
    pub site_subtitle: String,
    pub bio: String,
}

/// Ways of pointing a file field at an uploaded asset.
///
/// Stacks differ in which form they accept on create; callers try them in
/// the order of [`AvatarAttachment::ATTEMPT_ORDER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarAttachment {
    BareUid,
    UidObject,
}

impl AvatarAttachment {
    pub const ATTEMPT_ORDER: [AvatarAttachment; 2] =
        [AvatarAttachment::BareUid, AvatarAttachment::UidObject];

    fn encode(self, asset_uid: &str) -> Value {
        match self {
            AvatarAttachment::BareUid => Value::String(asset_uid.to_string()),
            AvatarAttachment::UidObject => json!({ "uid": asset_uid }),
        }
    }
}

impl SetupSubmission {
    pub fn validate(self) -> Result<ValidSetup, DomainError> {
        let owner_name = trimmed(self.owner_name);
        let site_name = trimmed(self.site_name);
        let missing: Vec<&'static str> = [("ownerName", &owner_name), ("siteName", &site_name)]
            .into_iter()
            .filter_map(|(field, value)| value.is_empty().then_some(field))
            .collect();
        if !missing.is_empty() {
            return Err(DomainError::missing_fields(missing));
        }

        Ok(ValidSetup {
            owner_name,
            site_name,
            owner_email: trimmed(self.owner_email),
            site_subtitle: trimmed(self.site_subtitle),
            bio: trimmed(self.bio),
        })
    }
}

impl ValidSetup {
    /// Entry body for the site configuration content type.
    pub fn to_entry(&self, avatar: Option<(&str, AvatarAttachment)>) -> Value {
        let mut entry = Map::new();
        entry.insert("title".into(), SITE_CONFIGURATION_TITLE.into());
        entry.insert("site_name".into(), self.site_name.clone().into());
        entry.insert("site_subtitle".into(), self.site_subtitle.clone().into());
        entry.insert("owner_name".into(), self.owner_name.clone().into());
        entry.insert("owner_email".into(), self.owner_email.clone().into());
        entry.insert("bio".into(), self.bio.clone().into());
        entry.insert("setup_completed".into(), Value::Bool(true));
        if let Some((asset_uid, attachment)) = avatar {
            entry.insert("avatar_photo".into(), attachment.encode(asset_uid));
        }
        Value::Object(entry)
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(owner: &str, site: &str) -> SetupSubmission {
        SetupSubmission {
            owner_name: Some(owner.to_string()),
            site_name: Some(site.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn missing_owner_or_site_name_is_rejected() {
        for candidate in [submission("", "Site"), submission("Ada", "   "), SetupSubmission::default()] {
            let err = candidate.validate().expect_err("should be rejected");
            assert!(matches!(err, DomainError::MissingFields { .. }));
        }
    }

    #[test]
    fn error_names_every_blank_field() {
        let err = SetupSubmission::default().validate().expect_err("rejected");
        let DomainError::MissingFields { fields } = &err;
        assert_eq!(fields, &["ownerName", "siteName"]);
        assert!(err.to_string().starts_with(MISSING_REQUIRED_FIELDS));
    }

    #[test]
    fn fields_are_trimmed() {
        let valid = SetupSubmission {
            owner_email: Some("  ada@example.com ".into()),
            ..submission("  Ada Lovelace ", " Notes ")
        }
        .validate()
        .expect("valid");

        assert_eq!(valid.owner_name, "Ada Lovelace");
        assert_eq!(valid.site_name, "Notes");
        assert_eq!(valid.owner_email, "ada@example.com");
        assert_eq!(valid.bio, "");
    }

    #[test]
    fn entry_marks_setup_completed_and_encodes_avatar() {
        let valid = submission("Ada", "Notes").validate().expect("valid");

        let plain = valid.to_entry(None);
        assert_eq!(plain["setup_completed"], Value::Bool(true));
        assert_eq!(plain["title"], SITE_CONFIGURATION_TITLE);
        assert!(plain.get("avatar_photo").is_none());

        let bare = valid.to_entry(Some(("blt9", AvatarAttachment::BareUid)));
        assert_eq!(bare["avatar_photo"], json!("blt9"));

        let object = valid.to_entry(Some(("blt9", AvatarAttachment::UidObject)));
        assert_eq!(object["avatar_photo"], json!({"uid": "blt9"}));
    }
}
