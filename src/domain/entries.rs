//! Typed views of the CMS entries the site renders.
//!
//! The CMS owns the schemas, so decoding is lenient: unknown fields are
//! ignored, missing or `null` fields fall back to defaults, and numeric
//! fields accept either JSON numbers or numeric strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::assets::AssetRef;

/// Completion flag stored on the site configuration entry.
///
/// Entries written by different tools store it as a boolean, the string
/// `"true"`, or the number `1`; all of them count as set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SetupFlag(bool);

impl SetupFlag {
    pub fn from_value(value: &Value) -> Self {
        let set = match value {
            Value::Bool(flag) => *flag,
            Value::String(text) => matches!(text.trim(), "true" | "1"),
            Value::Number(number) => number.as_f64() == Some(1.0),
            _ => false,
        };
        Self(set)
    }

    pub fn is_set(self) -> bool {
        self.0
    }
}

impl<'de> Deserialize<'de> for SetupFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub site_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub site_subtitle: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner_email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub bio: String,
    pub avatar_photo: Option<AssetRef>,
    pub resume_cv: Option<AssetRef>,
    #[serde(deserialize_with = "lenient_count")]
    pub years_experience: Option<u32>,
    pub work_location: Option<String>,
    #[serde(deserialize_with = "lenient_count")]
    pub projects_completed: Option<u32>,
    #[serde(deserialize_with = "lenient_count")]
    pub technologies_count: Option<u32>,
    pub time_zone: Option<String>,
    pub github_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub setup_completed: SetupFlag,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HomePageContent {
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hero_headline: String,
    pub hero_subtext: Option<String>,
    pub about_section: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub skills: Vec<String>,
    pub contact_email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BlogPost {
    #[serde(deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    pub excerpt: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub blog_tags: Vec<String>,
    pub featured_image: Option<AssetRef>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkExperience {
    #[serde(deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub company: String,
    #[serde(deserialize_with = "null_as_default")]
    pub position: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub current_position: bool,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PortfolioProject {
    #[serde(deserialize_with = "null_as_default")]
    pub uid: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub slug: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub technologies: Vec<String>,
    pub live_url: Option<String>,
    pub github_url: Option<String>,
    pub project_type: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub featured: bool,
    pub featured_image: Option<AssetRef>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let count = match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|v| *v >= 0.0).map(|v| v as u64)),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.and_then(|value| u32::try_from(value).ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn setup_flag_accepts_every_known_encoding() {
        for value in [json!(true), json!("true"), json!(1), json!("1"), json!(1.0)] {
            assert!(SetupFlag::from_value(&value).is_set(), "{value} should be set");
        }
        for value in [json!(false), json!("false"), json!(0), json!(null), json!("yes")] {
            assert!(!SetupFlag::from_value(&value).is_set(), "{value} should be unset");
        }
    }

    #[test]
    fn site_configuration_tolerates_nulls_and_string_numbers() {
        let config: SiteConfiguration = serde_json::from_value(json!({
            "uid": "blt1",
            "site_name": "Folio",
            "owner_name": "Ada",
            "bio": null,
            "years_experience": "7",
            "projects_completed": 12,
            "setup_completed": "true",
            "unknown_field": {"nested": true}
        }))
        .expect("decodes");

        assert_eq!(config.site_name, "Folio");
        assert_eq!(config.bio, "");
        assert_eq!(config.years_experience, Some(7));
        assert_eq!(config.projects_completed, Some(12));
        assert!(config.setup_completed.is_set());
    }

    #[test]
    fn work_experience_defaults_missing_fields() {
        let work: WorkExperience = serde_json::from_value(json!({
            "title": "Engineer at Example",
            "technologies": null
        }))
        .expect("decodes");

        assert!(work.technologies.is_empty());
        assert!(!work.current_position);
        assert!(work.start_date.is_none());
    }
}
