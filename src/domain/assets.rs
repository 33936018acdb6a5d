//! File references as they appear on CMS entries.
//!
//! A file field can come back as a bare string (an asset uid or a full URL),
//! as a single asset object, or as a list of asset objects depending on how
//! the entry was written and which API served it.

use serde::{Deserialize, Serialize};

const ASSET_UID_PREFIX: &str = "blt";
const ASSET_CDN_HOST: &str = "images.contentstack.io";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum AssetRef {
    Reference(String),
    Files(Vec<AssetFile>),
    File(AssetFile),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetFile {
    pub uid: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAsset {
    Url(String),
    Uid(String),
    Missing,
}

impl AssetRef {
    pub fn resolve(&self) -> ResolvedAsset {
        match self {
            AssetRef::Reference(value) => resolve_reference(value),
            AssetRef::Files(files) => files
                .first()
                .map(AssetFile::resolve)
                .unwrap_or(ResolvedAsset::Missing),
            AssetRef::File(file) => file.resolve(),
        }
    }

    /// Direct URL when one is known, otherwise a CDN download URL for a bare uid.
    pub fn display_url(&self, stack_api_key: Option<&str>) -> Option<String> {
        match self.resolve() {
            ResolvedAsset::Url(url) => Some(url),
            ResolvedAsset::Uid(uid) => stack_api_key.map(|key| cdn_download_url(key, &uid)),
            ResolvedAsset::Missing => None,
        }
    }
}

impl AssetFile {
    fn resolve(&self) -> ResolvedAsset {
        if let Some(url) = non_blank(self.url.as_deref()) {
            return ResolvedAsset::Url(url.to_string());
        }
        match non_blank(self.uid.as_deref()) {
            Some(uid) => ResolvedAsset::Uid(uid.to_string()),
            None => ResolvedAsset::Missing,
        }
    }
}

fn resolve_reference(value: &str) -> ResolvedAsset {
    let value = value.trim();
    if value.is_empty() {
        ResolvedAsset::Missing
    } else if is_asset_uid(value) {
        ResolvedAsset::Uid(value.to_string())
    } else {
        ResolvedAsset::Url(value.to_string())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

pub fn is_asset_uid(value: &str) -> bool {
    value.starts_with(ASSET_UID_PREFIX) && !value.contains('/')
}

pub fn cdn_download_url(stack_api_key: &str, asset_uid: &str) -> String {
    format!("https://{ASSET_CDN_HOST}/v3/assets/{stack_api_key}/{asset_uid}/download")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> AssetRef {
        serde_json::from_value(value).expect("asset ref")
    }

    #[test]
    fn bare_uid_is_resolved_as_uid() {
        let asset = parse(json!("blt0123456789abcdef"));
        assert_eq!(
            asset.resolve(),
            ResolvedAsset::Uid("blt0123456789abcdef".to_string())
        );
    }

    #[test]
    fn bare_url_is_used_directly() {
        let asset = parse(json!("https://example.com/me.png"));
        assert_eq!(
            asset.display_url(None),
            Some("https://example.com/me.png".to_string())
        );
    }

    #[test]
    fn object_and_list_forms_prefer_url() {
        let single = parse(json!({"uid": "blt1", "url": "https://cdn/a.png"}));
        let list = parse(json!([{"url": "https://cdn/b.png"}, {"url": "https://cdn/c.png"}]));

        assert_eq!(single.resolve(), ResolvedAsset::Url("https://cdn/a.png".into()));
        assert_eq!(list.resolve(), ResolvedAsset::Url("https://cdn/b.png".into()));
    }

    #[test]
    fn uid_without_url_builds_cdn_download_link() {
        let asset = parse(json!({"uid": "bltabc"}));
        assert_eq!(
            asset.display_url(Some("stack")),
            Some("https://images.contentstack.io/v3/assets/stack/bltabc/download".to_string())
        );
        assert_eq!(asset.display_url(None), None);
    }

    #[test]
    fn empty_list_is_missing() {
        assert_eq!(parse(json!([])).resolve(), ResolvedAsset::Missing);
    }
}
