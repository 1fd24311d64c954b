use serde::{Deserialize, Serialize};

/// Placeholder image used when a record has no photo
pub const PLACEHOLDER_PHOTO_URL: &str = "/assets/pet-placeholder.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: i64,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub url: String,
}

/// URL of `photo`, or the placeholder when there is none.
pub fn photo_url(photo: Option<&Photo>) -> &str {
    photo
        .map(|p| p.url.as_str())
        .filter(|url| !url.is_empty())
        .unwrap_or(PLACEHOLDER_PHOTO_URL)
}
