//! Defines the data structures for the Are.na wire format and the
//! client-local selection payloads.
//!
//! Upstream objects carry far more fields than we need; the structs here keep
//! only what the UI consumes and use `#[serde(default)]` liberally so a
//! missing or unknown upstream field never fails a whole page.

use serde::{Deserialize, Serialize};

/// A single image rendition URL inside an [`ImageAssets`] set.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ImageUrl {
    #[serde(default)]
    pub url: String,
}

/// The set of renditions Are.na generates for an image block.
///
/// Every rendition is optional; pick one via [`ImageAssets::grid_url`] or
/// [`ImageAssets::slide_url`] depending on the display context.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ImageAssets {
    #[serde(default)]
    pub thumb: Option<ImageUrl>,
    #[serde(default)]
    pub square: Option<ImageUrl>,
    #[serde(default)]
    pub display: Option<ImageUrl>,
    #[serde(default)]
    pub large: Option<ImageUrl>,
    #[serde(default)]
    pub original: Option<ImageUrl>,
}

impl ImageAssets {
    fn pick<'a>(candidates: [&'a Option<ImageUrl>; 3]) -> Option<&'a str> {
        candidates
            .into_iter()
            .flatten()
            .map(|u| u.url.as_str())
            .find(|url| !url.is_empty())
    }

    /// Preferred rendition for grid thumbnails: display, square, then thumb.
    pub fn grid_url(&self) -> Option<&str> {
        Self::pick([&self.display, &self.square, &self.thumb])
    }

    /// Preferred rendition for fullscreen playback: large, display, then original.
    pub fn slide_url(&self) -> Option<&str> {
        Self::pick([&self.large, &self.display, &self.original])
    }
}

/// A single content block within a channel. Identity is `id`; a block may or
/// may not carry an image.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Block {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub generated_title: Option<String>,
    #[serde(default)]
    pub image: Option<ImageAssets>,
}

impl Block {
    /// Human-readable caption: the block title, falling back to the
    /// generated title.
    pub fn caption(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .or(self.generated_title.as_deref())
            .unwrap_or("")
    }
}

/// An Are.na user as returned by the user search endpoint.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ArenaUser {
    pub id: u64,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub channel_count: u64,
}

impl ArenaUser {
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.username
        } else {
            &self.full_name
        }
    }
}

/// An Are.na channel: a named, ordered collection of blocks.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ArenaChannel {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub follower_count: Option<u64>,
}

// --- Response envelopes ---

#[derive(Deserialize, Debug)]
pub struct UserSearchResponse {
    #[serde(default)]
    pub users: Vec<ArenaUser>,
}

#[derive(Deserialize, Debug)]
pub struct ChannelListResponse {
    #[serde(default)]
    pub channels: Vec<ArenaChannel>,
}

#[derive(Deserialize, Debug)]
pub struct ChannelContentsResponse {
    #[serde(default)]
    pub contents: Vec<Block>,
}

/// Result of the OAuth2 authorization-code exchange.
#[derive(Deserialize, Clone, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

// --- Persisted selection payloads ---

/// The persisted slice of a selected user.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SelectedUser {
    pub id: u64,
    pub full_name: String,
}

/// The persisted slice of a selected channel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct SelectedChannel {
    pub id: u64,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub follower_count: Option<u64>,
}

impl From<&ArenaUser> for SelectedUser {
    fn from(user: &ArenaUser) -> Self {
        Self {
            id: user.id,
            full_name: user.display_name().to_string(),
        }
    }
}

impl From<&ArenaChannel> for SelectedChannel {
    fn from(channel: &ArenaChannel) -> Self {
        Self {
            id: channel.id,
            title: channel.title.clone(),
            slug: channel.slug.clone(),
            follower_count: channel.follower_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Option<ImageUrl> {
        Some(ImageUrl { url: s.to_string() })
    }

    #[test]
    fn test_grid_url_preference_order() {
        let assets = ImageAssets {
            thumb: url("t"),
            square: url("s"),
            display: url("d"),
            large: url("l"),
            original: url("o"),
        };
        assert_eq!(assets.grid_url(), Some("d"));

        let assets = ImageAssets {
            thumb: url("t"),
            square: url("s"),
            ..Default::default()
        };
        assert_eq!(assets.grid_url(), Some("s"));

        let assets = ImageAssets {
            thumb: url("t"),
            ..Default::default()
        };
        assert_eq!(assets.grid_url(), Some("t"));
    }

    #[test]
    fn test_slide_url_preference_order() {
        let assets = ImageAssets {
            large: url("l"),
            display: url("d"),
            original: url("o"),
            ..Default::default()
        };
        assert_eq!(assets.slide_url(), Some("l"));

        let assets = ImageAssets {
            display: url("d"),
            original: url("o"),
            ..Default::default()
        };
        assert_eq!(assets.slide_url(), Some("d"));

        let assets = ImageAssets {
            original: url("o"),
            ..Default::default()
        };
        assert_eq!(assets.slide_url(), Some("o"));
        assert_eq!(ImageAssets::default().slide_url(), None);
    }

    #[test]
    fn test_empty_rendition_urls_are_skipped() {
        let assets = ImageAssets {
            display: url(""),
            thumb: url("t"),
            ..Default::default()
        };
        assert_eq!(assets.grid_url(), Some("t"));
    }

    #[test]
    fn test_block_deserializes_with_sparse_fields() {
        let block: Block = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(block.id, 7);
        assert!(block.image.is_none());
        assert_eq!(block.caption(), "");

        let block: Block = serde_json::from_str(
            r#"{"id": 8, "generated_title": "Gen", "image": {"thumb": {"url": "http://x/t.jpg"}}}"#,
        )
        .unwrap();
        assert_eq!(block.caption(), "Gen");
        assert_eq!(block.image.unwrap().grid_url(), Some("http://x/t.jpg"));
    }

    #[test]
    fn test_user_display_name_falls_back_to_username() {
        let user: ArenaUser =
            serde_json::from_str(r#"{"id": 1, "username": "maria"}"#).unwrap();
        assert_eq!(user.display_name(), "maria");
    }

    #[test]
    fn test_contents_envelope_tolerates_missing_list() {
        let response: ChannelContentsResponse = serde_json::from_str("{}").unwrap();
        assert!(response.contents.is_empty());
    }
}
