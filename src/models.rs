//! Data models for the live TV directory

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Label used when a channel has no country or category
pub const GENERIC_LABEL: &str = "General";

/// Channel record from the upstream channel directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub subdivision: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub languages: Vec<String>,
    #[serde(default)]
    pub broadcast_area: Option<Vec<String>>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(rename = "is_nsfw", default, deserialize_with = "null_as_default")]
    pub is_adult_content: bool,
}

impl Channel {
    /// First category with `-` and `_` shown as spaces
    pub fn primary_category(&self) -> Option<String> {
        self.categories
            .first()
            .filter(|c| !c.is_empty())
            .map(|c| c.replace(&['-', '_'][..], " "))
    }

    pub fn country_label(&self) -> &str {
        self.country.as_deref().unwrap_or(GENERIC_LABEL)
    }

    pub fn category_label(&self) -> String {
        self.primary_category().unwrap_or_else(|| GENERIC_LABEL.to_string())
    }

    /// Secondary line for a channel card: languages, else website
    pub fn subtitle(&self) -> String {
        if !self.languages.is_empty() {
            return self.languages.join(", ");
        }
        self.website.clone().unwrap_or_default()
    }
}

/// Playable endpoint candidate; `channel` refers to `Channel::id`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Stream {
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub http_referrer: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    #[serde(default)]
    pub bitrate: Option<u64>,
    #[serde(default)]
    pub codec: Option<String>,
}

impl Stream {
    pub fn new(channel: &str, url: &str) -> Self {
        Self {
            channel: channel.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }
}

/// A resolved (channel, stream) pair ready to be shown and played
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEntry {
    pub channel: Channel,
    pub stream: Stream,
}

impl ChannelEntry {
    /// Build the handoff for the player surface.
    ///
    /// `override_url` replaces the stream URL when set. Returns `None` for an
    /// entry without a URL.
    pub fn playback_request(&self, override_url: Option<&str>) -> Option<PlaybackRequest> {
        if self.stream.url.trim().is_empty() {
            return None;
        }
        let video_uri = override_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(&self.stream.url)
            .trim()
            .to_string();

        Some(PlaybackRequest {
            video_uri,
            title: self.channel.name.clone(),
            thumbnail_uri: self.channel.logo.clone(),
        })
    }
}

/// What the external video surface receives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackRequest {
    pub video_uri: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_uri: Option<String>,
}

// The directory occasionally ships explicit nulls for list and flag fields
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
