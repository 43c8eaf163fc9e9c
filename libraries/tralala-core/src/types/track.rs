/// Track and catalog types
use serde::{Deserialize, Serialize};

/// Artwork reference for a track
///
/// Catalog items carry remote artwork URLs; bundled tracks (white noise, lullabies
/// shipped with the app) point at a local asset handle instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cover {
    /// Remote image URL
    Remote(String),
    /// Host-side asset handle
    Asset(u32),
}

impl Default for Cover {
    fn default() -> Self {
        Self::Remote(String::new())
    }
}

/// A track as the UI sees it
///
/// Titles are unique within one playlist instance. A track without an audio URL is a
/// display-only placeholder and is never handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// Display title
    pub title: String,

    /// Artwork
    pub cover: Cover,

    /// Streaming URL (optional)
    pub audio_url: Option<String>,
}

impl Track {
    /// Create a playable track
    pub fn new(title: impl Into<String>, audio_url: impl Into<String>, cover: Cover) -> Self {
        Self {
            title: title.into(),
            cover,
            audio_url: Some(audio_url.into()),
        }
    }

    /// Create a display-only track without audio
    pub fn placeholder(title: impl Into<String>, cover: Cover) -> Self {
        Self {
            title: title.into(),
            cover,
            audio_url: None,
        }
    }

    /// The audio URL if it is present and non-blank
    #[must_use]
    pub fn playable_url(&self) -> Option<&str> {
        self.audio_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
    }

    /// Whether this track can be sent to the engine
    #[must_use]
    pub fn is_playable(&self) -> bool {
        self.playable_url().is_some()
    }
}

/// A `{title, url}` entry supplied by the content catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Display title
    pub title: String,

    /// Media URL, may be empty for items that are not yet published
    pub url: String,

    /// Per-item artwork; falls back to the shared cover of the list
    #[serde(default)]
    pub cover: Option<Cover>,
}

impl CatalogItem {
    /// Create a catalog item that uses the shared list cover
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            cover: None,
        }
    }

    /// Set a per-item cover
    #[must_use]
    pub fn with_cover(mut self, cover: Cover) -> Self {
        self.cover = Some(cover);
        self
    }

    /// Whether the item has a usable URL
    #[must_use]
    pub fn is_playable(&self) -> bool {
        !self.url.trim().is_empty()
    }

    /// Convert into a track, using `shared_cover` when the item has none
    #[must_use]
    pub fn to_track(&self, shared_cover: Option<&Cover>) -> Track {
        let cover = self
            .cover
            .clone()
            .or_else(|| shared_cover.cloned())
            .unwrap_or_default();
        Track {
            title: self.title.clone(),
            cover,
            audio_url: Some(self.url.clone()).filter(|url| !url.trim().is_empty()),
        }
    }
}

impl From<&Track> for CatalogItem {
    fn from(track: &Track) -> Self {
        Self {
            title: track.title.clone(),
            url: track.audio_url.clone().unwrap_or_default(),
            cover: Some(track.cover.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_is_not_playable() {
        let track = Track::new("Twinkle", "   ", Cover::Asset(3));
        assert!(!track.is_playable());
        assert!(Track::placeholder("Soon", Cover::default()).playable_url().is_none());
        assert!(Track::new("Twinkle", "https://cdn/x.mp3", Cover::Asset(3)).is_playable());
    }

    #[test]
    fn catalog_item_falls_back_to_shared_cover() {
        let shared = Cover::Remote("https://cdn/album.png".to_string());
        let plain = CatalogItem::new("Rain", "https://cdn/rain.mp3");
        let own = CatalogItem::new("Wind", "https://cdn/wind.mp3").with_cover(Cover::Asset(9));

        assert_eq!(plain.to_track(Some(&shared)).cover, shared);
        assert_eq!(own.to_track(Some(&shared)).cover, Cover::Asset(9));
        assert_eq!(plain.to_track(None).cover, Cover::default());
    }

    #[test]
    fn empty_catalog_url_becomes_missing_audio() {
        let track = CatalogItem::new("Draft", "").to_track(None);
        assert_eq!(track.audio_url, None);
    }
}
