//! Favorite tracks
//!
//! Titles are the identity of a track across the catalog, so favorites are keyed
//! by title. Kept in memory for the lifetime of the session.

use serde::{Deserialize, Serialize};
use tralala_core::Track;

/// Insertion-ordered set of favorite titles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorites {
    titles: Vec<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a title; adding it again keeps its original position
    pub fn add(&mut self, title: impl Into<String>) {
        let title = title.into();
        if !self.contains(&title) {
            self.titles.push(title);
        }
    }

    pub fn remove(&mut self, title: &str) {
        self.titles.retain(|t| t != title);
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.iter().any(|t| t == title)
    }

    /// Flip membership, returning whether the title is now a favorite
    pub fn toggle(&mut self, title: &str) -> bool {
        if self.contains(title) {
            self.remove(title);
            false
        } else {
            self.add(title);
            true
        }
    }

    pub fn is_favorite_track(&self, track: &Track) -> bool {
        self.contains(&track.title)
    }

    /// Titles in the order they were added
    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }
}
