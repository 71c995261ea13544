//! Display records produced by the map pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::element::ElementKind;

/// Three-level ordering key: coarse type priority, container group, title.
///
/// Derived `Ord` compares the fields in declaration order, which is the
/// display order. The key depends only on the kind's priority, the group
/// and the title, never on the order rows came back from storage.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub priority: String,
    pub group: String,
    pub title: String,
}

impl SortKey {
    pub fn new(
        priority: impl Into<String>,
        group: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            priority: priority.into(),
            group: group.into(),
            title: title.into(),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.priority, self.group, self.title)
    }
}

/// One node of a computed reference map, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: i64,
    pub kind: ElementKind,
    pub icon: String,
    pub color: Option<String>,
    pub title: String,
    pub url: String,
    pub sort_key: SortKey,
    /// Result of the authorization check; unviewable entries stay in the
    /// list and presentation decides how to show them.
    pub can_view: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
}

impl MapEntry {
    /// Entry titled `title` whose sort key uses the same title.
    pub fn new(
        kind: ElementKind,
        id: i64,
        title: impl Into<String>,
        url: impl Into<String>,
        priority: &str,
        group: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id,
            icon: default_icon(&kind).to_string(),
            kind,
            color: None,
            sort_key: SortKey::new(priority, group, title.clone()),
            title,
            url: url.into(),
            can_view: false,
            image_url: None,
            file_url: None,
        }
    }

    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    #[must_use]
    pub fn with_color(mut self, color: Option<String>) -> Self {
        self.color = color;
        self
    }

    #[must_use]
    pub fn with_can_view(mut self, can_view: bool) -> Self {
        self.can_view = can_view;
        self
    }

    #[must_use]
    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }

    #[must_use]
    pub fn with_file_url(mut self, file_url: Option<String>) -> Self {
        self.file_url = file_url;
        self
    }
}

fn default_icon(kind: &ElementKind) -> &'static str {
    match kind {
        ElementKind::Entry | ElementKind::ContentBlock => "newspaper",
        ElementKind::Address => "gear",
        ElementKind::Asset => "photo",
        ElementKind::Category => "folder-open",
        ElementKind::Tag => "tags",
        ElementKind::GlobalSet => "globe",
        ElementKind::User => "user",
        ElementKind::Product | ElementKind::Variant => "commerce",
        ElementKind::Campaign => "envelope",
        ElementKind::Other(_) => "question",
    }
}

/// Both directions of a reference map.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MapResult {
    pub incoming: Vec<MapEntry>,
    pub outgoing: Vec<MapEntry>,
}

impl MapResult {
    pub fn counts(&self) -> ReferenceCounts {
        ReferenceCounts {
            incoming: self.incoming.len(),
            outgoing: self.outgoing.len(),
        }
    }

    /// Serialize for presentation layers that consume JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// List lengths only, as shown by index columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReferenceCounts {
    pub incoming: usize,
    pub outgoing: usize,
}
