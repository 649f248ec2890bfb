use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A registry entry as reported by the image listing endpoint
///
/// `pushed_at` is already normalized to a single instant type; the
/// registry client is responsible for converting whatever encoding the
/// API returned before an `Image` is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    /// Full tag reference, e.g. "registry.depot.dev/abc123:v1.2.0"
    pub tag: Option<String>,
    /// Content digest, e.g. "sha256:9f86d0..."
    pub digest: Option<String>,
    /// When the tag was pushed
    pub pushed_at: Option<DateTime<Utc>>,
    /// Size of the image in bytes, when reported
    pub size_bytes: Option<u64>,
}

impl Image {
    /// Create an image with the given tag reference and no other metadata
    pub fn tagged(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            digest: None,
            pushed_at: None,
            size_bytes: None,
        }
    }

    /// Set the content digest
    pub fn with_digest(mut self, digest: impl Into<String>) -> Self {
        self.digest = Some(digest.into());
        self
    }

    /// Set the push time
    pub fn with_pushed_at(mut self, pushed_at: DateTime<Utc>) -> Self {
        self.pushed_at = Some(pushed_at);
        self
    }

    /// The trailing tag name, without the registry path
    ///
    /// "registry.depot.dev/abc123:v1" yields "v1". A reference without a
    /// colon is returned unchanged.
    pub fn tag_name(&self) -> Option<&str> {
        self.tag.as_deref().map(tag_name_of)
    }
}

/// Extract the segment after the last ':' of a tag reference
pub fn tag_name_of(reference: &str) -> &str {
    match reference.rsplit_once(':') {
        Some((_, name)) => name,
        None => reference,
    }
}

/// A project in the registry's project directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
    pub name: Option<String>,
}

impl Project {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name used in logs and reports, falling back to the id
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.project_id,
        }
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.display_name() == self.project_id {
            write!(f, "{}", self.project_id)
        } else {
            write!(f, "{} ({})", self.display_name(), self.project_id)
        }
    }
}

/// Parameters for one call to a cursor-paginated listing endpoint
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageRequest {
    pub page_size: u32,
    pub page_token: Option<String>,
}

/// One page returned by a cursor-paginated listing endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Continuation token; `None` means this was the last page
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }
}
