//! JSON shapes exchanged with the Depot API
//!
//! This is the only place that knows how the API encodes push times.
//! Everything past `WireImage::into_image` sees `Option<DateTime<Utc>>`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regprune_core::types::{Image, Page, Project};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListProjectsRequest<'a> {
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListImagesRequest<'a> {
    pub project_id: &'a str,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteImageRequest<'a> {
    pub project_id: &'a str,
    pub image_tags: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListProjectsResponse {
    #[serde(default)]
    pub projects: Vec<WireProject>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListProjectsResponse {
    pub fn into_page(self) -> Page<Project> {
        Page::new(
            self.projects.into_iter().map(WireProject::into_project).collect(),
            non_empty(self.next_page_token),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireProject {
    pub project_id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl WireProject {
    fn into_project(self) -> Project {
        Project {
            project_id: self.project_id,
            name: non_empty(self.name),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListImagesResponse {
    #[serde(default)]
    pub images: Vec<WireImage>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl ListImagesResponse {
    pub fn into_page(self) -> Page<Image> {
        Page::new(
            self.images.into_iter().map(WireImage::into_image).collect(),
            non_empty(self.next_page_token),
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireImage {
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub digest: Option<String>,
    #[serde(default)]
    pub pushed_at: Option<PushedAt>,
    #[serde(default)]
    pub size_bytes: Option<Int64>,
}

impl WireImage {
    pub fn into_image(self) -> Image {
        let pushed_at = self.pushed_at.as_ref().and_then(|raw| {
            let instant = raw.to_instant();
            if instant.is_none() {
                warn!(
                    tag = self.tag.as_deref().unwrap_or("<untagged>"),
                    "Unrecognized pushedAt value {:?}, treating as missing", raw
                );
            }
            instant
        });

        Image {
            tag: non_empty(self.tag),
            digest: non_empty(self.digest),
            pushed_at,
            size_bytes: self
                .size_bytes
                .and_then(|s| s.value())
                .and_then(|v| u64::try_from(v).ok()),
        }
    }
}

/// A 64-bit integer that protobuf JSON may encode as a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Int64 {
    Number(i64),
    Text(String),
}

impl Int64 {
    pub fn value(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Every encoding of a push time the API has been seen to return
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PushedAt {
    /// Protobuf `Timestamp` object: `{"seconds": "1700000000", "nanos": 0}`
    Timestamp {
        seconds: Int64,
        #[serde(default)]
        nanos: Option<i64>,
    },
    /// Milliseconds since the Unix epoch
    EpochMillis(i64),
    /// RFC 3339 / ISO 8601 text: "2024-01-15T10:30:00Z"
    Text(String),
    /// Anything else; never deletable
    Unrecognized(serde_json::Value),
}

impl PushedAt {
    /// Normalize to a UTC instant
    ///
    /// Returns `None` for values that cannot be interpreted, including a
    /// zero protobuf timestamp (the protobuf default for "unset").
    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp { seconds, nanos } => {
                let secs = seconds.value()?;
                let nanos = nanos.unwrap_or(0);
                if secs == 0 && nanos == 0 {
                    return None;
                }
                let nanos = u32::try_from(nanos).ok()?;
                Utc.timestamp_opt(secs, nanos).single()
            }
            Self::EpochMillis(ms) => Utc.timestamp_millis_opt(*ms).single(),
            Self::Text(text) => parse_timestamp_text(text),
            Self::Unrecognized(_) => None,
        }
    }
}

fn parse_timestamp_text(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    None
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
