// Operator-authored content surfaced with the first greeting of the day:
// message-of-the-day entries and date-keyed "on this day" documents. The
// core only defines the port; the filesystem implementation lives in infra.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed content in {name}: {message}")]
    Malformed { name: String, message: String },
}

/// One message-of-the-day entry waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotdEntry {
    /// Provider-specific handle for the entry (a file name, for the
    /// filesystem archive).
    pub name: String,
    pub body: String,
}

/// Date-keyed supplemental content. Operators drop either a plain text file
/// or a JSON document describing an embed, so the two shapes are kept as an
/// explicit variant instead of sniffing at render time.
#[derive(Debug, Clone, PartialEq)]
pub enum OnThisDayContent {
    Plain(String),
    Structured(OnThisDayDoc),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OnThisDayDoc {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<OnThisDayField>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OnThisDayField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

#[async_trait]
pub trait MessageArchive: Send + Sync {
    /// All pending message-of-the-day entries, in delivery order.
    async fn list_pending(&self) -> Result<Vec<MotdEntry>, ArchiveError>;

    /// Move a consumed entry out of the pending set.
    async fn archive(&self, entry: &MotdEntry) -> Result<(), ArchiveError>;

    /// Content for the given date, trying the exact year first and falling
    /// back to a year-agnostic month-day key. Missing content is `None`,
    /// not an error.
    async fn on_this_day(&self, date: NaiveDate)
        -> Result<Option<OnThisDayContent>, ArchiveError>;
}
