use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::fs;

use crate::core::archive::{
    ArchiveError, MessageArchive, MotdEntry, OnThisDayContent, OnThisDayDoc,
};

const MOTD_PREFIX: &str = "motd";
const MOTD_SUFFIX: &str = ".txt";
const ON_THIS_DAY_DIR: &str = "on-this-day";

/// Filesystem-backed archive. Pending messages of the day are `motd*.txt`
/// files in the data directory; consuming one renames it with a timestamp
/// suffix so the pattern no longer matches it. The rename doubles as the
/// acknowledgment, which keeps the whole thing inspectable with `ls`.
pub struct FileArchive {
    dir: PathBuf,
}

impl FileArchive {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn is_pending_name(name: &str) -> bool {
        name.starts_with(MOTD_PREFIX) && name.ends_with(MOTD_SUFFIX)
    }

    async fn read_on_this_day_file(
        &self,
        name: &str,
    ) -> Result<Option<OnThisDayContent>, ArchiveError> {
        let path = self.dir.join(ON_THIS_DAY_DIR).join(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).await?;
        if name.ends_with(".json") {
            let doc: OnThisDayDoc =
                serde_json::from_str(&text).map_err(|e| ArchiveError::Malformed {
                    name: name.to_string(),
                    message: e.to_string(),
                })?;
            Ok(Some(OnThisDayContent::Structured(doc)))
        } else {
            Ok(Some(OnThisDayContent::Plain(text.trim().to_string())))
        }
    }
}

#[async_trait]
impl MessageArchive for FileArchive {
    async fn list_pending(&self) -> Result<Vec<MotdEntry>, ArchiveError> {
        let mut entries = Vec::new();
        let mut dir = match fs::read_dir(&self.dir).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
            Err(err) => return Err(err.into()),
        };

        while let Some(item) = dir.next_entry().await? {
            let name = item.file_name().to_string_lossy().into_owned();
            if !Self::is_pending_name(&name) {
                continue;
            }
            let body = fs::read_to_string(item.path()).await?;
            entries.push(MotdEntry { name, body });
        }

        // Directory order is arbitrary; deliver in name order so operators
        // can number their files.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn archive(&self, entry: &MotdEntry) -> Result<(), ArchiveError> {
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");
        let from = self.dir.join(&entry.name);
        let to = self.dir.join(format!("{}.{}", entry.name, stamp));
        fs::rename(&from, &to).await?;
        Ok(())
    }

    async fn on_this_day(
        &self,
        date: NaiveDate,
    ) -> Result<Option<OnThisDayContent>, ArchiveError> {
        let keys = [
            date.format("%Y-%m-%d").to_string(),
            date.format("%m-%d").to_string(),
        ];
        for key in keys {
            for extension in ["json", "txt"] {
                if let Some(content) = self
                    .read_on_this_day_file(&format!("{key}.{extension}"))
                    .await?
                {
                    return Ok(Some(content));
                }
            }
        }
        Ok(None)
    }
}
