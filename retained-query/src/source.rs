use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::Result;
use crate::{Payload, TopicName};

/// Supplies every currently retained message, used to seed the index at startup.
#[async_trait]
pub trait RetainedSource: Sync + Send {
    async fn retaineds(&self) -> Result<Vec<(TopicName, Payload)>>;
}

#[async_trait]
impl RetainedSource for Vec<(TopicName, Payload)> {
    #[inline]
    async fn retaineds(&self) -> Result<Vec<(TopicName, Payload)>> {
        Ok(self.clone())
    }
}

/// JSON file holding an array of `{"topic": ..., "payload": ...}` objects.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

#[derive(Deserialize)]
struct SnapshotEntry {
    topic: TopicName,
    payload: String,
}

impl SnapshotFile {
    #[inline]
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }
}

#[async_trait]
impl RetainedSource for SnapshotFile {
    async fn retaineds(&self) -> Result<Vec<(TopicName, Payload)>> {
        let data = tokio::fs::read(&self.path).await?;
        let entries: Vec<SnapshotEntry> = serde_json::from_slice(&data)?;
        log::debug!("{:?} snapshot entries: {}", self.path, entries.len());
        Ok(entries.into_iter().map(|e| (e.topic, Payload::from(e.payload))).collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Error;

    fn temp_file(name: &str, content: &[u8]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("retained-query-{}-{}.json", name, std::process::id()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn vec_source() {
        let src = vec![(TopicName::from("a/b"), Payload::from_static(b"1"))];
        assert_eq!(src.retaineds().await.unwrap(), src);
    }

    #[tokio::test]
    async fn snapshot_file() {
        let body = json!([{"topic": "a/b", "payload": "1"}, {"topic": "c", "payload": ""}]);
        let path = temp_file("ok", body.to_string().as_bytes());
        let retaineds = SnapshotFile::new(&path).retaineds().await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            retaineds,
            vec![(TopicName::from("a/b"), Payload::from_static(b"1")), (TopicName::from("c"), Payload::new())]
        );
    }

    #[tokio::test]
    async fn snapshot_file_errors() {
        let missing = SnapshotFile::new(std::env::temp_dir().join("retained-query-does-not-exist.json"));
        assert!(matches!(missing.retaineds().await, Err(Error::Io(_))));

        let path = temp_file("bad", b"{\"topic\": 1}");
        let res = SnapshotFile::new(&path).retaineds().await;
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(res, Err(Error::Json(_))));
    }
}
