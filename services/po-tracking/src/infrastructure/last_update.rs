//! 新状态表最后更新时间的文件存储
//!
//! 文件内容为 `{"lastUpdated": "<ISO-8601>"}`，启动时读取。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::domain::repositories::LastUpdateRepository;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LastUpdateFile {
    #[serde(rename = "lastUpdated")]
    last_updated: Option<String>,
}

pub struct FileLastUpdateRepository {
    path: PathBuf,
    current: RwLock<Option<String>>,
}

impl FileLastUpdateRepository {
    /// 读取文件；文件不存在或内容无效时从空值开始
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_file(&path).await;
        if let Some(ts) = &current {
            info!(path = %path.display(), last_updated = %ts, "Last update timestamp loaded");
        }

        Self {
            path,
            current: RwLock::new(current),
        }
    }

    async fn persist(&self, timestamp: &str) -> std::io::Result<()> {
        let body = LastUpdateFile {
            last_updated: Some(timestamp.to_string()),
        };
        let json = serde_json::to_vec_pretty(&body)?;
        tokio::fs::write(&self.path, json).await
    }
}

async fn read_file(path: &Path) -> Option<String> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read last update file");
            return None;
        }
    };

    match serde_json::from_slice::<LastUpdateFile>(&bytes) {
        Ok(file) => file.last_updated,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Invalid last update file");
            None
        }
    }
}

#[async_trait]
impl LastUpdateRepository for FileLastUpdateRepository {
    async fn get(&self) -> Option<String> {
        self.current.read().await.clone()
    }

    async fn set(&self, timestamp: String) {
        if let Err(e) = self.persist(&timestamp).await {
            warn!(path = %self.path.display(), error = %e, "Failed to persist last update timestamp");
        }
        *self.current.write().await = Some(timestamp);
    }
}
