//! Google Cloud Storage JSON API 适配器
//!
//! 下载走 `alt=media`，上传走 `uploadType=media` 并覆盖同名对象。

use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use application::errors::StorageError;
use application::object_store::ObjectStore;

/// 对象存储适配器
pub struct GcsObjectStore {
    client: Client,
    endpoint: String,
}

impl GcsObjectStore {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn download_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.endpoint,
            bucket,
            encode_object_path(path)
        )
    }

    fn upload_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.endpoint,
            bucket,
            encode_object_path(path)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn download(&self, bucket: &str, path: &str, dest: &Path) -> Result<(), StorageError> {
        let url = self.download_url(bucket, path);
        let response =
            self.client
                .get(&url)
                .send()
                .await
                .map_err(|err| StorageError::Download {
                    message: err.to_string(),
                })?;

        if !response.status().is_success() {
            return Err(StorageError::Download {
                message: format!("对象下载返回状态 {}", response.status()),
            });
        }

        let bytes = response.bytes().await.map_err(|err| StorageError::Download {
            message: err.to_string(),
        })?;

        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|err| StorageError::Download {
                message: format!("本地写入失败: {}", err),
            })?;

        debug!(bucket, object = path, dest = %dest.display(), size = bytes.len(), "对象已下载到本地");
        Ok(())
    }

    async fn upload(&self, bucket: &str, src: &Path, path: &str) -> Result<(), StorageError> {
        let bytes = tokio::fs::read(src).await.map_err(|err| StorageError::Upload {
            message: format!("本地读取失败: {}", err),
        })?;

        let url = self.upload_url(bucket, path);
        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|err| StorageError::Upload {
                message: err.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StorageError::Upload {
                message: format!("对象上传返回状态 {}", response.status()),
            });
        }

        debug!(bucket, object = path, src = %src.display(), "本地文件已上传覆盖原对象");
        Ok(())
    }
}

/// 对对象路径做百分号编码
///
/// JSON API 要求对象名整体作为一个 URL 段，路径里的 `/` 也要编码。
fn encode_object_path(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    encoded
}
