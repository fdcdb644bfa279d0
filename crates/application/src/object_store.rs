//! 对象存储能力接口

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StorageError;

/// 对象存储能力
///
/// 对象以 `(bucket, path)` 定位，上传到已存在的路径即覆盖原对象。
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// 下载对象到本地文件
    async fn download(&self, bucket: &str, path: &str, dest: &Path) -> Result<(), StorageError>;

    /// 上传本地文件到对象路径
    async fn upload(&self, bucket: &str, src: &Path, path: &str) -> Result<(), StorageError>;
}

/// 对象存储的共享引用
pub type ObjectStoreRef = Arc<dyn ObjectStore>;
