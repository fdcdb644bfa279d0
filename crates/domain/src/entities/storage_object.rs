//! 存储对象元数据实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 对象存储中一次变更涉及的对象元数据
///
/// 对象路径即对象身份，约定为 `images/<messageId>/<fileName>`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageObjectMeta {
    /// 所在桶
    pub bucket: String,
    /// 对象完整路径
    pub name: String,
    /// 创建时间
    pub time_created: DateTime<Utc>,
    /// 最后更新时间
    pub updated: DateTime<Utc>,
    /// 对象当前是否存在
    pub exists: bool,
}

impl StorageObjectMeta {
    /// 判断对象是否为首次创建
    ///
    /// 创建时间与更新时间一致说明对象从未被覆盖写入，
    /// 这是避免重复处理同一对象的唯一依据。
    pub fn is_newly_created(&self) -> bool {
        self.exists && self.time_created == self.updated
    }

    /// 对象路径的最后一段（文件名）
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or("")
    }

    /// 对象路径的第二段，即所属消息的数据库键
    pub fn message_id(&self) -> Option<&str> {
        let mut parts = self.name.split('/');
        parts.next()?;
        match parts.next() {
            Some(id) if !id.is_empty() => Some(id),
            _ => None,
        }
    }

    /// `gs://<bucket>/<name>` 形式的完整URI
    pub fn gs_uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }
}
