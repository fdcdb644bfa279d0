//! 审核用本地临时文件管理

use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use tracing::warn;

/// 审核期间的本地临时文件
///
/// 文件名由对象全路径的哈希与原文件名拼成：同一对象重试时落在
/// 同一路径，不同对象之间不会冲突，扩展名保持不变。
/// 守卫释放时尽力删除文件。
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// 为一个存储对象分配临时文件路径
    pub fn for_object(scratch_dir: &Path, object_path: &str, file_name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        object_path.hash(&mut hasher);
        let path = scratch_dir.join(format!("{:016x}-{}", hasher.finish(), file_name));
        Self { path }
    }

    /// 临时文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %err, "临时文件清理失败");
            }
        }
    }
}
