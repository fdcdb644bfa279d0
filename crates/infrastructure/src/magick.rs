//! ImageMagick 图像变换适配器
//!
//! 调用外部 `convert` 命令就地模糊图像，命令路径可配置。

use std::path::Path;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use application::errors::TransformError;
use application::transformer::ImageTransformer;

/// 基于 ImageMagick 的模糊变换器
pub struct ImageMagickTransformer {
    command: String,
}

impl ImageMagickTransformer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for ImageMagickTransformer {
    fn default() -> Self {
        Self::new("convert")
    }
}

#[async_trait]
impl ImageTransformer for ImageMagickTransformer {
    async fn obscure(&self, path: &Path) -> Result<(), TransformError> {
        let output = Command::new(&self.command)
            .arg(path)
            .args(["-channel", "RGBA", "-blur", "0x24"])
            .arg(path)
            .output()
            .await
            .map_err(|err| TransformError::Process {
                message: format!("无法执行 {}: {}", self.command, err),
            })?;

        if !output.status.success() {
            return Err(TransformError::Process {
                message: format!(
                    "{} 退出状态 {}: {}",
                    self.command,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        debug!(path = %path.display(), "图像已由 ImageMagick 模糊处理");
        Ok(())
    }
}
