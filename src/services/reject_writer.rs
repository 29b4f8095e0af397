//! 拒绝记录写入服务 - 业务能力层
//!
//! 只负责"写拒绝日志"能力，不关心流程

use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::Rejection;

/// 拒绝记录写入服务
///
/// 职责：
/// - 把解析失败的题目追加写入拒绝日志
/// - 每行一条：题号、原因、题干预览
pub struct RejectWriter {
    path: PathBuf,
}

impl RejectWriter {
    pub fn new() -> Self {
        Self::with_path("rejects.txt")
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加写入一批拒绝记录
    pub async fn write_all(&self, rejections: &[Rejection]) -> AppResult<()> {
        if rejections.is_empty() {
            return Ok(());
        }
        debug!("写入 {} 条拒绝记录: {}", rejections.len(), self.path.display());

        let mut content = String::new();
        for rejection in rejections {
            content.push_str(&format!(
                "[{}] 题目 {} | {} | 题干: {}\n",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                rejection.ordinal,
                rejection.reason,
                rejection.preview
            ));
        }

        let write_failed =
            |e: std::io::Error| AppError::file_write_failed(self.path.display().to_string(), e);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(write_failed)?;
        file.write_all(content.as_bytes()).await.map_err(write_failed)?;
        file.flush().await.map_err(write_failed)?;

        Ok(())
    }
}

impl Default for RejectWriter {
    fn default() -> Self {
        Self::new()
    }
}
