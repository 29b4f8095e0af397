use crate::error::{AppError, AppResult, FileError};
use crate::models::persisted::PersistedQuestion;
use std::path::Path;
use tokio::fs;
use tracing::info;

async fn read_file(path: &Path) -> AppResult<String> {
    fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::from(FileError::NotFound {
                path: path.display().to_string(),
            })
        } else {
            AppError::file_read_failed(path.display().to_string(), e)
        }
    })
}

async fn write_file(path: &Path, content: &str) -> AppResult<()> {
    fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))
}

/// 读取题目 JSON 文件
pub async fn load_questions(json_file_path: &Path) -> AppResult<Vec<PersistedQuestion>> {
    let content = read_file(json_file_path).await?;

    let questions: Vec<PersistedQuestion> = serde_json::from_str(&content)
        .map_err(|e| AppError::file_read_failed(json_file_path.display().to_string(), e))?;

    info!(
        "成功加载 {} 道题目: {}",
        questions.len(),
        json_file_path.display()
    );

    Ok(questions)
}

/// 将题目写入 JSON 文件（带缩进，保留非 ASCII 字符）
pub async fn save_questions(json_file_path: &Path, questions: &[PersistedQuestion]) -> AppResult<()> {
    let content = serde_json::to_string_pretty(questions)?;
    write_file(json_file_path, &content).await?;

    info!(
        "已保存 {} 道题目到 {}",
        questions.len(),
        json_file_path.display()
    );

    Ok(())
}

/// 读取原始文本文件
pub async fn load_text(path: &Path) -> AppResult<String> {
    read_file(path).await
}

/// 保存原始文本文件
pub async fn save_text(path: &Path, text: &str) -> AppResult<()> {
    write_file(path, text).await?;
    info!("文件已保存: {}", path.display());
    Ok(())
}
