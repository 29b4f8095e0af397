use anyhow::Result;
/// 日志工具模块
///
/// 提供运行日志文件和统计横幅的辅助函数
use std::fs;
use tracing::info;

/// 初始化运行日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `title`: 本次运行的标题
pub fn init_log_file(log_file_path: &str, title: &str) -> Result<()> {
    let log_header = format!(
        "{}\n{} - {}\n{}\n\n",
        "=".repeat(60),
        title,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(command: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - {}", command);
    info!("{}", "=".repeat(60));
}

/// 记录阶段开始
///
/// # 参数
/// - `step`: 当前阶段序号
/// - `total`: 阶段总数
/// - `name`: 阶段名称
pub fn log_stage(step: usize, total: usize, name: &str) {
    info!("\n{}", "─".repeat(60));
    info!("📦 阶段 {}/{}: {}", step, total, name);
    info!("{}", "─".repeat(60));
}

/// 打印一组统计数字
///
/// # 参数
/// - `title`: 横幅标题
/// - `rows`: (名称, 数值) 列表
pub fn print_stats_banner(title: &str, rows: &[(&str, usize)]) {
    info!("\n{}", "=".repeat(60));
    info!("📊 {}", title);
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    for (label, value) in rows {
        info!("{}: {}", label, value);
    }
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text_counts_chars() {
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("指针是什么", 2), "指针...");
        assert_eq!(truncate_text("short", 10), "short");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.txt");
        init_log_file(path.to_str().unwrap(), "MCQ 生成日志").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&"=".repeat(60)));
        assert!(content.contains("MCQ 生成日志"));
    }
}
