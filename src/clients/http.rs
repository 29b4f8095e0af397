use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 构建带连接 / 读取超时的 HTTP 客户端
pub fn build_http_client(config: &Config) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.http_connect_timeout_secs))
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| AppError::api_request_failed("http-client", e))
}

/// 索引 / 向量服务发送阶段的 reqwest 错误转换
///
/// 连接失败和超时视为服务不可达，题库请求不走这里
pub(crate) fn send_error(endpoint: &str, err: reqwest::Error) -> AppError {
    if err.is_connect() || err.is_timeout() {
        AppError::Index(crate::error::IndexError::Unreachable {
            url: endpoint.to_string(),
        })
    } else {
        AppError::api_request_failed(endpoint, err)
    }
}

/// 读取响应体，非 2xx 状态转为错误
pub(crate) async fn read_body(endpoint: &str, response: reqwest::Response) -> AppResult<String> {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(AppError::api_bad_response(endpoint, status.as_u16(), body));
    }
    Ok(body)
}
