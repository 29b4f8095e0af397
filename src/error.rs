use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// API 调用错误
    #[error(transparent)]
    Api(#[from] ApiError),
    /// 文件操作错误
    #[error(transparent)]
    File(#[from] FileError),
    /// LLM 服务错误
    #[error(transparent)]
    Llm(#[from] LlmError),
    /// 索引 / 向量服务错误
    #[error(transparent)]
    Index(#[from] IndexError),
    /// 质检流程错误
    #[error(transparent)]
    Qc(#[from] QcError),
    /// 配置错误
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// API 调用错误
#[derive(Debug, Error)]
pub enum ApiError {
    /// 网络请求失败
    #[error("API请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: BoxedSource,
    },
    /// API 返回错误响应
    #[error("API返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// API 返回空结果
    #[error("API返回空结果: {endpoint}")]
    EmptyResponse { endpoint: String },
    /// JSON 解析失败
    #[error("JSON解析失败: {source}")]
    JsonParseFailed {
        #[source]
        source: BoxedSource,
    },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: BoxedSource,
    },
    /// 文件内容为空
    #[error("文件内容为空: {path}")]
    Empty { path: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: BoxedSource,
    },
    /// 调用超时
    #[error("LLM 调用超时 (模型: {model}, {seconds}秒)")]
    Timeout { model: String, seconds: u64 },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
    /// 生成参数不合法
    #[error("生成参数不合法: {0}")]
    InvalidRequest(String),
    /// 重试次数耗尽
    #[error("LLM 调用在 {attempts} 次尝试后仍然失败: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: String },
}

/// 索引 / 向量服务错误
#[derive(Debug, Error)]
pub enum IndexError {
    /// 无法连接索引服务
    #[error("无法连接索引服务: {url}")]
    Unreachable { url: String },
    /// 写入被拒绝
    #[error("索引写入未确认 (result={result})")]
    InsertRejected { result: String },
    /// 向量维度不符
    #[error("向量维度错误: 期望 {expected}, 实际 {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// 比对文本为空
    #[error("比对文本为空")]
    EmptyKey,
    /// 本地存储读写失败
    #[error("本地索引存储失败 ({path}): {source}")]
    Storage {
        path: String,
        #[source]
        source: BoxedSource,
    },
}

/// 质检流程错误
#[derive(Debug, Error)]
pub enum QcError {
    /// 输入或输出不符合题目格式
    #[error("题目格式校验失败: {0}")]
    FormatInvalid(String),
    /// 批次返回的题目数量不符
    #[error("Batch {batch} returned {actual} questions instead of {expected}")]
    CountMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },
    /// 批次返回的题号不符
    #[error("Question number mismatch in batch {batch}. Expected Q{expected}, found Q{actual}")]
    OrdinalMismatch {
        batch: usize,
        expected: u32,
        actual: u32,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 取值无法识别
    #[error("配置项 {name} 的取值 '{value}' 无法识别")]
    InvalidValue { name: String, value: String },
    /// 必填项缺失
    #[error("缺少配置项 {name}")]
    Missing { name: String },
}

// ========== 从常见错误类型转换 ==========

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Api(ApiError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建API请求失败错误
    pub fn api_request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Api(ApiError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建 API 非 2xx 响应错误
    pub fn api_bad_response(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        AppError::Api(ApiError::BadResponse {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: Box::new(source),
        })
    }

    /// 是否是连接类错误（索引 / 向量服务不可达）
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            AppError::Index(IndexError::Unreachable { .. }) | AppError::Api(ApiError::RequestFailed { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
