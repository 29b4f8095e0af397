/// 程序配置
///
/// 所有字段都可以通过同名（大写）环境变量覆盖，启动时会先加载 `.env`
#[derive(Clone, Debug)]
pub struct Config {
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 运行日志文件
    pub output_log_file: String,

    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    /// 质检使用的模型
    pub qc_model_name: String,
    /// 出题调用的最大尝试次数
    pub generation_max_retries: usize,
    /// 两次尝试之间的固定等待（秒）
    pub generation_retry_delay_secs: u64,
    /// 质检每批题目数
    pub qc_batch_size: usize,

    // --- 向量服务配置 ---
    /// `http` 或 `hashing`
    pub embedding_backend: String,
    pub embedding_api_base_url: String,
    pub embedding_api_key: String,
    pub embedding_model_name: String,
    pub embedding_dimensions: usize,

    // --- 索引配置 ---
    /// `elasticsearch` 或 `local`
    pub index_backend: String,
    pub elasticsearch_url: String,
    pub index_name: String,
    pub local_index_path: String,
    /// 短语匹配允许的间隔词数
    pub phrase_slop: u32,

    // --- 网络超时 ---
    pub http_connect_timeout_secs: u64,
    pub http_timeout_secs: u64,

    // --- 文件路径 ---
    pub raw_output_file: String,
    pub qc_output_file: String,
    pub qc_log_file: String,
    pub unique_output_file: String,
    pub reject_log_file: String,

    // --- 题库 API 配置 ---
    pub bank_list_url: String,
    pub bank_create_url: String,
    pub lti_origin: String,
    pub lti_referer: String,
    pub lti_department_ids: Vec<String>,
    pub neowise_origin: String,
    pub neowise_referer: String,
    pub neowise_department_ids: Vec<String>,
    /// 题目创建者 ID
    pub created_by: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            qc_model_name: "gpt-4o".to_string(),
            generation_max_retries: 3,
            generation_retry_delay_secs: 2,
            qc_batch_size: 5,
            embedding_backend: "http".to_string(),
            embedding_api_base_url: "http://localhost:8080/v1".to_string(),
            embedding_api_key: String::new(),
            embedding_model_name: "all-MiniLM-L6-v2".to_string(),
            embedding_dimensions: 384,
            index_backend: "elasticsearch".to_string(),
            elasticsearch_url: "http://elasticsearch:9200".to_string(),
            index_name: "mcq_questions".to_string(),
            local_index_path: "question_index.json".to_string(),
            phrase_slop: 3,
            http_connect_timeout_secs: 10,
            http_timeout_secs: 60,
            raw_output_file: "question_prompt.txt".to_string(),
            qc_output_file: "qced_mcq.txt".to_string(),
            qc_log_file: "qc_logs.txt".to_string(),
            unique_output_file: "unique_mcqs.json".to_string(),
            reject_log_file: "rejects.txt".to_string(),
            bank_list_url: String::new(),
            bank_create_url: String::new(),
            lti_origin: String::new(),
            lti_referer: String::new(),
            lti_department_ids: Vec::new(),
            neowise_origin: String::new(),
            neowise_referer: String::new(),
            neowise_department_ids: Vec::new(),
            created_by: String::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        // .env 不存在时静默跳过
        let _ = dotenvy::dotenv();

        let default = Self::default();
        Self {
            verbose_logging: env_parse("VERBOSE_LOGGING", default.verbose_logging),
            output_log_file: env_string("OUTPUT_LOG_FILE", default.output_log_file),
            llm_api_key: env_string("LLM_API_KEY", default.llm_api_key),
            llm_api_base_url: env_string("LLM_API_BASE_URL", default.llm_api_base_url),
            llm_model_name: env_string("LLM_MODEL_NAME", default.llm_model_name),
            qc_model_name: env_string("QC_MODEL_NAME", default.qc_model_name),
            generation_max_retries: env_parse("GENERATION_MAX_RETRIES", default.generation_max_retries),
            generation_retry_delay_secs: env_parse("GENERATION_RETRY_DELAY_SECS", default.generation_retry_delay_secs),
            qc_batch_size: env_parse("QC_BATCH_SIZE", default.qc_batch_size),
            embedding_backend: env_string("EMBEDDING_BACKEND", default.embedding_backend),
            embedding_api_base_url: env_string("EMBEDDING_API_BASE_URL", default.embedding_api_base_url),
            embedding_api_key: env_string("EMBEDDING_API_KEY", default.embedding_api_key),
            embedding_model_name: env_string("EMBEDDING_MODEL_NAME", default.embedding_model_name),
            embedding_dimensions: env_parse("EMBEDDING_DIMENSIONS", default.embedding_dimensions),
            index_backend: env_string("INDEX_BACKEND", default.index_backend),
            elasticsearch_url: elasticsearch_url_from_env(default.elasticsearch_url),
            index_name: env_string("INDEX_NAME", default.index_name),
            local_index_path: env_string("LOCAL_INDEX_PATH", default.local_index_path),
            phrase_slop: env_parse("PHRASE_SLOP", default.phrase_slop),
            http_connect_timeout_secs: env_parse("HTTP_CONNECT_TIMEOUT_SECS", default.http_connect_timeout_secs),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", default.http_timeout_secs),
            raw_output_file: env_string("RAW_OUTPUT_FILE", default.raw_output_file),
            qc_output_file: env_string("QC_OUTPUT_FILE", default.qc_output_file),
            qc_log_file: env_string("QC_LOG_FILE", default.qc_log_file),
            unique_output_file: env_string("UNIQUE_OUTPUT_FILE", default.unique_output_file),
            reject_log_file: env_string("REJECT_LOG_FILE", default.reject_log_file),
            bank_list_url: env_string("GET_ALL_QB_API", default.bank_list_url),
            bank_create_url: env_string("CREATE_QUESTION", default.bank_create_url),
            lti_origin: env_string("LTI_ORIGIN", default.lti_origin),
            lti_referer: env_string("LTI_REFERER", default.lti_referer),
            lti_department_ids: env_list("LTI_DEPARTMENT_IDS", default.lti_department_ids),
            neowise_origin: env_string("NEOWISE_ORIGIN", default.neowise_origin),
            neowise_referer: env_string("NEOWISE_REFERER", default.neowise_referer),
            neowise_department_ids: env_list("NEOWISE_DEPARTMENT_IDS", default.neowise_department_ids),
            created_by: env_string("CREATED_BY", default.created_by),
        }
    }

    /// 创建者 ID（空字符串视为未配置）
    pub fn creator(&self) -> Option<&str> {
        Some(self.created_by.as_str()).filter(|s| !s.trim().is_empty())
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_list(name: &str, default: Vec<String>) -> Vec<String> {
    std::env::var(name)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or(default)
}

/// 兼容 `ELASTICSEARCH_HOST` + `ELASTICSEARCH_PORT` 的旧写法
fn elasticsearch_url_from_env(default: String) -> String {
    if let Ok(url) = std::env::var("ELASTICSEARCH_URL") {
        return url;
    }
    match (std::env::var("ELASTICSEARCH_HOST"), std::env::var("ELASTICSEARCH_PORT")) {
        (Ok(host), Ok(port)) => format!("http://{}:{}", host, port),
        (Ok(host), Err(_)) => format!("http://{}:9200", host),
        _ => default,
    }
}
