/// 题库 API 客户端
///
/// 封装题库列表查询和单题创建两个接口，两个题库域只在请求头和部门列表上不同
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::http::read_body;
use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};
use crate::models::PersistedQuestion;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36";

/// 目标题库域
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankDomain {
    Lti,
    Neowise,
}

impl BankDomain {
    /// 列表接口每页数量
    pub fn page_limit(self) -> u32 {
        match self {
            BankDomain::Lti => 100,
            BankDomain::Neowise => 25,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BankDomain::Lti => "LTI",
            BankDomain::Neowise => "Neowise",
        }
    }
}

impl std::str::FromStr for BankDomain {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lti" => Ok(BankDomain::Lti),
            "neowise" => Ok(BankDomain::Neowise),
            other => Err(ConfigError::InvalidValue {
                name: "domain".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

/// 题库接口
#[async_trait]
pub trait BankApi: Send + Sync {
    fn domain(&self) -> BankDomain;

    /// 查询题库列表，返回接口原始 JSON
    async fn list_banks(&self, search: Option<&str>, page: u32) -> AppResult<Value>;

    /// 创建单道题目
    async fn create_question(&self, question: &PersistedQuestion) -> AppResult<()>;
}

#[derive(Debug, Serialize)]
struct ListBanksPayload<'a> {
    branch_id: &'a str,
    page: u32,
    limit: u32,
    visibility: &'a str,
    department_id: &'a [String],
    #[serde(rename = "mainDepartmentUser")]
    main_department_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<&'a str>,
}

/// 题库 API 客户端
pub struct BankClient {
    client: reqwest::Client,
    domain: BankDomain,
    list_url: String,
    create_url: String,
    origin: String,
    referer: String,
    department_ids: Vec<String>,
    token: String,
}

impl BankClient {
    /// 创建指定题库域的客户端
    pub fn new(
        config: &Config,
        client: reqwest::Client,
        domain: BankDomain,
        token: impl Into<String>,
    ) -> AppResult<Self> {
        let (origin, referer, department_ids) = match domain {
            BankDomain::Lti => (
                &config.lti_origin,
                &config.lti_referer,
                &config.lti_department_ids,
            ),
            BankDomain::Neowise => (
                &config.neowise_origin,
                &config.neowise_referer,
                &config.neowise_department_ids,
            ),
        };
        if config.bank_create_url.is_empty() {
            return Err(ConfigError::Missing {
                name: "CREATE_QUESTION".to_string(),
            }
            .into());
        }

        Ok(Self {
            client,
            domain,
            list_url: config.bank_list_url.clone(),
            create_url: config.bank_create_url.clone(),
            origin: origin.clone(),
            referer: referer.clone(),
            department_ids: department_ids.clone(),
            token: token.into(),
        })
    }

    fn post(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "en-GB,en-US;q=0.9,en;q=0.8")
            .header("authorization", &self.token)
            .header("content-type", "application/json")
            .header("origin", &self.origin)
            .header("referer", &self.referer)
            .header("user-agent", USER_AGENT)
    }
}

#[async_trait]
impl BankApi for BankClient {
    fn domain(&self) -> BankDomain {
        self.domain
    }

    async fn list_banks(&self, search: Option<&str>, page: u32) -> AppResult<Value> {
        if self.list_url.is_empty() {
            return Err(ConfigError::Missing {
                name: "GET_ALL_QB_API".to_string(),
            }
            .into());
        }
        let payload = ListBanksPayload {
            branch_id: "all",
            page,
            limit: self.domain.page_limit(),
            visibility: "All",
            department_id: &self.department_ids,
            main_department_user: true,
            search,
        };

        let response = self
            .post(&self.list_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&self.list_url, e))?;
        let body = read_body(&self.list_url, response).await.map_err(|e| {
            warn!("获取 {} 题库列表失败: {}", self.domain.name(), e);
            e
        })?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn create_question(&self, question: &PersistedQuestion) -> AppResult<()> {
        debug!("提交题目到题库 {:?}", question.qb_id);
        let response = self
            .post(&self.create_url)
            .json(question)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(&self.create_url, e))?;
        read_body(&self.create_url, response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_parsing() {
        assert_eq!("LTI".parse::<BankDomain>().unwrap(), BankDomain::Lti);
        assert_eq!(" neowise ".parse::<BankDomain>().unwrap(), BankDomain::Neowise);
        assert!("other".parse::<BankDomain>().is_err());
    }

    #[test]
    fn test_page_limits() {
        assert_eq!(BankDomain::Lti.page_limit(), 100);
        assert_eq!(BankDomain::Neowise.page_limit(), 25);
    }

    #[test]
    fn test_list_payload_shape() {
        let ids = vec!["dep-1".to_string()];
        let payload = ListBanksPayload {
            branch_id: "all",
            page: 1,
            limit: 25,
            visibility: "All",
            department_id: &ids,
            main_department_user: true,
            search: None,
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["mainDepartmentUser"], true);
        assert_eq!(value["department_id"][0], "dep-1");
        assert!(value.get("search").is_none());
    }

    #[test]
    fn test_missing_create_url_is_config_error() {
        let config = Config::default();
        let result = BankClient::new(&config, reqwest::Client::new(), BankDomain::Lti, "t");
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_is_api_error() {
        let config = Config {
            bank_list_url: "http://127.0.0.1:9/qb/list".to_string(),
            bank_create_url: "http://127.0.0.1:9/qb/create".to_string(),
            ..Config::default()
        };
        let client = BankClient::new(&config, reqwest::Client::new(), BankDomain::Lti, "t").unwrap();

        let record = crate::models::QuestionRecord::new(
            1,
            "Which keyword declares a constant in Rust?".into(),
            None,
            ["let", "const", "var", "static"].map(String::from),
            2,
        )
        .unwrap();
        let question = PersistedQuestion::from_record(&record, None);

        let err = client.create_question(&question).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Api(crate::error::ApiError::RequestFailed { .. })
        ));
        assert!(err.to_string().contains("/qb/create"));

        let err = client.list_banks(None, 1).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Api(crate::error::ApiError::RequestFailed { .. })
        ));
    }
}
