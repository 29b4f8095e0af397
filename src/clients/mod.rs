pub mod bank_client;
pub mod embedding_client;
pub mod http;
pub mod llm_client;
pub mod local_index;
pub mod search_index;

pub use bank_client::{BankApi, BankClient, BankDomain};
pub use embedding_client::{cosine_similarity, Embedder, HashingEmbedder, HttpEmbedder};
pub use http::build_http_client;
pub use llm_client::{ChatModel, LlmClient};
pub use local_index::LocalIndex;
pub use search_index::{ElasticIndex, QuestionIndex};
