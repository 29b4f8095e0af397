pub mod loaders;
pub mod persisted;
pub mod question;

pub use loaders::{load_questions, load_text, save_questions, save_text};
pub use persisted::{PersistedQuestion, StoredQuestion};
pub use question::{
    CodeSnippet, EditorKind, QuestionBlock, QuestionRecord, RejectReason, Rejection,
    CODE_SEPARATOR,
};
