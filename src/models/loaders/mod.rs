pub mod json_loader;

pub use json_loader::{load_questions, load_text, save_questions, save_text};
