pub mod content;
pub mod progress;

pub use content::{Dictionary, NewWord, Word};
pub use progress::SqliteProgressStore;
