pub mod cast;
pub mod catalog;
pub mod classify;
pub mod config;
pub mod credentials;
pub mod llm;
pub mod options;
pub mod prompt;
pub mod reference;
pub mod studio;
pub mod taxonomy;
pub mod utils;
