//! Completion layer
//! - provider.rs: CompletionProvider trait
//! - keywords.rs: static keyword list provider

pub mod keywords;
pub mod provider;

pub use keywords::KeywordCompletionProvider;
pub use provider::CompletionProvider;
