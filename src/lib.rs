pub mod completion;
pub mod config;
pub mod document;
pub mod log;
pub mod lsp;
pub mod workspace;
