//! Document layer
//! - buffer.rs: versioned text buffer for one open file
//! - position.rs: LSP position <-> rope offset conversion
//! - error.rs: validation errors for ranges and positions

pub mod buffer;
pub mod error;
pub mod position;

pub use buffer::Document;
pub use error::DocumentError;
