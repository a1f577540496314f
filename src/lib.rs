pub mod config;
pub mod rag;
pub mod transcript;

#[cfg(test)]
mod testing;

pub use config::RagConfig;
pub use rag::{RagError, ResumeSession};
