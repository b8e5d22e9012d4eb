use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data loading error: {0}")]
    DataLoading(String),

    #[error("Indexing error: {0}")]
    Indexing(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod chunker;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod data;
pub mod embeddings;
pub mod generator;
pub mod index;
pub mod indexer;
pub mod pipeline;
pub mod retriever;
pub mod validator;
