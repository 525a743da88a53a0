use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Graph error: {0}")]
    Graph(#[from] voicetree_graph::GraphError),

    #[error("Watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid vault path: {0}")]
    InvalidPath(String),

    #[error("Disk write failed: {0}")]
    Write(String),

    #[error("{0}")]
    Other(String),
}

impl From<toml::de::Error> for IndexerError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<globset::Error> for IndexerError {
    fn from(err: globset::Error) -> Self {
        Self::Config(format!("invalid exclude pattern: {err}"))
    }
}
