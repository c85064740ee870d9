use std::path::PathBuf;

pub type LyricResult<T> = Result<T, LyricError>;

#[derive(thiserror::Error, Debug)]
pub enum LyricError {
    #[error("source unavailable: '{}': {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("selection contains no lines")]
    EmptySelection,

    #[error("metadata unavailable: {0}")]
    MetadataUnavailable(String),

    #[error("{stage} render failed ({status}): {diagnostics}")]
    RenderFailed {
        stage: String,
        status: String,
        diagnostics: String,
    },

    #[error("filter graph error: {0}")]
    Graph(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LyricError {
    pub fn source_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_selection(msg: impl Into<String>) -> Self {
        Self::InvalidSelection(msg.into())
    }

    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::MetadataUnavailable(msg.into())
    }

    pub fn render_failed(
        stage: impl ToString,
        status: impl Into<String>,
        diagnostics: impl Into<String>,
    ) -> Self {
        Self::RenderFailed {
            stage: stage.to_string(),
            status: status.into(),
            diagnostics: diagnostics.into(),
        }
    }

    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
