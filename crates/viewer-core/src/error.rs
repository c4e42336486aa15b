use crate::config::ConfigError;
use pdf_engine::PdfEngineError;

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("failed to load document: {0}")]
    DocumentLoad(#[source] PdfEngineError),

    #[error("failed to render page {page}: {source}")]
    PageRender {
        page: u32,
        #[source]
        source: PdfEngineError,
    },

    #[error("viewer halted after a failed document load")]
    Halted,

    #[error("invalid viewer configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type ViewerResult<T> = Result<T, ViewerError>;
