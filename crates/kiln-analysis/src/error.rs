//! Error types for dependency analysis.

use std::path::PathBuf;

/// Error types for kiln-analysis operations.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// I/O failure, annotated with the path that produced it.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A jar could not be opened or read as a zip archive. There is no
    /// safe partial answer for a corrupt archive, so this aborts the
    /// analysis batch.
    #[error("failed to read archive {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// `files_for_target` was called before the classpath snapshot was
    /// finalized.
    #[error("classpath has not been finalized")]
    ClasspathNotFinalized,

    /// A build graph operation failed.
    #[error(transparent)]
    Graph(#[from] kiln_graph::GraphError),
}

/// Result type alias for kiln-analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
