use thiserror::Error;

/// Main error type for kgpath
#[derive(Error, Debug)]
pub enum PathfinderError {
    /// Degree index / literature store errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Remote graph service errors (transport, status, malformed body)
    #[error("Remote graph error: {0}")]
    Remote(String),

    /// A path extension would revisit a node
    #[error("Node {0} already on path")]
    CycleRejected(String),

    /// A search task failed to complete
    #[error("Search error: {0}")]
    Search(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using PathfinderError
pub type Result<T> = std::result::Result<T, PathfinderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PathfinderError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_cycle_display_names_node() {
        let err = PathfinderError::CycleRejected("DOID:9352".to_string());
        assert_eq!(err.to_string(), "Node DOID:9352 already on path");
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: PathfinderError = rusqlite_err.into();
        assert!(matches!(err, PathfinderError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PathfinderError = io_err.into();
        assert!(matches!(err, PathfinderError::Io(_)));
    }
}
