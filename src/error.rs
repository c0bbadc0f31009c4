use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("results log error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no snippet with id `{id}`")]
    UnknownSnippet { id: String },

    #[error("snippet catalog is empty")]
    EmptyCatalog,
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = Error::UnknownSnippet {
            id: "graphs-bfs-rust".to_string(),
        };
        assert_eq!(err.to_string(), "no snippet with id `graphs-bfs-rust`");
        assert_eq!(Error::EmptyCatalog.to_string(), "snippet catalog is empty");
    }

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(Error::Io(_))));
    }
}
