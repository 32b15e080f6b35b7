use std::path::PathBuf;

/// Failure kinds surfaced by the fetch / store / apply cycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("network request failed: {url}: {message}")]
    Network { url: String, message: String },

    #[error("no pictures found: {0}")]
    Parse(String),

    #[error("persistence failed: {path}: {message}")]
    Persistence { path: PathBuf, message: String },

    #[error("file i/o failed: {path}: {source}")]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set wallpaper on {screen}: {message}")]
    Platform { screen: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub fn network(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            message: err.to_string(),
        }
    }

    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileIo {
            path: path.into(),
            source,
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Persistence {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Short machine-friendly kind name, used in log fields and update events.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Parse(_) => "parse",
            Self::Persistence { .. } => "persistence",
            Self::FileIo { .. } => "file_io",
            Self::Platform { .. } => "platform",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn network_error_mentions_url() {
        let err = Error::network("http://example.test/page/3", "connection refused");
        let msg = err.to_string();
        assert!(msg.contains("http://example.test/page/3"));
        assert!(msg.contains("connection refused"));
        assert_eq!(err.kind(), "network");
    }

    #[test]
    fn file_io_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = Error::file_io("/tmp/missing.png", io);
        assert_eq!(err.kind(), "file_io");
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/missing.png"));
    }
}
