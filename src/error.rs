use thiserror::Error;

/// Errors raised by the enumeration core.
///
/// `Connectivity`, `InvalidOptions` and `Corpus` abort a run before any
/// worker starts. Everything else is reported per candidate on the error
/// stream and never stops the worker pool.
#[derive(Debug, Error)]
pub enum BusterError {
    #[error("unable to connect to {url}: {reason}")]
    Connectivity { url: String, reason: String },

    #[error("invalid options:\n{}", .0.join("\n"))]
    InvalidOptions(Vec<String>),

    #[error("failed to read {path}: {reason}")]
    Corpus { path: String, reason: String },

    #[error("request to {url} failed: {reason}")]
    Probe { url: String, reason: String },

    #[error("invalid certificate for {url}: {reason}")]
    InvalidCertificate { url: String, reason: String },

    #[error("malformed response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("lookup of {name} failed: {reason}")]
    Resolve { name: String, reason: String },

    #[error("wildcard calibration has not been run")]
    NotCalibrated,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Failure of a single HTTP probe.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("missing or invalid redirect location: {0}")]
    BadLocation(String),

    #[error("{0}")]
    Request(String),
}

impl TransportError {
    /// Attach the probed URL to build a per-candidate error.
    pub fn at(self, url: &str) -> BusterError {
        let url = url.to_string();
        match self {
            TransportError::InvalidCertificate(reason) => BusterError::InvalidCertificate { url, reason },
            TransportError::BadLocation(reason) => BusterError::MalformedResponse { url, reason },
            TransportError::Request(reason) => BusterError::Probe { url, reason },
        }
    }
}

/// Failure of a single DNS lookup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// NXDOMAIN or an empty answer. Expected during enumeration.
    #[error("no records found")]
    NotFound,

    #[error("{0}")]
    Failed(String),
}

pub type Result<T, E = BusterError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_keep_their_kind() {
        let err = TransportError::InvalidCertificate("self signed".into()).at("https://h/");
        assert!(matches!(err, BusterError::InvalidCertificate { .. }));

        let err = TransportError::BadLocation("::".into()).at("http://h/a");
        assert!(matches!(err, BusterError::MalformedResponse { ref url, .. } if url == "http://h/a"));
    }

    #[test]
    fn invalid_options_lists_every_problem() {
        let err = BusterError::InvalidOptions(vec!["first".into(), "second".into()]);
        let text = err.to_string();
        assert!(text.contains("first"));
        assert!(text.contains("second"));
    }
}
