use std::fmt;

/// Error returned by a single fetcher (status, release or version probe).
///
/// Every variant is terminal for the current scrape; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection failure, timeout, or a client that could not be built.
    #[error("transport error: {0}")]
    Transport(String),
    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    /// The node answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// The status call succeeded but carried no result.
    #[error("empty status from node")]
    EmptyResponse,
    /// The payload was not the JSON we expected.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    /// The version binary could not be spawned or exited non-zero.
    #[error("process error: {0}")]
    Process(String),
}

impl FetchError {
    /// Builds a [`FetchError::Transport`] carrying the full `source()` chain,
    /// so that e.g. "connection refused" survives into the message.
    pub fn transport(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut msg = err.to_string();
        let mut source = err.source();
        while let Some(cause) = source {
            let cause_msg = cause.to_string();
            if !msg.contains(&cause_msg) {
                msg.push_str(": ");
                msg.push_str(&cause_msg);
            }
            source = cause.source();
        }
        FetchError::Transport(msg)
    }
}

/// Which of the concurrently fetched sources produced an error.
///
/// The declaration order is the resolution priority of the aggregator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScrapeSource {
    LocalStatus,
    RemoteStatus,
    Release,
    Version,
}

impl fmt::Display for ScrapeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeSource::LocalStatus => write!(f, "local status"),
            ScrapeSource::RemoteStatus => write!(f, "remote status"),
            ScrapeSource::Release => write!(f, "latest release"),
            ScrapeSource::Version => write!(f, "binary version"),
        }
    }
}

/// The single aggregate error of a failed scrape.
///
/// Displays as the underlying fetch error's message, verbatim.
#[derive(Debug, thiserror::Error)]
#[error("{error}")]
pub struct ScrapeError {
    pub source_kind: ScrapeSource,
    #[source]
    pub error: FetchError,
}

impl ScrapeError {
    pub fn new(source_kind: ScrapeSource, error: FetchError) -> Self {
        Self { source_kind, error }
    }
}

/// Errors that can occur while encoding the metric registry.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
    #[error("exposition is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Outer(#[source] io::Error);

    #[test]
    fn transport_error_includes_source_chain() {
        let err = Outer(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"));
        let fetch = FetchError::transport(&err);
        assert_eq!(
            fetch.to_string(),
            "transport error: error sending request: connection refused"
        );
    }

    #[test]
    fn scrape_error_displays_underlying_message() {
        let err = ScrapeError::new(
            ScrapeSource::RemoteStatus,
            FetchError::Transport("connection refused".into()),
        );
        assert_eq!(err.to_string(), "transport error: connection refused");
        assert_eq!(err.source_kind.to_string(), "remote status");
    }

    #[test]
    fn scrape_sources_are_ordered_by_priority() {
        assert!(ScrapeSource::LocalStatus < ScrapeSource::RemoteStatus);
        assert!(ScrapeSource::RemoteStatus < ScrapeSource::Release);
        assert!(ScrapeSource::Release < ScrapeSource::Version);
    }
}
