use thiserror::Error;

/// Failures that abort the current sync cycle. Per-movie failures are
/// logged and swallowed at the call site instead of surfacing here.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("{service} returned HTTP {status}: {body}")]
    UpstreamUnavailable {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}
