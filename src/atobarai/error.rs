use thiserror::Error;

/// Failure of a single NP Atobarai call. The client never retries; callers
/// decide what a failure means for the webhook.
#[derive(Debug, Error)]
pub enum AtobaraiApiError {
    #[error("NP Atobarai request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("NP Atobarai rejected the credentials")]
    Unauthorized,
    #[error("NP Atobarai rejected the request with status {status}: {codes:?}")]
    Rejected { status: u16, codes: Vec<String> },
    #[error("NP Atobarai is unavailable (status {status})")]
    Server { status: u16 },
    #[error("NP Atobarai response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("NP Atobarai returned an empty result list")]
    EmptyResult,
}

impl AtobaraiApiError {
    /// Error codes to surface to the merchant, if NP sent any.
    pub fn codes(&self) -> &[String] {
        match self {
            Self::Rejected { codes, .. } => codes,
            _ => &[],
        }
    }
}
