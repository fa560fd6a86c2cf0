use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Non-2xx response; `detail` is the backend's explanation when it sent one.
    #[error("backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("base url '{0}' cannot carry a path")]
    InvalidBase(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// 401 and 403 both mean the credentials presented were not accepted.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// What a user should be shown.
    pub fn detail(&self) -> String {
        match self {
            Self::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}
