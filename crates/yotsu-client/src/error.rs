use thiserror::Error;

use yotsu_api::ApiError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Bad credentials or a bad one-time code. Session state is unchanged.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The refresh token was missing or rejected. The session has been cleared.
    #[error("session expired")]
    SessionExpired,

    #[error("not authenticated")]
    NotAuthenticated,

    /// Any other backend failure. The store is unchanged.
    #[error(transparent)]
    Sync(#[from] ApiError),

    #[error("token vault error: {0}")]
    Vault(#[from] anyhow::Error),
}

impl ClientError {
    /// Map a rejected auth call. Client errors (4xx) carry the backend's
    /// `detail` for display; everything else is a plain sync failure.
    pub(crate) fn from_auth(err: ApiError) -> Self {
        match err.status() {
            Some(status) if (400..500).contains(&status) => Self::Authentication(err.detail()),
            _ => Self::Sync(err),
        }
    }
}
