use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use yotsu_types::api::ErrorBody;

use crate::error::{ApiError, ApiResult};

/// HTTP client for the backend's `/api` surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
}

impl ApiClient {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api`.
    pub fn new(base_url: &str) -> ApiResult<Self> {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    pub fn with_http(http: reqwest::Client, base_url: &str) -> ApiResult<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidBase(base_url.to_string()));
        }
        Ok(Self { http, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build an endpoint URL from path segments. Each segment is percent-encoded,
    /// so emoji and other user input are safe to pass.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidBase(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(
        &self,
        method: Method,
        segments: &[&str],
        bearer: Option<&str>,
    ) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "api request");
        let builder = self.http.request(method, url);
        Ok(match bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    /// Send and decode a JSON body.
    pub(crate) async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let resp = check(req.send().await?).await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send and discard whatever body comes back (204 or a confirmation object).
    pub(crate) async fn send_unit(&self, req: RequestBuilder) -> ApiResult<()> {
        check(req.send().await?).await?;
        Ok(())
    }
}

/// Map non-2xx responses to [`ApiError::Status`], keeping the backend's `detail`.
async fn check(resp: Response) -> ApiResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .map(|b| b.message())
        .unwrap_or_else(|_| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });

    debug!(status = status.as_u16(), %detail, "api error");
    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}
