//! REST client for the chat backend.
//!
//! [`Backend`] is the seam sync operations are written against;
//! [`ApiClient`] is its HTTP implementation.

mod backend;
mod client;
mod error;

pub use backend::Backend;
pub use client::ApiClient;
pub use error::{ApiError, ApiResult};
