//! Sync operations and live event handlers for the chat client.
//!
//! [`ChatClient`] owns the entity store together with the backend and the
//! refresh-token vault. Sync operations perform one round trip and merge the
//! confirmed result; live handlers patch the store directly. The store lock is
//! only taken for the duration of a merge, never across an `.await`.

pub mod auth;
pub mod channels;
pub mod config;
pub mod error;
pub mod events;
pub mod members;
pub mod messages;
pub mod reactions;

use std::sync::{Arc, PoisonError, RwLock};

use tracing::warn;

use yotsu_api::{ApiError, Backend};
use yotsu_db::TokenVault;
use yotsu_store::Store;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};

/// Default `limit` for message pages.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

pub struct ChatClient<B, V> {
    backend: B,
    vault: V,
    store: Arc<RwLock<Store>>,
    page_size: u32,
}

impl<B: Backend, V: TokenVault> ChatClient<B, V> {
    /// Construct a client with an empty store.
    pub fn new(backend: B, vault: V) -> Self {
        Self {
            backend,
            vault,
            store: Arc::new(RwLock::new(Store::new())),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn vault(&self) -> &V {
        &self.vault
    }

    /// Shared handle for views that render from the store.
    pub fn store(&self) -> Arc<RwLock<Store>> {
        Arc::clone(&self.store)
    }

    /// Run `f` against a read view of the store.
    pub fn read<R>(&self, f: impl FnOnce(&Store) -> R) -> R {
        let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Run `f` against the store with exclusive access. A mutation runs to
    /// completion before any other reader or writer sees the store.
    pub fn write<R>(&self, f: impl FnOnce(&mut Store) -> R) -> R {
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }

    /// The bearer for authenticated calls.
    pub(crate) fn access_token(&self) -> ClientResult<String> {
        self.read(|store| store.session().access_token().map(str::to_owned))
            .ok_or(ClientError::NotAuthenticated)
    }
}

/// Log a failed sync operation once and wrap it. The store is left as it was.
pub(crate) fn sync_failure(operation: &str, err: ApiError) -> ClientError {
    warn!("{} failed: {}", operation, err);
    ClientError::Sync(err)
}
