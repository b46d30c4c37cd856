//! Server state management.

use std::sync::Arc;

use lendmemo_core::config::LendMemoConfig;
use lendmemo_core::error::LendResult;
use lendmemo_core::store::{MemoStore, SqliteMemoStore};
use lendmemo_core::MemoBook;

use crate::factory::create_store;

/// Shared application state.
///
/// Holds the storage handle explicitly; handlers never reach for a global
/// database client.
#[derive(Clone)]
pub struct AppState {
    pub book: MemoBook,
}

impl AppState {
    /// Create state over an already constructed store.
    pub fn new(store: Arc<dyn MemoStore>) -> Self {
        Self {
            book: MemoBook::new(store),
        }
    }

    /// Create state backed by the store described in `config`.
    pub fn from_config(config: &LendMemoConfig) -> LendResult<Self> {
        Ok(Self::new(create_store(config)?))
    }

    /// Create state over a fresh in-memory database.
    pub fn in_memory() -> LendResult<Self> {
        Ok(Self::new(Arc::new(SqliteMemoStore::in_memory()?)))
    }
}
