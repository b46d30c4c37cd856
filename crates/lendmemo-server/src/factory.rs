//! Factory for creating the memo store from configuration.

use std::sync::Arc;

use lendmemo_core::config::LendMemoConfig;
use lendmemo_core::error::LendResult;
use lendmemo_core::store::{MemoStore, SqliteMemoStore};
use tracing::info;

/// Open the store configured by `database_path`.
pub fn create_store(config: &LendMemoConfig) -> LendResult<Arc<dyn MemoStore>> {
    let store = SqliteMemoStore::open(&config.database_path)?;
    info!(path = %store.path().display(), "Memo store opened");
    Ok(Arc::new(store))
}
