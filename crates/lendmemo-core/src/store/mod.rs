//! Storage abstraction for memos and their history.
//!
//! Two logical collections live behind [`MemoStore`]: the memos themselves
//! and an append-only list of history entries referencing them.

mod sqlite;

pub use sqlite::SqliteMemoStore;

use async_trait::async_trait;

use crate::error::LendResult;
use crate::types::{Memo, MemoHistory, MemoPatch};

/// Persistence operations needed by [`crate::MemoBook`].
///
/// History entries can only be appended and listed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoStore: Send + Sync {
    /// Insert a freshly created memo.
    async fn insert_memo(&self, memo: &Memo) -> LendResult<()>;

    /// Fetch a memo by id.
    async fn get_memo(&self, id: &str) -> LendResult<Option<Memo>>;

    /// Write the fields set in `patch` and bump the memo's version.
    ///
    /// With `expected_version` the write only happens if the stored version
    /// still matches, otherwise a conflict error is returned.
    async fn apply_patch(
        &self,
        id: &str,
        patch: &MemoPatch,
        expected_version: Option<i64>,
    ) -> LendResult<()>;

    /// Append a history entry.
    async fn append_history(&self, entry: &MemoHistory) -> LendResult<()>;

    /// All history entries of a memo, oldest first.
    async fn list_history(&self, memo_id: &str) -> LendResult<Vec<MemoHistory>>;
}
