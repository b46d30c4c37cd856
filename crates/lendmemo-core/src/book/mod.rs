//! The memo book: create, fetch and audited update of memos.

mod diff;

pub use diff::{MemoDiff, MemoUpdate, NewMemo};

use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{LendError, LendResult};
use crate::store::MemoStore;
use crate::types::{
    ChangeSet, CreateMemoRequest, HistoryAction, Memo, MemoDetail, MemoHistory,
    UpdateMemoRequest,
};

/// Current time at the precision the store keeps.
fn current_time() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Outcome of [`MemoBook::update`].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// Every requested value matched the stored one; nothing was written.
    Unchanged,
    /// The changed fields were written.
    Updated {
        /// The memo as it is after the update.
        memo: Memo,
        action: HistoryAction,
        changes: ChangeSet,
    },
}

/// Application service over a [`MemoStore`].
///
/// Every mutation is followed by a history append. A failed append is logged
/// and swallowed: the memo write stands even if its audit entry is missing.
#[derive(Clone)]
pub struct MemoBook {
    store: Arc<dyn MemoStore>,
}

impl MemoBook {
    pub fn new(store: Arc<dyn MemoStore>) -> Self {
        Self { store }
    }

    /// Create a memo and its `created` history entry.
    pub async fn create(&self, request: CreateMemoRequest) -> LendResult<Memo> {
        let new_memo = NewMemo::try_from(request)?;
        let now = current_time();
        let memo = new_memo.into_memo(Uuid::new_v4().to_string(), now);

        self.store.insert_memo(&memo).await?;

        // Record history
        let entry = MemoHistory {
            id: Uuid::new_v4().to_string(),
            memo_id: memo.id.clone(),
            editor_name: memo.lent_by_name.clone(),
            action: HistoryAction::Created,
            changes: None,
            created_at: now,
        };
        self.append_history(&entry).await;

        info!(memo_id = %memo.id, "Memo created");
        Ok(memo)
    }

    /// Fetch a memo with its history, oldest entry first.
    pub async fn get(&self, id: &str) -> LendResult<MemoDetail> {
        let memo = self
            .store
            .get_memo(id)
            .await?
            .ok_or_else(|| LendError::not_found(id))?;
        let histories = self.store.list_history(id).await?;

        Ok(MemoDetail { memo, histories })
    }

    /// Apply the fields of `request` that differ from the stored memo.
    ///
    /// Nothing is written when no field differs. Without `expectedVersion`
    /// concurrent updates are last-write-wins per field.
    pub async fn update(&self, id: &str, request: UpdateMemoRequest) -> LendResult<UpdateOutcome> {
        let update = MemoUpdate::try_from(request)?;

        let mut current = self
            .store
            .get_memo(id)
            .await?
            .ok_or_else(|| LendError::not_found(id))?;

        if let Some(expected) = update.expected_version {
            if expected != current.version {
                return Err(LendError::conflict(expected, Some(current.version)));
            }
        }

        let now = current_time();
        let diff = update.diff(&current, now);
        if diff.is_empty() {
            debug!(memo_id = %id, editor = %update.editor_name, "Update changed nothing");
            return Ok(UpdateOutcome::Unchanged);
        }

        self.store
            .apply_patch(id, &diff.patch, update.expected_version)
            .await?;

        // Record history
        let action = diff.action();
        let entry = MemoHistory {
            id: Uuid::new_v4().to_string(),
            memo_id: id.to_string(),
            editor_name: update.editor_name.clone(),
            action,
            changes: Some(diff.changes.clone()),
            created_at: now,
        };
        self.append_history(&entry).await;

        diff.patch.apply_to(&mut current);
        info!(
            memo_id = %id,
            action = %action,
            fields = ?diff.changes.keys().collect::<Vec<_>>(),
            "Memo updated"
        );

        Ok(UpdateOutcome::Updated {
            memo: current,
            action,
            changes: diff.changes,
        })
    }

    /// Append a history entry, logging instead of failing.
    async fn append_history(&self, entry: &MemoHistory) {
        if let Err(e) = self.store.append_history(entry).await {
            error!(
                memo_id = %entry.memo_id,
                action = %entry.action,
                error = %e,
                "History creation failed; keeping the memo write"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MockMemoStore, SqliteMemoStore};
    use crate::types::{FieldChange, MemoStatus};
    use chrono::NaiveDate;

    fn book() -> MemoBook {
        MemoBook::new(Arc::new(SqliteMemoStore::in_memory().unwrap()))
    }

    fn request() -> CreateMemoRequest {
        CreateMemoRequest::new("A", "Ben", "Switch", "2024-04-01").with_memo("with two controllers")
    }

    fn stored_memo() -> Memo {
        NewMemo::try_from(request())
            .unwrap()
            .into_memo("m1".to_string(), Utc::now())
    }

    #[tokio::test]
    async fn test_create_writes_one_created_entry() {
        let book = book();
        let memo = book.create(request()).await.unwrap();
        assert_eq!(memo.status, MemoStatus::Active);
        assert_eq!(memo.version, 1);

        let detail = book.get(&memo.id).await.unwrap();
        assert_eq!(detail.memo, memo);
        assert_eq!(detail.histories.len(), 1);
        assert_eq!(detail.histories[0].action, HistoryAction::Created);
        assert_eq!(detail.histories[0].editor_name, "A");
        assert_eq!(detail.histories[0].changes, None);
    }

    #[tokio::test]
    async fn test_create_missing_field_writes_nothing() {
        let mut store = MockMemoStore::new();
        store.expect_insert_memo().never();
        store.expect_append_history().never();
        let book = MemoBook::new(Arc::new(store));

        let mut incomplete = request();
        incomplete.amount_or_item = None;
        let err = book.create(incomplete).await.unwrap_err();
        assert!(matches!(err, LendError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_get_unknown_memo_is_not_found() {
        let err = book().get("does-not-exist").await.unwrap_err();
        assert!(matches!(err, LendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_unknown_memo_is_not_found() {
        let err = book()
            .update("does-not-exist", UpdateMemoRequest::by("Ben").lent_by_name("B"))
            .await
            .unwrap_err();
        assert!(matches!(err, LendError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_update_without_differences_is_noop() {
        let book = book();
        let memo = book.create(request()).await.unwrap();

        let outcome = book
            .update(&memo.id, UpdateMemoRequest::by("Ben").lent_by_name("A"))
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome::Unchanged);

        let detail = book.get(&memo.id).await.unwrap();
        assert_eq!(detail.histories.len(), 1);
        assert_eq!(detail.memo.version, 1);
        assert_eq!(detail.memo.updated_at, memo.updated_at);
    }

    #[tokio::test]
    async fn test_update_records_from_to_pair() {
        let book = book();
        let memo = book.create(request()).await.unwrap();

        let outcome = book
            .update(&memo.id, UpdateMemoRequest::by("Ben").lent_by_name("B"))
            .await
            .unwrap();
        match outcome {
            UpdateOutcome::Updated { memo, action, .. } => {
                assert_eq!(action, HistoryAction::Edited);
                assert_eq!(memo.lent_by_name, "B");
                assert_eq!(memo.version, 2);
            }
            other => panic!("expected an update, got {:?}", other),
        }

        let detail = book.get(&memo.id).await.unwrap();
        assert_eq!(detail.memo.lent_by_name, "B");
        assert_eq!(detail.histories.len(), 2);
        let edit = &detail.histories[1];
        assert_eq!(edit.action, HistoryAction::Edited);
        assert_eq!(edit.editor_name, "Ben");
        let changes = edit.changes.as_ref().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["lentByName"], FieldChange::new("A", "B"));
    }

    #[tokio::test]
    async fn test_marking_returned() {
        let book = book();
        let memo = book.create(request()).await.unwrap();

        book.update(
            &memo.id,
            UpdateMemoRequest::by("Ben").status(MemoStatus::Returned),
        )
        .await
        .unwrap();

        let detail = book.get(&memo.id).await.unwrap();
        assert_eq!(detail.memo.status, MemoStatus::Returned);
        let last = detail.histories.last().unwrap();
        assert_eq!(last.action, HistoryAction::Returned);
        assert_eq!(
            last.changes.as_ref().unwrap()["status"],
            FieldChange::new("active", "returned")
        );
    }

    #[tokio::test]
    async fn test_note_on_returned_memo_is_logged_as_edit() {
        let book = book();
        let memo = book.create(request()).await.unwrap();
        book.update(&memo.id, UpdateMemoRequest::by("Ben").status(MemoStatus::Returned))
            .await
            .unwrap();

        let outcome = book
            .update(
                &memo.id,
                UpdateMemoRequest::by("Ben")
                    .status(MemoStatus::Returned)
                    .memo(Some("paid back in cash".to_string())),
            )
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            UpdateOutcome::Updated {
                action: HistoryAction::Edited,
                ..
            }
        ));

        let detail = book.get(&memo.id).await.unwrap();
        let last = detail.histories.last().unwrap();
        assert_eq!(last.action, HistoryAction::Edited);
        let changes = last.changes.as_ref().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(changes.contains_key("memo"));
    }

    #[tokio::test]
    async fn test_history_stays_in_creation_order() {
        let book = book();
        let memo = book.create(request()).await.unwrap();

        book.update(&memo.id, UpdateMemoRequest::by("Ben").borrowed_by_name("Chie"))
            .await
            .unwrap();
        book.update(&memo.id, UpdateMemoRequest::by("Chie").due_date(Some("2024-05-01".into())))
            .await
            .unwrap();
        book.update(&memo.id, UpdateMemoRequest::by("Chie").status(MemoStatus::Returned))
            .await
            .unwrap();

        let detail = book.get(&memo.id).await.unwrap();
        let actions: Vec<HistoryAction> = detail.histories.iter().map(|h| h.action).collect();
        assert_eq!(
            actions,
            vec![
                HistoryAction::Created,
                HistoryAction::Edited,
                HistoryAction::Edited,
                HistoryAction::Returned
            ]
        );
        assert!(detail
            .histories
            .windows(2)
            .all(|pair| pair[0].created_at <= pair[1].created_at));
        assert_eq!(
            detail.memo.due_date,
            NaiveDate::from_ymd_opt(2024, 5, 1)
        );
    }

    #[tokio::test]
    async fn test_stale_expected_version_is_rejected() {
        let book = book();
        let memo = book.create(request()).await.unwrap();

        book.update(
            &memo.id,
            UpdateMemoRequest::by("Ben").lent_by_name("B").expected_version(1),
        )
        .await
        .unwrap();

        let err = book
            .update(
                &memo.id,
                UpdateMemoRequest::by("A").lent_by_name("C").expected_version(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            LendError::Conflict {
                expected: Some(1),
                actual: Some(2),
                ..
            }
        ));

        let detail = book.get(&memo.id).await.unwrap();
        assert_eq!(detail.memo.lent_by_name, "B");
        assert_eq!(detail.histories.len(), 2);
    }

    #[tokio::test]
    async fn test_history_failure_does_not_fail_create() {
        let mut store = MockMemoStore::new();
        store.expect_insert_memo().times(1).returning(|_| Ok(()));
        store
            .expect_append_history()
            .times(1)
            .withf(|entry| entry.action == HistoryAction::Created)
            .returning(|_| Err(LendError::database("history table locked")));
        let book = MemoBook::new(Arc::new(store));

        let memo = book.create(request()).await.unwrap();
        assert_eq!(memo.lent_by_name, "A");
    }

    #[tokio::test]
    async fn test_history_failure_does_not_roll_back_update() {
        let current = stored_memo();
        let mut store = MockMemoStore::new();
        store
            .expect_get_memo()
            .times(1)
            .returning(move |_| Ok(Some(current.clone())));
        store
            .expect_apply_patch()
            .times(1)
            .withf(|id, patch, expected| {
                id == "m1" && patch.status == Some(MemoStatus::Returned) && expected.is_none()
            })
            .returning(|_, _, _| Ok(()));
        store
            .expect_append_history()
            .times(1)
            .returning(|_| Err(LendError::database("history table locked")));
        let book = MemoBook::new(Arc::new(store));

        let outcome = book
            .update("m1", UpdateMemoRequest::by("Ben").status(MemoStatus::Returned))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            UpdateOutcome::Updated {
                action: HistoryAction::Returned,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_noop_update_touches_no_store_writes() {
        let current = stored_memo();
        let mut store = MockMemoStore::new();
        store
            .expect_get_memo()
            .returning(move |_| Ok(Some(current.clone())));
        store.expect_apply_patch().never();
        store.expect_append_history().never();
        let book = MemoBook::new(Arc::new(store));

        let outcome = book
            .update("m1", UpdateMemoRequest::by("Ben").amount_or_item("Switch"))
            .await;
        tokio_test::assert_ok!(&outcome);
        assert_eq!(outcome.unwrap(), UpdateOutcome::Unchanged);
    }
}
