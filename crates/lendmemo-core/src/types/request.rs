//! Request and response bodies shared by the server and the client.

use serde::{Deserialize, Deserializer, Serialize};

use super::memo::MemoStatus;

/// Body of `POST /api/memo`.
///
/// Every field is optional at the serde level so that a missing required
/// field surfaces as a validation error naming the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMemoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lent_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_or_item: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_date: Option<String>,
    /// `YYYY-MM-DD`; empty means no due date.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

impl CreateMemoRequest {
    pub fn new(
        lent_by_name: impl Into<String>,
        borrowed_by_name: impl Into<String>,
        amount_or_item: impl Into<String>,
        loan_date: impl Into<String>,
    ) -> Self {
        Self {
            lent_by_name: Some(lent_by_name.into()),
            borrowed_by_name: Some(borrowed_by_name.into()),
            amount_or_item: Some(amount_or_item.into()),
            loan_date: Some(loan_date.into()),
            due_date: None,
            memo: None,
        }
    }

    pub fn with_due_date(mut self, due_date: impl Into<String>) -> Self {
        self.due_date = Some(due_date.into());
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = Some(memo.into());
        self
    }
}

/// Body of `PUT /api/memo/{id}`.
///
/// `dueDate` and `memo` are tri-state: absent leaves the field alone, `null`
/// or `""` clears it, a value sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMemoRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lent_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub borrowed_by_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_or_item: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loan_date: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub memo: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<MemoStatus>,
    /// Required; who is making the change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_name: Option<String>,
    /// Reject the update unless the stored version still matches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_version: Option<i64>,
}

impl UpdateMemoRequest {
    /// An otherwise empty update signed by `editor_name`.
    pub fn by(editor_name: impl Into<String>) -> Self {
        Self {
            editor_name: Some(editor_name.into()),
            ..Default::default()
        }
    }

    pub fn lent_by_name(mut self, value: impl Into<String>) -> Self {
        self.lent_by_name = Some(value.into());
        self
    }

    pub fn borrowed_by_name(mut self, value: impl Into<String>) -> Self {
        self.borrowed_by_name = Some(value.into());
        self
    }

    pub fn amount_or_item(mut self, value: impl Into<String>) -> Self {
        self.amount_or_item = Some(value.into());
        self
    }

    pub fn loan_date(mut self, value: impl Into<String>) -> Self {
        self.loan_date = Some(value.into());
        self
    }

    /// Set (`Some`) or clear (`None`) the due date.
    pub fn due_date(mut self, value: Option<String>) -> Self {
        self.due_date = Some(value);
        self
    }

    /// Set (`Some`) or clear (`None`) the note.
    pub fn memo(mut self, value: Option<String>) -> Self {
        self.memo = Some(value);
        self
    }

    pub fn status(mut self, status: MemoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn expected_version(mut self, version: i64) -> Self {
        self.expected_version = Some(version);
        self
    }
}

/// Distinguishes an explicit `null` from an absent key.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Response of `POST /api/memo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateMemoResponse {
    pub id: String,
    pub message: String,
}

/// Response carrying only a human-readable message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}
