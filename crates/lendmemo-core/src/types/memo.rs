//! Memo and history record types.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle state of a memo.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum MemoStatus {
    /// The item or money is still out.
    #[default]
    Active,
    /// The borrower gave it back.
    Returned,
}

/// Kind of mutation a history entry records.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Edited,
    Returned,
}

/// Previous and new value of a single field.
///
/// Values are kept as JSON so optional fields can record `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub from: serde_json::Value,
    pub to: serde_json::Value,
}

impl FieldChange {
    pub fn new(from: impl Into<serde_json::Value>, to: impl Into<serde_json::Value>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Changed field name (camelCase, as it appears on the wire) to its change.
pub type ChangeSet = BTreeMap<String, FieldChange>;

/// A lend/borrow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    /// Unique identifier, also the share link token.
    pub id: String,
    /// Who lent the item.
    pub lent_by_name: String,
    /// Who borrowed the item.
    pub borrowed_by_name: String,
    /// Free-text description of the money or item.
    pub amount_or_item: String,
    /// When the loan happened.
    pub loan_date: NaiveDate,
    /// When the item should come back.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Free-text note.
    #[serde(default)]
    pub memo: Option<String>,
    pub status: MemoStatus,
    /// Incremented on every applied update.
    pub version: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

/// One immutable entry in a memo's audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoHistory {
    pub id: String,
    /// Parent memo.
    pub memo_id: String,
    /// Display name supplied by whoever made the change. Not authenticated.
    pub editor_name: String,
    pub action: HistoryAction,
    #[serde(default)]
    pub changes: Option<ChangeSet>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Wire form of record timestamps: RFC 3339 UTC with exactly six fractional
/// digits, so that serialized timestamps sort lexically.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// A memo together with its history, oldest entry first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoDetail {
    #[serde(flatten)]
    pub memo: Memo,
    pub histories: Vec<MemoHistory>,
}

/// Field-level patch applied to a stored memo.
///
/// `None` leaves a field untouched. For the optional fields the inner
/// `None` clears the stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoPatch {
    pub lent_by_name: Option<String>,
    pub borrowed_by_name: Option<String>,
    pub amount_or_item: Option<String>,
    pub loan_date: Option<NaiveDate>,
    pub due_date: Option<Option<NaiveDate>>,
    pub memo: Option<Option<String>>,
    pub status: Option<MemoStatus>,
    pub updated_at: DateTime<Utc>,
}

impl MemoPatch {
    /// An empty patch stamped with the given update time.
    pub fn new(updated_at: DateTime<Utc>) -> Self {
        Self {
            lent_by_name: None,
            borrowed_by_name: None,
            amount_or_item: None,
            loan_date: None,
            due_date: None,
            memo: None,
            status: None,
            updated_at,
        }
    }

    /// Whether the patch changes any field besides the update timestamp.
    pub fn is_empty(&self) -> bool {
        self.lent_by_name.is_none()
            && self.borrowed_by_name.is_none()
            && self.amount_or_item.is_none()
            && self.loan_date.is_none()
            && self.due_date.is_none()
            && self.memo.is_none()
            && self.status.is_none()
    }

    /// Apply the patch to an in-memory copy of a memo, bumping its version.
    pub fn apply_to(&self, memo: &mut Memo) {
        if let Some(ref v) = self.lent_by_name {
            memo.lent_by_name = v.clone();
        }
        if let Some(ref v) = self.borrowed_by_name {
            memo.borrowed_by_name = v.clone();
        }
        if let Some(ref v) = self.amount_or_item {
            memo.amount_or_item = v.clone();
        }
        if let Some(v) = self.loan_date {
            memo.loan_date = v;
        }
        if let Some(v) = self.due_date {
            memo.due_date = v;
        }
        if let Some(ref v) = self.memo {
            memo.memo = v.clone();
        }
        if let Some(v) = self.status {
            memo.status = v;
        }
        memo.updated_at = self.updated_at;
        memo.version += 1;
    }
}
