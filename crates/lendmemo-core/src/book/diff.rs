//! Request validation and field-level diffing.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;

use crate::error::{LendError, LendResult};
use crate::types::{
    ChangeSet, CreateMemoRequest, FieldChange, HistoryAction, Memo, MemoPatch, MemoStatus,
    UpdateMemoRequest,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A validated creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemo {
    pub lent_by_name: String,
    pub borrowed_by_name: String,
    pub amount_or_item: String,
    pub loan_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub memo: Option<String>,
}

impl NewMemo {
    /// Turn into an active, first-version memo.
    pub fn into_memo(self, id: String, now: DateTime<Utc>) -> Memo {
        Memo {
            id,
            lent_by_name: self.lent_by_name,
            borrowed_by_name: self.borrowed_by_name,
            amount_or_item: self.amount_or_item,
            loan_date: self.loan_date,
            due_date: self.due_date,
            memo: self.memo,
            status: MemoStatus::Active,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }
}

impl TryFrom<CreateMemoRequest> for NewMemo {
    type Error = LendError;

    fn try_from(request: CreateMemoRequest) -> LendResult<Self> {
        let lent_by_name = required_text("lentByName", request.lent_by_name)?;
        let borrowed_by_name = required_text("borrowedByName", request.borrowed_by_name)?;
        let amount_or_item = required_text("amountOrItem", request.amount_or_item)?;
        let loan_date = required_text("loanDate", request.loan_date)?;

        Ok(Self {
            lent_by_name,
            borrowed_by_name,
            amount_or_item,
            loan_date: parse_date("loanDate", &loan_date)?,
            due_date: optional_text(request.due_date)
                .map(|raw| parse_date("dueDate", &raw))
                .transpose()?,
            memo: optional_text(request.memo),
        })
    }
}

/// A validated update request.
///
/// Required text fields are `None` when absent or blank: a blank value
/// cannot erase a required field, it simply does not take part in the diff.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoUpdate {
    pub editor_name: String,
    pub lent_by_name: Option<String>,
    pub borrowed_by_name: Option<String>,
    pub amount_or_item: Option<String>,
    pub loan_date: Option<NaiveDate>,
    pub due_date: Option<Option<NaiveDate>>,
    pub memo: Option<Option<String>>,
    pub status: Option<MemoStatus>,
    pub expected_version: Option<i64>,
}

impl TryFrom<UpdateMemoRequest> for MemoUpdate {
    type Error = LendError;

    fn try_from(request: UpdateMemoRequest) -> LendResult<Self> {
        let editor_name = required_text("editorName", request.editor_name)?;

        let loan_date = optional_text(request.loan_date)
            .map(|raw| parse_date("loanDate", &raw))
            .transpose()?;
        let due_date = request
            .due_date
            .map(|inner| {
                optional_text(inner)
                    .map(|raw| parse_date("dueDate", &raw))
                    .transpose()
            })
            .transpose()?;

        Ok(Self {
            editor_name,
            lent_by_name: optional_text(request.lent_by_name),
            borrowed_by_name: optional_text(request.borrowed_by_name),
            amount_or_item: optional_text(request.amount_or_item),
            loan_date,
            due_date,
            memo: request.memo.map(optional_text),
            status: request.status,
            expected_version: request.expected_version,
        })
    }
}

/// Result of comparing an update against the stored memo.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoDiff {
    pub changes: ChangeSet,
    pub patch: MemoPatch,
    returned: bool,
}

impl MemoDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// `Returned` when this diff moves the status to returned, else `Edited`.
    pub fn action(&self) -> HistoryAction {
        if self.returned {
            HistoryAction::Returned
        } else {
            HistoryAction::Edited
        }
    }
}

impl MemoUpdate {
    /// Compare against `current` and collect every field that would change.
    pub fn diff(&self, current: &Memo, now: DateTime<Utc>) -> MemoDiff {
        let mut changes = ChangeSet::new();
        let mut patch = MemoPatch::new(now);

        patch.lent_by_name = diff_field(
            &mut changes,
            "lentByName",
            &current.lent_by_name,
            self.lent_by_name.as_ref(),
            text_value,
        );
        patch.borrowed_by_name = diff_field(
            &mut changes,
            "borrowedByName",
            &current.borrowed_by_name,
            self.borrowed_by_name.as_ref(),
            text_value,
        );
        patch.amount_or_item = diff_field(
            &mut changes,
            "amountOrItem",
            &current.amount_or_item,
            self.amount_or_item.as_ref(),
            text_value,
        );
        patch.loan_date = diff_field(
            &mut changes,
            "loanDate",
            &current.loan_date,
            self.loan_date.as_ref(),
            date_value,
        );
        patch.due_date = diff_field(
            &mut changes,
            "dueDate",
            &current.due_date,
            self.due_date.as_ref(),
            optional_date_value,
        );
        patch.memo = diff_field(
            &mut changes,
            "memo",
            &current.memo,
            self.memo.as_ref(),
            optional_text_value,
        );
        patch.status = diff_field(
            &mut changes,
            "status",
            &current.status,
            self.status.as_ref(),
            status_value,
        );

        let returned = patch.status == Some(MemoStatus::Returned);
        MemoDiff {
            changes,
            patch,
            returned,
        }
    }
}

/// Record `{from, to}` when `requested` is present and differs from `current`.
///
/// Returns the new value to persist, if any.
fn diff_field<T>(
    changes: &mut ChangeSet,
    name: &str,
    current: &T,
    requested: Option<&T>,
    to_value: fn(&T) -> Value,
) -> Option<T>
where
    T: PartialEq + Clone,
{
    let requested = requested.filter(|value| *value != current)?;
    changes.insert(
        name.to_string(),
        FieldChange::new(to_value(current), to_value(requested)),
    );
    Some(requested.clone())
}

fn text_value(value: &String) -> Value {
    Value::String(value.clone())
}

fn date_value(value: &NaiveDate) -> Value {
    Value::String(value.format(DATE_FORMAT).to_string())
}

fn optional_date_value(value: &Option<NaiveDate>) -> Value {
    value.as_ref().map_or(Value::Null, date_value)
}

fn optional_text_value(value: &Option<String>) -> Value {
    value.as_ref().map_or(Value::Null, text_value)
}

fn status_value(value: &MemoStatus) -> Value {
    Value::String(value.to_string())
}

fn required_text(field: &str, value: Option<String>) -> LendResult<String> {
    optional_text(value).ok_or_else(|| LendError::missing_field(field))
}

/// Trim; blank counts as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_date(field: &str, value: &str) -> LendResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|_| LendError::invalid_format(field, format!("'{}' is not a YYYY-MM-DD date", value)))
}
