//! lendmemo-core - Core library for lendmemo.
//!
//! This crate provides the memo types, the storage abstraction with its
//! SQLite implementation, and [`MemoBook`], which runs the create / fetch /
//! audited-update flows.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use lendmemo_core::{CreateMemoRequest, MemoBook, SqliteMemoStore, UpdateMemoRequest, MemoStatus};
//!
//! let book = MemoBook::new(Arc::new(SqliteMemoStore::in_memory()?));
//!
//! // Record a loan
//! let memo = book.create(CreateMemoRequest::new("Aki", "Ben", "5000 yen", "2024-04-01")).await?;
//!
//! // Mark it returned; a `returned` history entry is appended
//! book.update(&memo.id, UpdateMemoRequest::by("Ben").status(MemoStatus::Returned)).await?;
//! ```

pub mod book;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use book::{MemoBook, UpdateOutcome};
pub use config::{LendMemoConfig, LogFormat};
pub use error::{ErrorCode, LendError, LendResult};
pub use store::{MemoStore, SqliteMemoStore};
pub use types::{
    ChangeSet, CreateMemoRequest, CreateMemoResponse, FieldChange, HistoryAction, Memo,
    MemoDetail, MemoHistory, MemoPatch, MemoStatus, MessageResponse, UpdateMemoRequest,
};
