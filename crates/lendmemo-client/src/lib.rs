//! lendmemo-client - HTTP client for the lendmemo REST API.
//!
//! # Example
//!
//! ```ignore
//! use lendmemo_client::MemoClient;
//! use lendmemo_core::{CreateMemoRequest, UpdateMemoRequest};
//!
//! let client = MemoClient::new("http://localhost:8080");
//!
//! // Record a loan
//! let created = client
//!     .create_memo(&CreateMemoRequest::new("Aki", "Ben", "5000 yen", "2024-04-01"))
//!     .await?;
//!
//! // Edit it, then read back the history
//! client
//!     .update_memo(&created.id, &UpdateMemoRequest::by("Ben").amount_or_item("6000 yen"))
//!     .await?;
//! let detail = client.get_memo(&created.id).await?;
//! ```

mod client;

pub use client::{HealthResponse, MemoClient, DEFAULT_BASE_URL};
pub use lendmemo_core::types::{MemoDetail, MemoHistory};
