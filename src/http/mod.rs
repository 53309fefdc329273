//! HTTP Layer
//!
//! TigerStyle: Thin axum glue over the storage contract.
//!
//! ```text
//! request ─► handler ─► validate ─► StorageBackend ─► Envelope ─► response
//!                  └──────────── ApiError ◄──────────────┘
//! ```
//!
//! Handlers never inspect error text: [`StorageError`](crate::StorageError)
//! variants map to status codes in [`ApiError`].

mod error;
mod handlers;
mod response;
mod router;
mod server;
mod state;

pub use error::ApiError;
pub use response::{Envelope, Status};
pub use router::router;
pub use server::{serve, shutdown_signal};
pub use state::AppState;
