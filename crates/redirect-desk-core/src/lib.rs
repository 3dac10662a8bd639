//! # Redirect Desk Core
//!
//! Shared, storage-agnostic logic for Redirect Desk: the redirect data model,
//! path normalization, validation, destination resolution, redirect-chain
//! analysis, and the table controller that projects and mutates the
//! analyzed set.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Storage is reached
//! only through the [`store::RedirectStore`] trait.
//!
//! ## Data Flow
//!
//! ```text
//! fetch_all ──▶ resolve ──▶ analyze ──▶ filter/sort ──▶ mutate ──▶ fetch_all
//! (store)      (resolve)   (analyze)    (table)        (actions)
//! ```

pub mod actions;
pub mod analyze;
pub mod error;
pub mod models;
pub mod normalize;
pub mod resolve;
pub mod store;
pub mod table;
pub mod validate;

pub use actions::{RedirectActions, RemoteOutcome};
pub use analyze::{analyze, AnalyzedRedirect, MAX_CHAIN_LENGTH};
pub use error::RedirectError;
pub use models::{
    ContentDocument, DestinationSnapshot, DestinationType, Redirect, RedirectDraft, RedirectType,
};
pub use resolve::{Locales, Resolution, Resolver};
pub use store::RedirectStore;
pub use table::RedirectTable;
pub use validate::ValidationResult;
