//! # Redirect Desk
//!
//! A local-first redirect manager for CMS content. Editors keep URL redirects
//! (source path → content document or external URL) in a SQLite database;
//! Redirect Desk validates them, resolves internal destinations to public
//! paths, and flags redirect chains, cycles, and broken destinations.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────────────────────┐   ┌──────────┐
//! │  SQLite  │──▶│ redirect-desk-core            │──▶│   CLI    │
//! │  store   │   │ resolve → analyze → table     │   │  (rdx)   │
//! └──────────┘◀──│ validate, optimistic actions  │──▶│  HTTP    │
//!                └──────────────────────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rdx init
//! rdx content add post-1 --type post --slug hello --language en
//! rdx add /old-hello --content post-1
//! rdx add /promo --url https://example.com/sale --temporary
//! rdx list --sort source
//! rdx check --strict
//! rdx serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite [`RedirectStore`](redirect_desk_core::RedirectStore) |
//! | [`desk`] | Validated writes over the table controller |
//! | [`list`] | `rdx list` and `rdx check` |
//! | [`edit`] | `rdx add`, `edit`, `enable`, `disable`, `delete`, `validate` |
//! | [`content`] | `rdx content` |
//! | [`server`] | Admin HTTP API |
//! | [`logging`] | `tracing` subscriber setup |

pub mod config;
pub mod content;
pub mod db;
pub mod desk;
pub mod edit;
pub mod list;
pub mod logging;
pub mod migrate;
pub mod server;
pub mod sqlite_store;
