//! # Redirect Desk CLI (`rdx`)
//!
//! ## Usage
//!
//! ```bash
//! rdx --config ./config/rdx.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `rdx init` | Create the SQLite database and run schema migrations |
//! | `rdx list` | Show the redirect table (filter, search, sort) |
//! | `rdx add <source>` | Create a redirect |
//! | `rdx edit <id>` | Change fields of a redirect |
//! | `rdx enable <id>` / `rdx disable <id>` | Toggle a redirect |
//! | `rdx delete <id>` | Delete a redirect |
//! | `rdx check` | Report chains, cycles, and broken destinations |
//! | `rdx validate <source>` | Validate a source path |
//! | `rdx content add/list/remove` | Manage content documents |
//! | `rdx serve` | Start the admin HTTP API |
//!
//! ## Examples
//!
//! ```bash
//! rdx init --config ./config/rdx.toml
//! rdx add /old-pricing --url https://example.com/pricing --temporary
//! rdx list --filter issues --sort source
//! rdx check --strict
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use redirect_desk::edit::DraftChanges;
use redirect_desk::list::ListOptions;
use redirect_desk::{config, content, edit, list, logging, migrate, server};
use redirect_desk_core::models::RedirectType;
use redirect_desk_core::table::{SortDirection, SortField, StatusFilter};
use redirect_desk_core::ContentDocument;

/// Redirect Desk: manage CMS redirects and find chains and broken
/// destinations before visitors do.
#[derive(Parser)]
#[command(
    name = "rdx",
    about = "Redirect Desk: a local-first redirect manager for CMS content",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/rdx.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Idempotent: running it multiple times is safe.
    Init,

    /// Show the redirect table.
    List {
        /// Status filter: `all`, `active`, `inactive`, or `issues`.
        #[arg(long, default_value = "all")]
        filter: StatusFilter,

        /// Only redirects to content of this type (`all` for every type).
        #[arg(long)]
        content_type: Option<String>,

        /// Case-insensitive substring of the source or resolved destination.
        #[arg(long)]
        search: Option<String>,

        /// Sort key: `created`, `source`, `destination`, `type`, `language`.
        #[arg(long)]
        sort: Option<SortField>,

        /// Sort ascending.
        #[arg(long, conflicts_with = "desc")]
        asc: bool,

        /// Sort descending.
        #[arg(long)]
        desc: bool,

        /// Print the view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Create a redirect.
    Add {
        /// Source path, e.g. `/old-page`.
        source: String,

        #[command(flatten)]
        destination: DestinationArgs,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Change fields of an existing redirect.
    Edit {
        /// Redirect id.
        id: String,

        /// New source path.
        #[arg(long)]
        source: Option<String>,

        #[command(flatten)]
        destination: DestinationArgs,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Activate a redirect.
    Enable { id: String },

    /// Deactivate a redirect. Inactive redirects are kept.
    Disable { id: String },

    /// Delete a redirect.
    Delete { id: String },

    /// Report redirect chains, cycles, and broken internal destinations.
    Check {
        /// Exit with an error when any issue is found.
        #[arg(long)]
        strict: bool,
    },

    /// Validate a source path against the stored redirects.
    Validate {
        source: String,

        /// Id of the redirect being edited; its own source is not a duplicate.
        #[arg(long)]
        id: Option<String>,
    },

    /// Manage the content documents internal redirects point at.
    Content {
        #[command(subcommand)]
        action: ContentAction,
    },

    /// Start the admin HTTP API on `[server].bind`.
    Serve,
}

#[derive(Args)]
struct DestinationArgs {
    /// External destination URL (http or https).
    #[arg(long, conflicts_with = "content")]
    url: Option<String>,

    /// Id of the content document to redirect to.
    #[arg(long)]
    content: Option<String>,
}

#[derive(Args)]
struct FieldArgs {
    /// Temporary redirect (302).
    #[arg(long, conflicts_with = "permanent")]
    temporary: bool,

    /// Permanent redirect (301).
    #[arg(long)]
    permanent: bool,

    /// Language scope: `all` or a configured locale.
    #[arg(long)]
    language: Option<String>,

    /// Store the redirect as inactive.
    #[arg(long, conflicts_with = "active")]
    inactive: bool,

    /// Store the redirect as active.
    #[arg(long)]
    active: bool,

    /// Forward the query string to the destination.
    #[arg(long, conflicts_with = "no_preserve_query")]
    preserve_query: bool,

    /// Drop the query string.
    #[arg(long)]
    no_preserve_query: bool,

    /// Free-form notes (empty string clears).
    #[arg(long)]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum ContentAction {
    /// Add or replace a content document.
    Add {
        id: String,

        /// Content type, e.g. `post`, `page`, `author`, `category`.
        #[arg(long = "type")]
        doc_type: String,

        #[arg(long)]
        slug: Option<String>,

        #[arg(long)]
        language: Option<String>,
    },
    /// List content documents with their resolved paths.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Remove a content document. Redirects to it become broken.
    Remove { id: String },
}

fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn changes(source: Option<String>, destination: DestinationArgs, fields: FieldArgs) -> DraftChanges {
    let redirect_type = match (fields.temporary, fields.permanent) {
        (true, _) => Some(RedirectType::Temporary),
        (_, true) => Some(RedirectType::Permanent),
        _ => None,
    };
    DraftChanges {
        source,
        url: destination.url,
        content: destination.content,
        redirect_type,
        language: fields.language,
        active: switch(fields.active, fields.inactive),
        preserve_query_string: switch(fields.preserve_query, fields.no_preserve_query),
        notes: fields.notes,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized at {}", cfg.db.path.display());
        }
        Commands::List {
            filter,
            content_type,
            search,
            sort,
            asc,
            desc,
            json,
        } => {
            let direction = if desc {
                Some(SortDirection::Desc)
            } else if asc {
                Some(SortDirection::Asc)
            } else {
                None
            };
            let opts = ListOptions {
                filter,
                content_type,
                search,
                sort,
                direction,
                json,
            };
            list::run_list(&cfg, opts).await?;
        }
        Commands::Add {
            source,
            destination,
            fields,
        } => {
            edit::run_add(&cfg, changes(Some(source), destination, fields)).await?;
        }
        Commands::Edit {
            id,
            source,
            destination,
            fields,
        } => {
            edit::run_edit(&cfg, &id, changes(source, destination, fields)).await?;
        }
        Commands::Enable { id } => {
            edit::run_set_status(&cfg, &id, true).await?;
        }
        Commands::Disable { id } => {
            edit::run_set_status(&cfg, &id, false).await?;
        }
        Commands::Delete { id } => {
            edit::run_delete(&cfg, &id).await?;
        }
        Commands::Check { strict } => {
            list::run_check(&cfg, strict).await?;
        }
        Commands::Validate { source, id } => {
            edit::run_validate(&cfg, &source, id.as_deref()).await?;
        }
        Commands::Content { action } => match action {
            ContentAction::Add {
                id,
                doc_type,
                slug,
                language,
            } => {
                let doc = ContentDocument {
                    id,
                    doc_type,
                    slug,
                    language,
                };
                content::run_content_add(&cfg, doc).await?;
            }
            ContentAction::List { json } => {
                content::run_content_list(&cfg, json).await?;
            }
            ContentAction::Remove { id } => {
                content::run_content_remove(&cfg, &id).await?;
            }
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
