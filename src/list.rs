//! Table views: `rdx list` and `rdx check`.

use anyhow::{bail, Result};

use redirect_desk_core::table::{Sort, SortDirection, SortField, StatusFilter};
use redirect_desk_core::AnalyzedRedirect;

use crate::config::Config;
use crate::desk;

/// Options for `rdx list`.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub filter: StatusFilter,
    pub content_type: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortField>,
    pub direction: Option<SortDirection>,
    pub json: bool,
}

/// Resolve the CLI sort flags. A field without a direction sorts ascending;
/// no flags keep the default (newest first).
pub fn sort_from_flags(field: Option<SortField>, direction: Option<SortDirection>) -> Sort {
    let default = Sort::default();
    match (field, direction) {
        (None, None) => default,
        (None, Some(d)) => Sort::new(default.field, d),
        (Some(f), d) => Sort::new(f, d.unwrap_or(SortDirection::Asc)),
    }
}

fn issue_label(row: &AnalyzedRedirect) -> String {
    let mut labels = Vec::new();
    if row.broken_destination {
        labels.push("broken".to_string());
    }
    if let Some(chain) = &row.redirect_chain {
        labels.push(format!("chain({})", chain.len()));
    }
    if row.chain_cycles {
        labels.push("cycle".to_string());
    }
    labels.join(",")
}

pub async fn run_list(config: &Config, opts: ListOptions) -> Result<()> {
    let mut desk = desk::open(config).await?;

    let table = desk.table_mut();
    table.set_status_filter(opts.filter);
    if let Some(ct) = &opts.content_type {
        table.set_content_type(ct);
    }
    if let Some(search) = opts.search {
        table.set_search(search);
    }
    table.set_sort(sort_from_flags(opts.sort, opts.direction));

    let table = desk.table();
    let view = table.view();

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    if view.is_empty() {
        println!("No redirects.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<32}  {:<40}  {:>4}  {:<4}  {:<8}  {}",
        "ID", "SOURCE", "DESTINATION", "CODE", "LANG", "STATUS", "ISSUES"
    );
    for row in &view {
        let r = &row.redirect;
        println!(
            "{:<36}  {:<32}  {:<40}  {:>4}  {:<4}  {:<8}  {}",
            r.id,
            r.source,
            row.resolved_destination,
            r.redirect_type.status_code(),
            r.language,
            if r.is_active { "active" } else { "inactive" },
            issue_label(row)
        );
    }
    println!();
    println!("{} of {} redirects", view.len(), table.rows().len());

    Ok(())
}

/// Report chains, broken destinations and cycles. With `strict`, any issue
/// makes the command fail.
pub async fn run_check(config: &Config, strict: bool) -> Result<()> {
    let desk = desk::open(config).await?;
    let table = desk.table();
    let summary = table.summary();

    println!(
        "redirects: {} (active {}, inactive {})",
        summary.total, summary.active, summary.inactive
    );
    println!(
        "chained: {}  broken: {}  cyclic: {}",
        summary.chained, summary.broken, summary.cyclic
    );

    let mut issues: Vec<&AnalyzedRedirect> =
        table.rows().iter().filter(|r| r.has_issues()).collect();
    issues.sort_by(|a, b| a.redirect.source.cmp(&b.redirect.source));

    if issues.is_empty() {
        println!("ok");
        return Ok(());
    }

    println!();
    for row in &issues {
        let r = &row.redirect;
        if row.broken_destination {
            println!(
                "  {}  broken internal destination ({})",
                r.source,
                r.internal_ref.as_deref().unwrap_or("no reference")
            );
        }
        if let Some(chain) = &row.redirect_chain {
            let suffix = if row.chain_cycles { "  (cycle)" } else { "" };
            println!("  {}  chain: {}{}", r.source, chain.join(" → "), suffix);
        }
    }

    if strict {
        bail!("{} redirect(s) with issues", summary.with_issues);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_from_flags() {
        assert_eq!(sort_from_flags(None, None), Sort::default());
        assert_eq!(
            sort_from_flags(Some(SortField::Source), None),
            Sort::new(SortField::Source, SortDirection::Asc)
        );
        assert_eq!(
            sort_from_flags(Some(SortField::Language), Some(SortDirection::Desc)),
            Sort::new(SortField::Language, SortDirection::Desc)
        );
        assert_eq!(
            sort_from_flags(None, Some(SortDirection::Asc)),
            Sort::new(SortField::Created, SortDirection::Asc)
        );
    }
}
