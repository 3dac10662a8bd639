//! Redirect-graph analysis.
//!
//! Given the full redirect set, every redirect is annotated with the chain of
//! redirects it would trigger and whether its internal destination is broken.
//!
//! # Algorithm
//!
//! 1. Build `dest[source] = target` for every redirect (later duplicates
//!    overwrite earlier ones). A redirect without a followable target (broken
//!    reference, sentinel, missing URL) maps to nothing: a dead end.
//! 2. For each redirect, start the chain at its own source and follow
//!    `dest` while the current target is a known source and the chain holds
//!    fewer than [`MAX_CHAIN_LENGTH`] entries.
//! 3. Attach the chain only when it has more than one entry.
//!
//! The map is built once per pass and never changes during the walks.
//! The length cap bounds cyclic chains; a separate visited set marks walks
//! that revisit a source ([`AnalyzedRedirect::chain_cycles`]) without
//! changing the reported chain.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::models::Redirect;
use crate::resolve::Resolver;

/// Maximum number of sources recorded in a redirect chain.
pub const MAX_CHAIN_LENGTH: usize = 10;

/// A redirect plus the annotations derived from the whole set.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyzedRedirect {
    #[serde(flatten)]
    pub redirect: Redirect,
    /// Display string for the destination (URL, path, or sentinel).
    pub resolved_destination: String,
    /// The followable target, if any. Used for chain walking, search, and sort.
    #[serde(skip)]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_chain: Option<Vec<String>>,
    pub broken_destination: bool,
    pub chain_cycles: bool,
}

impl AnalyzedRedirect {
    /// A chain or a broken destination.
    pub fn has_issues(&self) -> bool {
        self.redirect_chain.is_some() || self.broken_destination
    }

    pub fn id(&self) -> &str {
        &self.redirect.id
    }
}

struct ChainWalk {
    chain: Vec<String>,
    cycles: bool,
}

fn walk_chain<'a>(
    start: &'a str,
    first: Option<&'a str>,
    dest: &HashMap<&'a str, Option<&'a str>>,
) -> ChainWalk {
    let mut chain = vec![start.to_string()];
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(start);
    let mut cycles = false;

    let mut current = first;
    while let Some(cur) = current {
        let next = match dest.get(cur) {
            Some(next) => *next,
            None => break,
        };
        if chain.len() >= MAX_CHAIN_LENGTH {
            break;
        }
        if !visited.insert(cur) {
            cycles = true;
        }
        chain.push(cur.to_string());
        current = next;
    }

    ChainWalk { chain, cycles }
}

/// Annotate every redirect with its chain and breakage.
///
/// Output order matches input order.
pub fn analyze(redirects: Vec<Redirect>, resolver: &Resolver) -> Vec<AnalyzedRedirect> {
    let targets: Vec<Option<String>> = redirects.iter().map(|r| resolver.target_of(r)).collect();

    let walks: Vec<ChainWalk> = {
        let mut dest: HashMap<&str, Option<&str>> = HashMap::with_capacity(redirects.len());
        for (r, target) in redirects.iter().zip(targets.iter()) {
            dest.insert(r.source.as_str(), target.as_deref());
        }

        redirects
            .iter()
            .zip(targets.iter())
            .map(|(r, target)| walk_chain(&r.source, target.as_deref(), &dest))
            .collect()
    };

    redirects
        .into_iter()
        .zip(targets)
        .zip(walks)
        .map(|((redirect, target), walk)| {
            let resolved_destination = resolver.display_destination(&redirect);
            let broken_destination = redirect.is_broken();
            let redirect_chain = if walk.chain.len() > 1 {
                Some(walk.chain)
            } else {
                None
            };
            AnalyzedRedirect {
                redirect,
                resolved_destination,
                target,
                redirect_chain,
                broken_destination,
                chain_cycles: walk.cycles,
            }
        })
        .collect()
}

/// Counts over an analyzed set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub chained: usize,
    pub broken: usize,
    pub cyclic: usize,
    /// Rows with a chain or a broken destination.
    pub with_issues: usize,
}

pub fn summarize(rows: &[AnalyzedRedirect]) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        total: rows.len(),
        ..AnalysisSummary::default()
    };
    for row in rows {
        if row.redirect.is_active {
            summary.active += 1;
        } else {
            summary.inactive += 1;
        }
        if row.redirect_chain.is_some() {
            summary.chained += 1;
        }
        if row.broken_destination {
            summary.broken += 1;
        }
        if row.chain_cycles {
            summary.cyclic += 1;
        }
        if row.has_issues() {
            summary.with_issues += 1;
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DestinationSnapshot, DestinationType, RedirectType};
    use chrono::Utc;

    fn external(id: &str, source: &str, url: &str) -> Redirect {
        let now = Utc::now();
        Redirect {
            id: id.to_string(),
            source: source.to_string(),
            destination_type: DestinationType::External,
            internal_ref: None,
            internal_destination: None,
            external_destination: Some(url.to_string()),
            redirect_type: RedirectType::Permanent,
            is_active: true,
            language: "all".to_string(),
            preserve_query_string: false,
            notes: None,
            last_tested_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn internal(id: &str, source: &str, snapshot: Option<(&str, &str)>) -> Redirect {
        let mut r = external(id, source, "");
        r.destination_type = DestinationType::Internal;
        r.external_destination = None;
        r.internal_ref = Some(format!("doc-{}", id));
        r.internal_destination = snapshot.map(|(doc_type, slug)| DestinationSnapshot {
            doc_type: doc_type.to_string(),
            id: format!("doc-{}", id),
            slug: Some(slug.to_string()),
            language: Some("en".to_string()),
        });
        r
    }

    #[test]
    fn test_no_shared_paths_no_chains() {
        let rows = analyze(
            vec![
                external("1", "/a", "https://a.example.com"),
                external("2", "/b", "https://b.example.com"),
                internal("3", "/c", Some(("page", "target"))),
            ],
            &Resolver::default(),
        );
        assert!(rows.iter().all(|r| r.redirect_chain.is_none()));
        assert!(rows.iter().all(|r| !r.has_issues()));
    }

    #[test]
    fn test_simple_chain_through_internal_path() {
        // /old → page "new" (/new), /new → https://...
        let rows = analyze(
            vec![
                internal("1", "/old", Some(("page", "new"))),
                external("2", "/new", "https://example.com"),
            ],
            &Resolver::default(),
        );
        assert_eq!(
            rows[0].redirect_chain,
            Some(vec!["/old".to_string(), "/new".to_string()])
        );
        assert_eq!(rows[0].resolved_destination, "/new");
        assert!(!rows[0].chain_cycles);
        assert!(rows[1].redirect_chain.is_none());
    }

    #[test]
    fn test_two_node_cycle_capped_at_ten() {
        let rows = analyze(
            vec![external("1", "/a", "/b"), external("2", "/b", "/a")],
            &Resolver::default(),
        );
        let expected_a: Vec<String> = (0..10)
            .map(|i| if i % 2 == 0 { "/a" } else { "/b" }.to_string())
            .collect();
        let expected_b: Vec<String> = (0..10)
            .map(|i| if i % 2 == 0 { "/b" } else { "/a" }.to_string())
            .collect();
        assert_eq!(rows[0].redirect_chain.as_ref(), Some(&expected_a));
        assert_eq!(rows[1].redirect_chain.as_ref(), Some(&expected_b));
        assert!(rows[0].chain_cycles && rows[1].chain_cycles);
    }

    #[test]
    fn test_long_chain_never_exceeds_cap() {
        let redirects: Vec<Redirect> = (0..25)
            .map(|i| external(&i.to_string(), &format!("/p{}", i), &format!("/p{}", i + 1)))
            .collect();
        let rows = analyze(redirects, &Resolver::default());
        for row in &rows {
            if let Some(chain) = &row.redirect_chain {
                assert!(chain.len() <= MAX_CHAIN_LENGTH);
            }
            assert!(!row.chain_cycles);
        }
        assert_eq!(rows[0].redirect_chain.as_ref().unwrap().len(), MAX_CHAIN_LENGTH);
        // /p24 → /p25, which is not a source.
        assert!(rows[24].redirect_chain.is_none());
        assert_eq!(rows[23].redirect_chain.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_broken_destination_is_dead_end() {
        let rows = analyze(
            vec![
                external("1", "/start", "/broken"),
                internal("2", "/broken", None),
            ],
            &Resolver::default(),
        );
        assert!(rows[1].broken_destination);
        assert!(rows[1].redirect_chain.is_none());
        assert_eq!(rows[1].resolved_destination, crate::resolve::NO_DESTINATION);
        assert_eq!(
            rows[0].redirect_chain,
            Some(vec!["/start".to_string(), "/broken".to_string()])
        );
        assert!(!rows[0].broken_destination);
    }

    #[test]
    fn test_sentinel_destination_not_followed() {
        // Unknown content type resolves to a sentinel, never to a source.
        let rows = analyze(
            vec![internal("1", "/x", Some(("recipe", "soup")))],
            &Resolver::default(),
        );
        assert_eq!(rows[0].target, None);
        assert!(!rows[0].broken_destination);
        assert_eq!(rows[0].resolved_destination, crate::resolve::UNKNOWN_CONTENT_TYPE);
    }

    #[test]
    fn test_self_loop() {
        let rows = analyze(vec![external("1", "/loop", "/loop")], &Resolver::default());
        let chain = rows[0].redirect_chain.as_ref().unwrap();
        assert_eq!(chain.len(), MAX_CHAIN_LENGTH);
        assert!(chain.iter().all(|s| s == "/loop"));
        assert!(rows[0].chain_cycles);
    }

    #[test]
    fn test_summary_counts() {
        let mut inactive = external("3", "/c", "https://c.example.com");
        inactive.is_active = false;
        let rows = analyze(
            vec![
                external("1", "/a", "/b"),
                external("2", "/b", "/a"),
                inactive,
                internal("4", "/d", None),
            ],
            &Resolver::default(),
        );
        let s = summarize(&rows);
        assert_eq!(s.total, 4);
        assert_eq!(s.active, 3);
        assert_eq!(s.inactive, 1);
        assert_eq!(s.chained, 2);
        assert_eq!(s.broken, 1);
        assert_eq!(s.cyclic, 2);
        assert_eq!(s.with_issues, 3);
    }
}
