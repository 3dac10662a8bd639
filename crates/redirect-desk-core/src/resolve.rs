//! Destination resolution: content reference + language → public URL path.
//!
//! Resolution is total. When a reference cannot be turned into a path the
//! resolver yields a [`Sentinel`] whose display string stands in for the
//! destination; callers only render it.
//!
//! # Path Shape
//!
//! ```text
//! default locale:   /{segment}/{slug}
//! other locales:    /{locale}/{segment}/{slug}
//! ```
//!
//! `segment` comes from the content type's [`RouteTemplate`] and may be
//! translated per locale (e.g. `contributors` / `medewerkers`), or absent
//! (pages live at the site root).

use std::collections::HashMap;
use std::fmt;

use crate::models::{DestinationSnapshot, DestinationType, Redirect, LANGUAGE_ALL};

pub const NO_DESTINATION: &str = "[No destination selected]";
pub const INVALID_LANGUAGE: &str = "[Invalid language]";
pub const UNKNOWN_CONTENT_TYPE: &str = "[Unknown content type]";

/// Placeholder for a destination that cannot be resolved to a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentinel {
    NoDestination,
    InvalidLanguage,
    UnknownContentType,
}

impl Sentinel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentinel::NoDestination => NO_DESTINATION,
            Sentinel::InvalidLanguage => INVALID_LANGUAGE,
            Sentinel::UnknownContentType => UNKNOWN_CONTENT_TYPE,
        }
    }
}

/// Result of resolving an internal destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Path(String),
    Sentinel(Sentinel),
}

impl Resolution {
    pub fn path(&self) -> Option<&str> {
        match self {
            Resolution::Path(p) => Some(p),
            Resolution::Sentinel(_) => None,
        }
    }

    pub fn into_path(self) -> Option<String> {
        match self {
            Resolution::Path(p) => Some(p),
            Resolution::Sentinel(_) => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Path(p) => f.write_str(p),
            Resolution::Sentinel(s) => f.write_str(s.as_str()),
        }
    }
}

/// The supported locale set. The default locale is served without a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locales {
    default_locale: String,
    locales: Vec<String>,
}

impl Locales {
    /// Builds a locale set. The default locale is added to `locales` if
    /// missing.
    pub fn new(default_locale: impl Into<String>, locales: Vec<String>) -> Self {
        let default_locale = default_locale.into();
        let mut locales = locales;
        if !locales.contains(&default_locale) {
            locales.insert(0, default_locale.clone());
        }
        Self {
            default_locale,
            locales,
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.locales.iter().map(String::as_str)
    }

    /// Whether `language` is a valid redirect language scope
    /// (`"all"` or a supported locale).
    pub fn is_valid_scope(&self, language: &str) -> bool {
        language == LANGUAGE_ALL || self.contains(language)
    }
}

impl Default for Locales {
    fn default() -> Self {
        Self::new("en", vec!["en".to_string(), "nl".to_string()])
    }
}

/// Per-content-type path segment, optionally translated per locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTemplate {
    segment: Option<String>,
    translations: HashMap<String, String>,
}

impl RouteTemplate {
    /// Content lives at the site root: `/{slug}`.
    pub fn root() -> Self {
        Self::default()
    }

    /// Content lives under one segment in every locale.
    pub fn segment(segment: impl Into<String>) -> Self {
        Self {
            segment: Some(segment.into()),
            translations: HashMap::new(),
        }
    }

    /// Override the segment for one locale. An empty segment places the
    /// content at the locale root.
    pub fn translate(mut self, locale: impl Into<String>, segment: impl Into<String>) -> Self {
        self.translations.insert(locale.into(), segment.into());
        self
    }

    fn segment_for(&self, locale: &str) -> Option<&str> {
        self.translations
            .get(locale)
            .map(String::as_str)
            .or(self.segment.as_deref())
            .filter(|s| !s.is_empty())
    }
}

/// Maps internal destinations to public paths.
#[derive(Debug, Clone)]
pub struct Resolver {
    locales: Locales,
    routes: HashMap<String, RouteTemplate>,
}

impl Resolver {
    /// Resolver with the built-in routes for `post`, `author`, `category`,
    /// and `page`.
    pub fn new(locales: Locales) -> Self {
        let mut routes = HashMap::new();
        routes.insert("post".to_string(), RouteTemplate::segment("blog"));
        routes.insert(
            "author".to_string(),
            RouteTemplate::segment("contributors").translate("nl", "medewerkers"),
        );
        routes.insert(
            "category".to_string(),
            RouteTemplate::segment("topics").translate("nl", "onderwerpen"),
        );
        routes.insert("page".to_string(), RouteTemplate::root());
        Self { locales, routes }
    }

    /// Resolver with no routes at all.
    pub fn empty(locales: Locales) -> Self {
        Self {
            locales,
            routes: HashMap::new(),
        }
    }

    /// Register or replace the route for a content type.
    pub fn with_route(mut self, doc_type: impl Into<String>, route: RouteTemplate) -> Self {
        self.routes.insert(doc_type.into(), route);
        self
    }

    /// Merge per-locale segment overrides (`type → locale → segment`) into
    /// the route table, creating routes for unknown types.
    pub fn with_pathnames(mut self, pathnames: &HashMap<String, HashMap<String, String>>) -> Self {
        for (doc_type, per_locale) in pathnames {
            let mut route = self.routes.remove(doc_type).unwrap_or_default();
            for (locale, segment) in per_locale {
                route = route.translate(locale.clone(), segment.trim_matches('/').to_string());
            }
            self.routes.insert(doc_type.clone(), route);
        }
        self
    }

    pub fn locales(&self) -> &Locales {
        &self.locales
    }

    /// Resolve a destination snapshot to a public path or a sentinel.
    pub fn resolve(&self, dest: &DestinationSnapshot) -> Resolution {
        let slug = match dest.slug.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => return Resolution::Sentinel(Sentinel::NoDestination),
        };

        let lang = dest
            .language
            .as_deref()
            .unwrap_or_else(|| self.locales.default_locale());
        if !self.locales.contains(lang) {
            return Resolution::Sentinel(Sentinel::InvalidLanguage);
        }

        let route = match self.routes.get(&dest.doc_type) {
            Some(r) => r,
            None => return Resolution::Sentinel(Sentinel::UnknownContentType),
        };

        let mut path = String::new();
        if lang != self.locales.default_locale() {
            path.push('/');
            path.push_str(lang);
        }
        if let Some(segment) = route.segment_for(lang) {
            path.push('/');
            path.push_str(segment);
        }
        path.push('/');
        path.push_str(slug);
        Resolution::Path(path)
    }

    /// Display form of an internal destination; never fails.
    pub fn resolve_internal_url(&self, dest: Option<&DestinationSnapshot>) -> String {
        match dest {
            Some(d) => self.resolve(d).to_string(),
            None => NO_DESTINATION.to_string(),
        }
    }

    /// The concrete target of a redirect: its external URL, or the resolved
    /// path of its internal destination. `None` when there is nothing to
    /// follow (missing URL, broken reference, or a sentinel).
    pub fn target_of(&self, redirect: &Redirect) -> Option<String> {
        match redirect.destination_type {
            DestinationType::External => redirect
                .external_destination
                .clone()
                .filter(|u| !u.is_empty()),
            DestinationType::Internal => redirect
                .internal_destination
                .as_ref()
                .and_then(|d| self.resolve(d).into_path()),
        }
    }

    /// Display string for a redirect's destination.
    pub fn display_destination(&self, redirect: &Redirect) -> String {
        match redirect.destination_type {
            DestinationType::External => redirect
                .external_destination
                .clone()
                .filter(|u| !u.is_empty())
                .unwrap_or_else(|| NO_DESTINATION.to_string()),
            DestinationType::Internal => {
                self.resolve_internal_url(redirect.internal_destination.as_ref())
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(Locales::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(doc_type: &str, slug: Option<&str>, lang: Option<&str>) -> DestinationSnapshot {
        DestinationSnapshot {
            doc_type: doc_type.to_string(),
            id: "doc".to_string(),
            slug: slug.map(str::to_string),
            language: lang.map(str::to_string),
        }
    }

    #[test]
    fn test_post_in_primary_and_secondary_locale() {
        let r = Resolver::default();
        assert_eq!(
            r.resolve(&snap("post", Some("hello"), Some("en"))),
            Resolution::Path("/blog/hello".to_string())
        );
        assert_eq!(
            r.resolve(&snap("post", Some("hello"), Some("nl"))),
            Resolution::Path("/nl/blog/hello".to_string())
        );
    }

    #[test]
    fn test_translated_segments() {
        let r = Resolver::default();
        assert_eq!(
            r.resolve(&snap("author", Some("jan"), Some("en"))).to_string(),
            "/contributors/jan"
        );
        assert_eq!(
            r.resolve(&snap("author", Some("jan"), Some("nl"))).to_string(),
            "/nl/medewerkers/jan"
        );
        assert_eq!(
            r.resolve(&snap("category", Some("rust"), Some("nl"))).to_string(),
            "/nl/onderwerpen/rust"
        );
        assert_eq!(
            r.resolve(&snap("page", Some("about"), Some("en"))).to_string(),
            "/about"
        );
        assert_eq!(
            r.resolve(&snap("page", Some("over"), Some("nl"))).to_string(),
            "/nl/over"
        );
    }

    #[test]
    fn test_missing_language_uses_default_locale() {
        let r = Resolver::default();
        assert_eq!(
            r.resolve(&snap("category", Some("rust"), None)).to_string(),
            "/topics/rust"
        );
    }

    #[test]
    fn test_sentinels() {
        let r = Resolver::default();
        assert_eq!(r.resolve(&snap("post", None, Some("en"))).to_string(), NO_DESTINATION);
        assert_eq!(r.resolve(&snap("post", Some(""), Some("en"))).to_string(), NO_DESTINATION);
        assert_eq!(
            r.resolve(&snap("post", Some("hello"), Some("de"))).to_string(),
            INVALID_LANGUAGE
        );
        assert_eq!(
            r.resolve(&snap("recipe", Some("soup"), Some("en"))).to_string(),
            UNKNOWN_CONTENT_TYPE
        );
        assert_eq!(r.resolve_internal_url(None), NO_DESTINATION);
    }

    #[test]
    fn test_pathname_overrides() {
        let mut pathnames = HashMap::new();
        pathnames.insert(
            "author".to_string(),
            HashMap::from([("nl".to_string(), "auteurs".to_string())]),
        );
        pathnames.insert(
            "recipe".to_string(),
            HashMap::from([
                ("en".to_string(), "/recipes/".to_string()),
                ("nl".to_string(), "recepten".to_string()),
            ]),
        );
        let r = Resolver::default().with_pathnames(&pathnames);
        assert_eq!(
            r.resolve(&snap("author", Some("jan"), Some("nl"))).to_string(),
            "/nl/auteurs/jan"
        );
        assert_eq!(
            r.resolve(&snap("author", Some("jan"), Some("en"))).to_string(),
            "/contributors/jan"
        );
        assert_eq!(
            r.resolve(&snap("recipe", Some("soup"), Some("en"))).to_string(),
            "/recipes/soup"
        );
        assert_eq!(
            r.resolve(&snap("recipe", Some("soep"), Some("nl"))).to_string(),
            "/nl/recepten/soep"
        );
    }

    #[test]
    fn test_locales_scope() {
        let l = Locales::new("de", vec!["fr".to_string()]);
        assert!(l.contains("de"));
        assert!(l.is_valid_scope("all"));
        assert!(l.is_valid_scope("fr"));
        assert!(!l.is_valid_scope("en"));
    }
}
