//! Path normalization for redirect sources.
//!
//! All normalization is purely string-based: no percent-decoding, no `.`/`..`
//! resolution, no filesystem access.

/// Characters a redirect source may never contain (whitespace is also rejected).
pub const INVALID_PATH_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// Normalize a redirect path into its canonical form.
///
/// Rules:
/// - repeated slashes are collapsed to one
/// - trailing slashes are removed unless the path is the root `/`
///
/// `normalize_path(normalize_path(x)) == normalize_path(x)` for every `x`.
pub fn normalize_path(path: &str) -> String {
    if path == "/" {
        return path.to_string();
    }

    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        // Only slashes: collapse to root.
        return if path.is_empty() {
            String::new()
        } else {
            "/".to_string()
        };
    }

    let mut out = String::with_capacity(trimmed.len());
    let mut prev_slash = false;
    for ch in trimmed.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }
    out
}

/// Returns `false` if the path contains whitespace or any of
/// [`INVALID_PATH_CHARS`].
pub fn is_valid_path(path: &str) -> bool {
    !path
        .chars()
        .any(|c| c.is_whitespace() || INVALID_PATH_CHARS.contains(&c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_unchanged() {
        assert_eq!(normalize_path("/"), "/");
    }

    #[test]
    fn test_collapse_and_trim() {
        assert_eq!(normalize_path("//blog///post/"), "/blog/post");
        assert_eq!(normalize_path("/blog/post///"), "/blog/post");
        assert_eq!(normalize_path("/already/clean"), "/already/clean");
        assert_eq!(normalize_path("///"), "/");
        assert_eq!(normalize_path(""), "");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "/",
            "",
            "//",
            "/a//b/",
            "relative//path/",
            "/x/y/z",
            "////deep////nested////",
        ];
        for input in inputs {
            let once = normalize_path(input);
            assert_eq!(normalize_path(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_invalid_chars() {
        assert!(is_valid_path("/blog/hello-world"));
        assert!(is_valid_path("/nl/onderwerpen/rust_2024"));
        for bad in ["/a b", "/a\tb", "/a<b", "/a>b", "/a:b", "/a\"b", "/a|b", "/a?b", "/a*b"] {
            assert!(!is_valid_path(bad), "{:?} should be invalid", bad);
        }
    }
}
