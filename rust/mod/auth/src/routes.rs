//! Route exemption matching.
//!
//! Rules are parsed once from configuration and consulted in order for
//! every request; the first match exempts it. Patterns support exact
//! literals, a trailing `*` wildcard (any remaining characters, including
//! none), and `[param]` placeholders that consume exactly one non-empty
//! path segment.

/// A configured method+pattern exemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// Uppercased method, or `None` for any method.
    method: Option<String>,
    pattern: String,
}

impl RouteRule {
    /// Parse a rule spec: `"GET:/api/login"`, `"*:/api/health"`, or a bare
    /// `"/api/health"` (any method).
    pub fn parse(spec: &str) -> Self {
        match spec.split_once(':') {
            Some((method, pattern)) if !method.contains('/') => {
                let method = method.trim();
                Self {
                    method: if method.is_empty() || method == "*" {
                        None
                    } else {
                        Some(method.to_ascii_uppercase())
                    },
                    pattern: pattern.trim().to_string(),
                }
            }
            _ => Self { method: None, pattern: spec.trim().to_string() },
        }
    }

    /// Whether this rule matches the given method and bare path (no query
    /// string).
    pub fn matches(&self, method: &str, path: &str) -> bool {
        if let Some(m) = &self.method {
            if !m.eq_ignore_ascii_case(method) {
                return false;
            }
        }
        pattern_matches(&self.pattern, path)
    }
}

/// Parse all configured rule specs, preserving order.
pub fn parse_rules(specs: &[String]) -> Vec<RouteRule> {
    specs.iter().map(|s| RouteRule::parse(s)).collect()
}

/// First-match exemption check. The query string (and fragment) is
/// stripped before matching.
pub fn is_exempt(rules: &[RouteRule], method: &str, path: &str) -> bool {
    let bare = strip_query(path);
    rules.iter().any(|r| r.matches(method, bare))
}

/// Drop `?query` and `#fragment` from a request path.
pub fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

fn pattern_matches(pattern: &str, path: &str) -> bool {
    if pattern == path {
        return true;
    }
    if let Some(prefix) = pattern.strip_suffix('*') {
        return path.starts_with(prefix);
    }
    if pattern.contains('[') {
        return segments_match(pattern, path);
    }
    false
}

/// Segment-wise match: `[param]` consumes exactly one non-empty segment,
/// static segments must match literally, and segment counts must agree.
fn segments_match(pattern: &str, path: &str) -> bool {
    let pattern_segments: Vec<&str> = pattern.split('/').collect();
    let path_segments: Vec<&str> = path.split('/').collect();
    if pattern_segments.len() != path_segments.len() {
        return false;
    }
    pattern_segments.iter().zip(&path_segments).all(|(p, s)| {
        if p.starts_with('[') && p.ends_with(']') && p.len() > 2 {
            !s.is_empty()
        } else {
            p == s
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(specs: &[&str]) -> Vec<RouteRule> {
        parse_rules(&specs.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    #[test]
    fn exact_literal_with_method() {
        let r = rules(&["POST:/api/auth/login"]);
        assert!(is_exempt(&r, "POST", "/api/auth/login"));
        assert!(is_exempt(&r, "post", "/api/auth/login"));
        assert!(!is_exempt(&r, "GET", "/api/auth/login"));
        assert!(!is_exempt(&r, "POST", "/api/auth/login/extra"));
    }

    #[test]
    fn bare_pattern_matches_any_method() {
        let r = rules(&["/api/health", "*:/api/version"]);
        assert!(is_exempt(&r, "GET", "/api/health"));
        assert!(is_exempt(&r, "DELETE", "/api/health"));
        assert!(is_exempt(&r, "PUT", "/api/version"));
    }

    #[test]
    fn query_string_is_ignored() {
        let r = rules(&["GET:/api/orders/[id]"]);
        assert!(is_exempt(&r, "GET", "/api/orders/12?x=1"));
        assert!(is_exempt(&r, "GET", "/api/orders/12#frag"));
    }

    #[test]
    fn placeholder_consumes_exactly_one_segment() {
        let r = rules(&["GET:/api/orders/[id]"]);
        assert!(is_exempt(&r, "GET", "/api/orders/12"));
        assert!(is_exempt(&r, "GET", "/api/orders/abc-def"));
        assert!(!is_exempt(&r, "GET", "/api/orders/12/items"));
        assert!(!is_exempt(&r, "GET", "/api/orders/"));
        assert!(!is_exempt(&r, "POST", "/api/orders/12"));
    }

    #[test]
    fn placeholders_mix_with_statics() {
        let r = rules(&["GET:/api/users/[id]/posts/[post]"]);
        assert!(is_exempt(&r, "GET", "/api/users/7/posts/42"));
        assert!(!is_exempt(&r, "GET", "/api/users/7/comments/42"));
        assert!(!is_exempt(&r, "GET", "/api/users/7/posts"));
    }

    #[test]
    fn trailing_wildcard_is_prefix_match() {
        let r = rules(&["GET:/api/public/*"]);
        assert!(is_exempt(&r, "GET", "/api/public/"));
        assert!(is_exempt(&r, "GET", "/api/public/docs/readme"));
        assert!(!is_exempt(&r, "GET", "/api/publicx"));

        let r = rules(&["/api/docs*"]);
        assert!(is_exempt(&r, "GET", "/api/docs"));
        assert!(is_exempt(&r, "GET", "/api/docs/v2"));
    }

    #[test]
    fn first_match_wins_in_configured_order() {
        let r = rules(&["GET:/api/a/*", "POST:/api/a/b"]);
        assert!(is_exempt(&r, "GET", "/api/a/b"));
        assert!(is_exempt(&r, "POST", "/api/a/b"));
        assert!(!is_exempt(&r, "DELETE", "/api/a/b"));
    }

    #[test]
    fn no_rules_exempts_nothing() {
        assert!(!is_exempt(&[], "GET", "/api/anything"));
    }
}
