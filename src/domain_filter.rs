//! Domain filter shared by the read and the write path
//!
//! A filter is either list based (include/exclude domain suffixes) or regex
//! based (include/exclude expressions). An unconfigured filter matches every
//! name.

use regex::Regex;
use serde::Serialize;

//==============================================================================
// Types
//==============================================================================

/// Predicate restricting which DNS names the provider reads and writes
#[derive(Debug, Clone, Default)]
pub struct DomainFilter {
    include: Vec<String>,
    exclude: Vec<String>,
    regex_include: Option<Regex>,
    regex_exclude: Option<Regex>,
}

/// Wire form served to external-dns during negotiation
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct DomainFilterJson<'a> {
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    include: &'a [String],
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    exclude: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    regex_include: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    regex_exclude: &'a str,
}

//==============================================================================
// Implementation
//==============================================================================

impl DomainFilter {
    /// Builds a list based filter; entries are normalized and blanks dropped.
    pub fn new<I, E>(include: I, exclude: E) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Self {
            include: normalize_list(include),
            exclude: normalize_list(exclude),
            regex_include: None,
            regex_exclude: None,
        }
    }

    /// Builds a regex based filter
    pub fn with_regex(include: Regex, exclude: Option<Regex>) -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            regex_include: Some(include).filter(|r| !r.as_str().is_empty()),
            regex_exclude: exclude.filter(|r| !r.as_str().is_empty()),
        }
    }

    /// Returns true when any include or exclude rule is present
    pub fn is_configured(&self) -> bool {
        self.regex_include.is_some()
            || self.regex_exclude.is_some()
            || !self.include.is_empty()
            || !self.exclude.is_empty()
    }

    /// Returns true when `domain` passes the filter
    pub fn matches(&self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        if self.regex_include.is_some() || self.regex_exclude.is_some() {
            let included = self
                .regex_include
                .as_ref()
                .map_or(true, |re| re.is_match(&domain));
            let excluded = self
                .regex_exclude
                .as_ref()
                .is_some_and(|re| re.is_match(&domain));
            return included && !excluded;
        }

        let included = self.include.is_empty() || match_any(&self.include, &domain);
        included && !match_any(&self.exclude, &domain)
    }

    /// Human readable summary used in the startup log line
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(re) = &self.regex_include {
            parts.push(format!("regexp domain filter: '{}'", re.as_str()));
        }
        if let Some(re) = &self.regex_exclude {
            parts.push(format!("with exclusion: '{}'", re.as_str()));
        }
        if !self.include.is_empty() {
            parts.push(format!("domain filter: '{}'", self.include.join(",")));
        }
        if !self.exclude.is_empty() {
            parts.push(format!("exclude domain filter: '{}'", self.exclude.join(",")));
        }
        if parts.is_empty() {
            "no kind of domain filters".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl Serialize for DomainFilter {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DomainFilterJson {
            include: &self.include,
            exclude: &self.exclude,
            regex_include: self.regex_include.as_ref().map_or("", Regex::as_str),
            regex_exclude: self.regex_exclude.as_ref().map_or("", Regex::as_str),
        }
        .serialize(serializer)
    }
}

//==============================================================================
// Helpers
//==============================================================================

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_ascii_lowercase()
}

fn normalize_list<I>(entries: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    entries
        .into_iter()
        .map(|e| normalize_domain(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect()
}

/// Suffix match on label boundaries.
///
/// `example.com` matches itself and any subdomain; a leading dot
/// (`.example.com`) matches subdomains only.
fn match_any(filters: &[String], domain: &str) -> bool {
    filters.iter().any(|filter| {
        if filter.starts_with('.') {
            return domain.ends_with(filter.as_str());
        }
        domain == filter
            || domain
                .strip_suffix(filter.as_str())
                .is_some_and(|head| head.ends_with('.'))
    })
}

//==============================================================================
// Tests
//==============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_matches_everything() {
        let filter = DomainFilter::default();
        assert!(!filter.is_configured());
        assert!(filter.matches("a.de"));
        assert!(filter.matches(""));
    }

    #[test]
    fn test_blank_entries_are_not_configured() {
        let filter = DomainFilter::new([""], [" "]);
        assert!(!filter.is_configured());
    }

    #[test]
    fn test_include_list() {
        let filter = DomainFilter::new(["a.de."], Vec::<String>::new());
        assert!(filter.is_configured());
        assert!(filter.matches("a.de"));
        assert!(filter.matches("www.a.de"));
        assert!(filter.matches("WWW.A.DE."));
        assert!(!filter.matches("b.de"));
        assert!(!filter.matches("ba.de"));
    }

    #[test]
    fn test_leading_dot_matches_subdomains_only() {
        let filter = DomainFilter::new([".a.de"], Vec::<String>::new());
        assert!(filter.matches("www.a.de"));
        assert!(!filter.matches("a.de"));
    }

    #[test]
    fn test_exclude_list() {
        let filter = DomainFilter::new(["domain.com"], ["sub.domain.com"]);
        assert!(filter.matches("domain.com"));
        assert!(filter.matches("www.domain.com"));
        assert!(!filter.matches("sub.domain.com"));
        assert!(!filter.matches("x.sub.domain.com"));
    }

    #[test]
    fn test_exclude_only_is_configured() {
        let filter = DomainFilter::new(Vec::<String>::new(), ["internal.de"]);
        assert!(filter.is_configured());
        assert!(filter.matches("a.de"));
        assert!(!filter.matches("x.internal.de"));
    }

    #[test]
    fn test_regex_filter() {
        let filter = DomainFilter::with_regex(
            Regex::new(r"\.a\.de$").unwrap(),
            Some(Regex::new(r"^internal\.").unwrap()),
        );
        assert!(filter.is_configured());
        assert!(filter.matches("www.a.de"));
        assert!(!filter.matches("internal.a.de"));
        assert!(!filter.matches("www.b.de"));
    }

    #[test]
    fn test_empty_exclusion_regex_is_ignored() {
        let filter =
            DomainFilter::with_regex(Regex::new("a").unwrap(), Some(Regex::new("").unwrap()));
        assert!(filter.matches("a.de"));
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({"regexInclude": "a"})
        );
    }

    #[test]
    fn test_serialize_lists() {
        let filter = DomainFilter::new(["a.de", "b.de"], ["x.a.de"]);
        assert_eq!(
            serde_json::to_value(&filter).unwrap(),
            serde_json::json!({"include": ["a.de", "b.de"], "exclude": ["x.a.de"]})
        );
        assert_eq!(
            serde_json::to_value(DomainFilter::default()).unwrap(),
            serde_json::json!({})
        );
    }

    #[test]
    fn test_describe() {
        assert_eq!(DomainFilter::default().describe(), "no kind of domain filters");
        let filter = DomainFilter::new(["domain.com"], ["sub.domain.com"]);
        assert_eq!(
            filter.describe(),
            "domain filter: 'domain.com', exclude domain filter: 'sub.domain.com'"
        );
    }
}
