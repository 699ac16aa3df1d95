//! Header Fingerprint Module
//!
//! Derives a deterministic cache key from an unordered set of request
//! headers. The canonical ordering comes from the service's
//! important-headers list, so semantically identical header sets always
//! produce byte-identical keys regardless of the caller's casing or
//! insertion order.

use std::collections::HashMap;

// == Header Fingerprint ==
/// Builds cache keys and normalized lookup maps from request headers.
///
/// Constructed once per client from the ordered important-headers list the
/// service advertises.
#[derive(Debug, Clone)]
pub struct HeaderFingerprint {
    /// Important header names in canonical order and casing
    canonical: Vec<String>,
    /// The same names lowercased, for case-insensitive matching
    lowered: Vec<String>,
}

impl HeaderFingerprint {
    // == Constructor ==
    /// Creates a fingerprint builder over the given important-headers list.
    /// The list order is the canonical concatenation order.
    pub fn new(important_headers: Vec<String>) -> Self {
        let lowered = important_headers.iter().map(|h| h.to_lowercase()).collect();
        Self {
            canonical: important_headers,
            lowered,
        }
    }

    // == Key Derivation ==
    /// Concatenates the values of all important headers present in `headers`
    /// into one cache key.
    ///
    /// Lookup is case-insensitive. Headers outside the important list are
    /// ignored; important headers absent from the input contribute nothing,
    /// not even a separator. An input containing no important header yields
    /// the empty string, which the client treats as "do not cache".
    pub fn key_for(&self, headers: &HashMap<String, String>) -> String {
        let by_lower = self.lowercase_view(headers);
        let mut key = String::new();
        for name in &self.lowered {
            if let Some(value) = by_lower.get(name.as_str()) {
                key.push_str(value);
            }
        }
        key
    }

    // == Normalization ==
    /// Filters `headers` down to the important headers, keyed by their
    /// canonical names. Empty values are dropped along with unknown headers.
    ///
    /// This is the map sent to the detection service for header lookups.
    pub fn normalize(&self, headers: &HashMap<String, String>) -> HashMap<String, String> {
        let by_lower = self.lowercase_view(headers);
        let mut normalized = HashMap::new();
        for (canonical, lowered) in self.canonical.iter().zip(&self.lowered) {
            if let Some(value) = by_lower.get(lowered.as_str()) {
                if !value.is_empty() {
                    normalized.insert(canonical.clone(), (*value).clone());
                }
            }
        }
        normalized
    }

    /// Returns the canonical important-header names.
    pub fn important_headers(&self) -> &[String] {
        &self.canonical
    }

    /// Re-keys the input map by lowercased header name.
    fn lowercase_view<'a>(&self, headers: &'a HashMap<String, String>) -> HashMap<String, &'a String> {
        headers
            .iter()
            .map(|(name, value)| (name.to_lowercase(), value))
            .collect()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> HeaderFingerprint {
        HeaderFingerprint::new(vec![
            "User-Agent".to_string(),
            "X-Requested-With".to_string(),
            "Device-Stock-UA".to_string(),
        ])
    }

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_key_follows_canonical_order() {
        let fp = builder();
        // Input order is the reverse of the canonical order
        let input = headers(&[
            ("Device-Stock-UA", "stock"),
            ("X-Requested-With", "app"),
            ("User-Agent", "ua"),
        ]);

        assert_eq!(fp.key_for(&input), "uaappstock");
    }

    #[test]
    fn test_key_is_case_insensitive() {
        let fp = builder();
        let mixed = headers(&[("USER-AGENT", "ua"), ("x-requested-with", "app")]);
        let lower = headers(&[("user-agent", "ua"), ("X-Requested-With", "app")]);

        assert_eq!(fp.key_for(&mixed), fp.key_for(&lower));
        assert_eq!(fp.key_for(&mixed), "uaapp");
    }

    #[test]
    fn test_absent_headers_contribute_nothing() {
        let fp = builder();
        let input = headers(&[("Device-Stock-UA", "stock")]);

        // No separator or placeholder for the two missing headers
        assert_eq!(fp.key_for(&input), "stock");
    }

    #[test]
    fn test_unknown_headers_ignored() {
        let fp = builder();
        let input = headers(&[("User-Agent", "ua"), ("Accept-Language", "en")]);

        assert_eq!(fp.key_for(&input), "ua");
    }

    #[test]
    fn test_no_important_headers_yields_empty_key() {
        let fp = builder();
        let input = headers(&[("Accept", "text/html"), ("Host", "example.org")]);

        assert_eq!(fp.key_for(&input), "");
    }

    #[test]
    fn test_normalize_uses_canonical_names() {
        let fp = builder();
        let input = headers(&[("user-agent", "ua"), ("X-REQUESTED-WITH", "app")]);

        let normalized = fp.normalize(&input);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized["User-Agent"], "ua");
        assert_eq!(normalized["X-Requested-With"], "app");
    }

    #[test]
    fn test_normalize_drops_empty_values() {
        let fp = builder();
        let input = headers(&[("User-Agent", ""), ("X-Requested-With", "app")]);

        let normalized = fp.normalize(&input);
        assert_eq!(normalized.len(), 1);
        assert!(!normalized.contains_key("User-Agent"));
    }
}
