//! Editorial test settings.
//!
//! The original system collected these through an admin form and stored them
//! as post meta; here they are a plain struct, loadable from a TOML document
//! (`[tests.<slug>]` tables) or built directly in code.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer};

use crate::descriptor::DEFAULT_TRAFFIC_PERCENTAGE;
use crate::error::Result;

/// Settings attached to a single test.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TestSettings {
    /// Which registered test this record drives. Empty means unconfigured.
    #[serde(rename = "type", default)]
    pub test_type: String,

    /// Percentage of traffic gated by the bucketing draw, clamped to
    /// `[0, 100]` on load. Defaults to 50 when absent.
    #[serde(
        default = "default_traffic",
        deserialize_with = "deserialize_traffic"
    )]
    pub traffic_percentage: u8,

    /// When the test should stop running, as a Unix-seconds timestamp.
    #[serde(default)]
    pub end_date: Option<u64>,

    /// Free-form per-type settings the display callback may consume.
    #[serde(flatten)]
    pub extras: HashMap<String, serde_json::Value>,
}

impl TestSettings {
    pub fn new(test_type: &str) -> Self {
        TestSettings {
            test_type: test_type.to_string(),
            traffic_percentage: DEFAULT_TRAFFIC_PERCENTAGE,
            end_date: None,
            extras: HashMap::new(),
        }
    }

    pub fn with_traffic_percentage(mut self, raw: i64) -> Self {
        self.traffic_percentage = clamp_traffic(Some(raw));
        self
    }

    pub fn with_end_date(mut self, end_date: u64) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

impl Default for TestSettings {
    fn default() -> Self {
        TestSettings::new("")
    }
}

/// `min(100, max(0, value ?? 50))` — the same clamp the render path applies.
pub fn clamp_traffic(raw: Option<i64>) -> u8 {
    match raw {
        Some(n) => n.clamp(0, 100) as u8,
        None => DEFAULT_TRAFFIC_PERCENTAGE,
    }
}

fn default_traffic() -> u8 {
    DEFAULT_TRAFFIC_PERCENTAGE
}

fn deserialize_traffic<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    Ok(clamp_traffic(raw))
}

// ---------------------------------------------------------------------------
// TOML settings documents
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SettingsDoc {
    #[serde(default)]
    tests: HashMap<String, TestSettings>,
}

/// Parse a settings document of `[tests.<slug>]` tables into a slug → settings
/// map. An empty document is an empty map, not an error.
pub fn parse_settings_doc(raw: &str) -> Result<HashMap<String, TestSettings>> {
    let doc: SettingsDoc = toml::from_str(raw)?;
    Ok(doc.tests)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_settings_doc_parses_tables() {
        let raw = r#"
            [tests.homepage-hero]
            type = "homepage-hero"
            traffic_percentage = 30
            end_date = 1767225600

            [tests.footer-cta]
            type = "footer-cta"
        "#;
        let tests = parse_settings_doc(raw).unwrap();
        assert_eq!(tests.len(), 2);

        let hero = &tests["homepage-hero"];
        assert_eq!(hero.test_type, "homepage-hero");
        assert_eq!(hero.traffic_percentage, 30);
        assert_eq!(hero.end_date, Some(1_767_225_600));

        let footer = &tests["footer-cta"];
        assert_eq!(footer.traffic_percentage, 50);
        assert_eq!(footer.end_date, None);
    }

    #[test]
    fn test_settings_doc_extras_captured() {
        let raw = r#"
            [tests.hero]
            type = "hero"
            headline = "Buy now"
            cta_count = 2
        "#;
        let tests = parse_settings_doc(raw).unwrap();
        let extras = &tests["hero"].extras;
        assert_eq!(
            extras.get("headline").and_then(|v| v.as_str()),
            Some("Buy now")
        );
        assert_eq!(extras.get("cta_count").and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn test_settings_doc_empty_is_empty_map() {
        assert!(parse_settings_doc("").unwrap().is_empty());
    }

    #[test]
    fn test_settings_doc_malformed_is_error() {
        assert!(parse_settings_doc("[tests.hero\ntype=").is_err());
    }

    #[test]
    fn test_settings_doc_out_of_range_percentage_clamps() {
        let raw = "[tests.a]\ntype = \"a\"\ntraffic_percentage = 250";
        let tests = parse_settings_doc(raw).unwrap();
        assert_eq!(tests["a"].traffic_percentage, 100);
    }

    #[rstest]
    #[case(None, 50)]
    #[case(Some(-10), 0)]
    #[case(Some(0), 0)]
    #[case(Some(50), 50)]
    #[case(Some(100), 100)]
    #[case(Some(9999), 100)]
    fn test_clamp_traffic(#[case] raw: Option<i64>, #[case] expected: u8) {
        assert_eq!(clamp_traffic(raw), expected);
    }

    #[test]
    fn test_builder_clamps() {
        let s = TestSettings::new("hero").with_traffic_percentage(140);
        assert_eq!(s.traffic_percentage, 100);
    }
}
