//! The test descriptor delivered on the placeholder element.

use crate::element::{Placeholder, ATTR_CONTROL, ATTR_TRAFFIC, ATTR_TYPE, ATTR_VARIANT};

/// Traffic percentage applied when the attribute is absent or non-numeric.
pub const DEFAULT_TRAFFIC_PERCENTAGE: u8 = 50;

/// Everything the controller needs to know about the test on this page,
/// read straight off the placeholder's attributes. Not persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDescriptor {
    /// Identifier of the active test. Empty means no test is active.
    pub test_type: String,
    /// Draw weight in `[0, 100]`.
    pub traffic_percentage: u8,
    /// JSON-encoded control markup. Decoded only if selected.
    pub control: String,
    /// JSON-encoded variant markup. Decoded only if selected.
    pub variant: String,
}

impl TestDescriptor {
    /// Read the descriptor from a placeholder element.
    ///
    /// A missing or malformed traffic percentage recovers to
    /// [`DEFAULT_TRAFFIC_PERCENTAGE`]; out-of-range values clamp to 100.
    /// Missing payload attributes read as empty strings and only fail later,
    /// at decode time, if that arm is selected.
    pub fn from_element(element: &Placeholder) -> TestDescriptor {
        TestDescriptor {
            test_type: element.attr(ATTR_TYPE).unwrap_or_default().to_string(),
            traffic_percentage: parse_traffic_percentage(element.attr(ATTR_TRAFFIC)),
            control: element.attr(ATTR_CONTROL).unwrap_or_default().to_string(),
            variant: element.attr(ATTR_VARIANT).unwrap_or_default().to_string(),
        }
    }
}

fn parse_traffic_percentage(raw: Option<&str>) -> u8 {
    match raw.map(str::trim).and_then(|s| s.parse::<i64>().ok()) {
        Some(n) => n.clamp(0, 100) as u8,
        None => DEFAULT_TRAFFIC_PERCENTAGE,
    }
}
