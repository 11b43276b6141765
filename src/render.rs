//! Placeholder markup emission and page rewriting.
//!
//! The server-facing half of the markup contract: [`placeholder_markup`]
//! emits the `<variant-test>` element the controller consumes, and
//! [`rewrite_page`] plays the browser's part, destructively replacing every
//! placeholder in a page string with the controller's output.

use crate::controller::BucketingController;
use crate::draw::TrafficDraw;
use crate::element::{escape_attr, find_placeholder, PLACEHOLDER_TAG};
use crate::error::Result;
use crate::settings::clamp_traffic;
use crate::store::AssignmentStore;

/// Build the placeholder element for one test location.
///
/// Both markup payloads are JSON-encoded and attribute-escaped; the traffic
/// percentage is clamped to `[0, 100]`; the raw control HTML is carried as
/// inner fallback content for user agents that never run the controller.
pub fn placeholder_markup(
    slug: &str,
    control_html: &str,
    variant_html: &str,
    traffic_percentage: u8,
) -> String {
    format!(
        "<{tag} data-type=\"{slug}\" control=\"{control}\" variant=\"{variant}\" traffic-percentage=\"{traffic}\">{fallback}</{tag}>",
        tag = PLACEHOLDER_TAG,
        slug = escape_attr(slug),
        control = escape_attr(&json_encode(control_html)),
        variant = escape_attr(&json_encode(variant_html)),
        traffic = clamp_traffic(Some(i64::from(traffic_percentage))),
        fallback = control_html,
    )
}

/// Replace every placeholder element in `html` with the controller's output.
///
/// Replacement is irreversible: the placeholder element itself does not
/// survive in the returned page. The first malformed payload aborts the
/// rewrite and propagates.
pub fn rewrite_page<S, D>(html: &str, controller: &mut BucketingController<S, D>) -> Result<String>
where
    S: AssignmentStore,
    D: TrafficDraw,
{
    let mut out = String::with_capacity(html.len());
    let mut cursor = 0;

    while let Some(found) = find_placeholder(html, cursor) {
        out.push_str(&html[cursor..found.start]);
        out.push_str(&controller.attach(&found.element)?);
        cursor = found.end;
    }

    out.push_str(&html[cursor..]);
    Ok(out)
}

fn json_encode(html: &str) -> String {
    // Serializing a string slice cannot fail.
    serde_json::to_string(html).expect("string serialization")
}
