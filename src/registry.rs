//! Named variant tests and their display callbacks.
//!
//! Site code registers each test it supports under a slug, together with a
//! callback that renders the variant experience from the active record's
//! settings. [`VariantRegistry::display`] is the templating entry point: it
//! emits the placeholder element when a registered, active, matching test
//! produces variant HTML, and falls back to the plain control HTML at every
//! missing step along the way.

use std::collections::HashMap;

use tracing::debug;

use crate::active::ActiveTestCache;
use crate::catalog::TestCatalog;
use crate::render::placeholder_markup;
use crate::settings::TestSettings;

/// Renders the variant experience for an active test. Returning `None`
/// means "nothing to show", which falls back to control.
pub type RenderFn = Box<dyn Fn(u64, &TestSettings) -> Option<String> + Send + Sync>;

/// A registered test: human-readable name plus its display callback.
pub struct VariantTest {
    pub name: String,
    render: RenderFn,
}

impl VariantTest {
    pub fn render(&self, test_id: u64, settings: &TestSettings) -> Option<String> {
        (self.render)(test_id, settings)
    }
}

// ---------------------------------------------------------------------------
// VariantRegistry
// ---------------------------------------------------------------------------

/// Slug-keyed collection of the tests this site supports.
#[derive(Default)]
pub struct VariantRegistry {
    tests: HashMap<String, VariantTest>,
}

impl VariantRegistry {
    pub fn new() -> Self {
        VariantRegistry::default()
    }

    /// Register a test under `slug`. A second registration for the same slug
    /// replaces the first.
    pub fn register<F>(&mut self, slug: &str, name: &str, render: F)
    where
        F: Fn(u64, &TestSettings) -> Option<String> + Send + Sync + 'static,
    {
        self.tests.insert(
            slug.to_string(),
            VariantTest {
                name: name.to_string(),
                render: Box::new(render),
            },
        );
    }

    pub fn get(&self, slug: &str) -> Option<&VariantTest> {
        self.tests.get(slug)
    }

    pub fn len(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Slugs of every registered test, sorted for stable output.
    pub fn slugs(&self) -> Vec<&str> {
        let mut slugs: Vec<&str> = self.tests.keys().map(String::as_str).collect();
        slugs.sort_unstable();
        slugs
    }

    /// Produce the markup for one templated test location.
    ///
    /// The fallback ladder: unknown slug, no active test of this type, or a
    /// callback that returns `None` all yield the raw control HTML with no
    /// placeholder wrapper. Only a fully resolved test emits the
    /// `<variant-test>` element.
    pub fn display(
        &self,
        slug: &str,
        control_html: &str,
        catalog: &TestCatalog,
        cache: &mut ActiveTestCache,
        now_ms: u64,
    ) -> String {
        let Some(test) = self.tests.get(slug) else {
            debug!(slug, "no test registered, serving control");
            return control_html.to_string();
        };

        let Some(active_id) = cache.active_test_of_type(catalog, slug, now_ms) else {
            debug!(slug, "no active test of this type, serving control");
            return control_html.to_string();
        };

        // active_test_of_type only returns ids present in the catalog.
        let Some(record) = catalog.get(active_id) else {
            return control_html.to_string();
        };

        let Some(variant_html) = test.render(active_id, &record.settings) else {
            debug!(slug, active_id, "display callback rendered nothing, serving control");
            return control_html.to_string();
        };

        placeholder_markup(
            slug,
            control_html,
            &variant_html,
            record.settings.traffic_percentage,
        )
    }
}
