//! The bucketing controller.
//!
//! ## Responsibility
//! Runs once per page view: loads the visitor's persisted assignment, draws
//! a fresh one when none exists or the active test changed, persists the
//! result, and returns the decoded markup that replaces the placeholder
//! element. The stale-assignment cleanup guard lives here too, as its own
//! entry point — it runs at page start, before any controller attach, and is
//! never folded into [`BucketingController::attach`].
//!
//! ## Guarantees
//! - Single synchronous pass: one attach is one uninterrupted
//!   load-decide-save sequence; no suspension, no retries.
//! - Reuse writes nothing: a matching persisted assignment is returned
//!   without touching the store.
//! - Literal draw polarity: the variant arm is selected when the draw
//!   exceeds the traffic percentage, so `100` always yields control and `0`
//!   always yields the variant. Callers must not invert this comparison.
//! - Non-panicking: a malformed payload surfaces as [`VariantsError`], never
//!   a panic.

use tracing::{debug, info};

use crate::descriptor::TestDescriptor;
use crate::draw::TrafficDraw;
use crate::element::{Placeholder, ATTR_CONTROL, ATTR_VARIANT};
use crate::error::{Result, VariantsError};
use crate::store::{Assignment, AssignmentStore, Group};

// ---------------------------------------------------------------------------
// BucketingController
// ---------------------------------------------------------------------------

/// Buckets a visitor and selects the markup for one placeholder element.
///
/// Generic over its store and draw source so hosts inject real persistence
/// and randomness while tests script both.
pub struct BucketingController<S, D> {
    store: S,
    draw: D,
}

impl<S: AssignmentStore, D: TrafficDraw> BucketingController<S, D> {
    pub fn new(store: S, draw: D) -> Self {
        BucketingController { store, draw }
    }

    /// The single synchronous entry point, invoked when the placeholder is
    /// attached to the page.
    ///
    /// Returns the decoded HTML that replaces the placeholder element
    /// entirely. A payload that fails to decode as a JSON string is fatal to
    /// this page view's rendering of the element: the error propagates and
    /// nothing is written back to the page. There is deliberately no
    /// raw-text fallback.
    pub fn attach(&mut self, element: &Placeholder) -> Result<String> {
        let descriptor = TestDescriptor::from_element(element);
        let group = self.resolve_group(&descriptor);

        let (payload, attribute) = match group {
            Group::Variant => (&descriptor.variant, ATTR_VARIANT),
            Group::Control => (&descriptor.control, ATTR_CONTROL),
        };

        serde_json::from_str::<String>(payload)
            .map_err(|source| VariantsError::Payload { attribute, source })
    }

    /// Reuse the persisted assignment when it matches the current test type,
    /// otherwise draw and persist a fresh one.
    fn resolve_group(&mut self, descriptor: &TestDescriptor) -> Group {
        if let Some(existing) = Assignment::load(&self.store) {
            if existing.test_type == descriptor.test_type {
                debug!(
                    test_type = %descriptor.test_type,
                    group = %existing.group,
                    "reusing persisted assignment"
                );
                return existing.group;
            }
        }

        let roll = self.draw.draw();
        let group = if roll > descriptor.traffic_percentage {
            Group::Variant
        } else {
            Group::Control
        };

        Assignment {
            group,
            test_type: descriptor.test_type.clone(),
        }
        .save(&mut self.store);

        info!(
            test_type = %descriptor.test_type,
            roll,
            traffic_percentage = descriptor.traffic_percentage,
            group = %group,
            "fresh assignment drawn"
        );
        group
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Hand the store back, e.g. to run the cleanup guard between views.
    pub fn into_store(self) -> S {
        self.store
    }
}

// ---------------------------------------------------------------------------
// Stale-assignment cleanup — standalone page-start guard
// ---------------------------------------------------------------------------

/// Remove a leftover assignment when no test is active.
///
/// `active_test_id` is the page-global signal produced by server-side
/// rendering; `0` means no test is currently published. When it is `0` and
/// any assignment key is present, both keys are removed so the next active
/// test starts from a clean draw. Returns `true` when keys were removed.
///
/// This runs once at page start. The controller never performs this cleanup
/// itself and must not be relied upon to do so.
pub fn clear_stale_assignment(store: &mut dyn AssignmentStore, active_test_id: u64) -> bool {
    if active_test_id != 0 || !Assignment::any_present(store) {
        return false;
    }
    Assignment::clear(store);
    info!("cleared stale assignment, no active test");
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
