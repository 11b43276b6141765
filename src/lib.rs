//! Framework for defining A/B test variants, bucketing visitor traffic
//! between a control and a variant experience, and retiring tests on
//! schedule.
//!
//! The core is the [`BucketingController`]: one synchronous pass per page
//! view that loads the visitor's persisted assignment (or draws a fresh one
//! through an injected random source), persists it, and returns the decoded
//! markup that replaces the `<variant-test>` placeholder element. Around it
//! sit the editorial pieces: a [`catalog::TestCatalog`] of test records, a
//! [`registry::VariantRegistry`] of display callbacks, TTL-cached active
//! test resolution, placeholder markup rendering, and an
//! [`unpublish::UnpublishSchedule`] that flips tests to `Complete` when
//! their end date passes.

pub mod active;
pub mod catalog;
pub mod cli;
pub mod controller;
pub mod descriptor;
pub mod draw;
pub mod element;
pub mod error;
pub mod registry;
pub mod render;
pub mod settings;
pub mod store;
pub mod unpublish;

pub use controller::{clear_stale_assignment, BucketingController};
pub use descriptor::{TestDescriptor, DEFAULT_TRAFFIC_PERCENTAGE};
pub use draw::{SeededDraw, SequenceDraw, ThreadRngDraw, TrafficDraw};
pub use element::Placeholder;
pub use error::{Result, VariantsError};
pub use store::{Assignment, AssignmentStore, FileStore, Group, MemoryStore};
