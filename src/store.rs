//! Persisted assignment state.
//!
//! ## Responsibility
//! A visitor's bucketing assignment outlives a single page view. This module
//! defines the key-value seam that persistence goes through, the typed view
//! of what is stored there, and two concrete stores: an in-memory map for
//! tests and simulation, and a write-through JSON file that fills the role
//! browser local storage plays for the original client.
//!
//! ## Guarantees
//! - All-or-nothing: an assignment loads only when both keys are present and
//!   is written/cleared as a pair. Partial state reads as "no assignment".
//! - Last write wins: stores hold no locks; one load-decide-save pass is a
//!   single synchronous sequence per page view.
//! - Non-panicking: file store failures surface as [`VariantsError`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VariantsError};

/// Storage key holding the assigned group (`"a"` / `"b"`).
pub const GROUP_KEY: &str = "variant-group";

/// Storage key holding the test type the assignment was computed for.
pub const TYPE_KEY: &str = "variant-type";

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// Which arm of the test a visitor is bucketed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    /// The unmodified baseline experience (`"a"`).
    Control,
    /// The alternate experience under test (`"b"`).
    Variant,
}

impl Group {
    /// Parse a stored group value. Only `"b"` selects the variant arm;
    /// anything else (legacy or unexpected values included) is control.
    pub fn from_stored(value: &str) -> Self {
        if value == "b" {
            Group::Variant
        } else {
            Group::Control
        }
    }

    /// The stored string form (`"a"` / `"b"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Group::Control => "a",
            Group::Variant => "b",
        }
    }
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// AssignmentStore — the injected key-value seam
// ---------------------------------------------------------------------------

/// Minimal string key-value store interface.
///
/// The original client talks to browser local storage through exactly this
/// surface; injecting it keeps the controller testable and host-agnostic.
pub trait AssignmentStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

impl<S: AssignmentStore + ?Sized> AssignmentStore for &mut S {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) {
        (**self).remove(key)
    }
}

// ---------------------------------------------------------------------------
// Assignment — typed view over the two keys
// ---------------------------------------------------------------------------

/// A complete persisted assignment: group plus the test type it was drawn for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub group: Group,
    pub test_type: String,
}

impl Assignment {
    /// Load the assignment, or `None` when either key is absent.
    pub fn load(store: &dyn AssignmentStore) -> Option<Assignment> {
        let group = store.get(GROUP_KEY)?;
        let test_type = store.get(TYPE_KEY)?;
        Some(Assignment {
            group: Group::from_stored(&group),
            test_type,
        })
    }

    /// Persist both keys.
    pub fn save(&self, store: &mut dyn AssignmentStore) {
        store.set(GROUP_KEY, self.group.as_str());
        store.set(TYPE_KEY, &self.test_type);
    }

    /// Remove both keys.
    pub fn clear(store: &mut dyn AssignmentStore) {
        store.remove(GROUP_KEY);
        store.remove(TYPE_KEY);
    }

    /// `true` when either key is present (used by the cleanup guard).
    pub fn any_present(store: &dyn AssignmentStore) -> bool {
        store.get(GROUP_KEY).is_some() || store.get(TYPE_KEY).is_some()
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory store for tests and the simulator's fresh-visitor mode.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl AssignmentStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// JSON-file-backed store: one flat string map, written through on every
/// mutation so each page view observes the last completed write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`, loading any existing image. A missing file
    /// is an empty store, not an error.
    pub fn open(path: impl AsRef<Path>) -> Result<FileStore> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => {
                serde_json::from_str::<StoreImage>(&raw)
                    .map_err(|source| VariantsError::StoreFormat {
                        path: path.display().to_string(),
                        source,
                    })?
                    .entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => {
                return Err(VariantsError::StoreIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        Ok(FileStore { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) {
        let image = StoreImage {
            entries: self.entries.clone(),
        };
        match serde_json::to_string_pretty(&image) {
            Ok(raw) => {
                if let Err(e) = fs::write(&self.path, raw) {
                    tracing::warn!(path = %self.path.display(), error = %e, "assignment store write failed");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "assignment store serialize failed");
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoreImage {
    entries: HashMap<String, String>,
}

impl AssignmentStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush();
    }

    fn remove(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.flush();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
