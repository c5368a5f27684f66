//! Dirty tracking for partial updates.
//!
//! [`TrackedResource<T>`] remembers the simple representation of a record as
//! it was loaded. [`Resource::save_changes`](crate::rest::Resource::save_changes)
//! then sends only the attributes that differ, leaving every other attribute
//! untouched on the server.
//!
//! Changes are detected per top-level attribute. A changed attribute is sent
//! whole: localized values (`{"en": .., "it": ..}`) and structured field
//! values must be written in full, so nested objects are never diffed.
//!
//! # Example
//!
//! ```rust
//! use cms_client::rest::TrackedResource;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct UploadFilter {
//!     id: String,
//!     name: String,
//!     shared: bool,
//! }
//!
//! let mut tracked = TrackedResource::from_existing(UploadFilter {
//!     id: "12".to_string(),
//!     name: "Images".to_string(),
//!     shared: false,
//! });
//! assert!(!tracked.is_dirty());
//!
//! tracked.shared = true;
//! let changes = tracked.changed_attributes();
//! assert_eq!(changes.len(), 1);
//! assert_eq!(changes["shared"], true);
//! ```

use std::ops::{Deref, DerefMut};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Keys that identify a record rather than describe it.
const IDENTITY_KEYS: &[&str] = &["id", "type", "meta"];

/// A record plus the state it had when loaded or last saved.
///
/// Derefs to `T`; modifications through `DerefMut` are picked up by
/// [`is_dirty`](Self::is_dirty) and [`changed_attributes`](Self::changed_attributes).
#[derive(Debug, Clone)]
pub struct TrackedResource<T> {
    resource: T,
    snapshot: Option<Map<String, Value>>,
}

impl<T: Serialize + DeserializeOwned + Clone> TrackedResource<T> {
    /// Wraps a record that does not exist on the server yet.
    ///
    /// Every attribute counts as changed.
    #[must_use]
    pub const fn new(resource: T) -> Self {
        Self {
            resource,
            snapshot: None,
        }
    }

    /// Wraps a record as loaded from the server.
    #[must_use]
    pub fn from_existing(resource: T) -> Self {
        let snapshot = as_object(&resource);
        Self { resource, snapshot }
    }

    /// Returns `true` if any attribute differs from the snapshot.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.changed_attributes().is_empty()
    }

    /// Returns `true` if there is no snapshot.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.snapshot.is_none()
    }

    /// Returns the attributes that differ from the snapshot.
    ///
    /// Identity keys (`id`, `type`, `meta`) are never included. Attributes
    /// removed since the snapshot are not reported.
    #[must_use]
    pub fn changed_attributes(&self) -> Map<String, Value> {
        let current = as_object(&self.resource).unwrap_or_default();

        current
            .into_iter()
            .filter(|(key, _)| !IDENTITY_KEYS.contains(&key.as_str()))
            .filter(|(key, value)| {
                self.snapshot
                    .as_ref()
                    .map_or(true, |snapshot| snapshot.get(key) != Some(value))
            })
            .collect()
    }

    /// Takes the current state as the new snapshot.
    pub fn mark_clean(&mut self) {
        self.snapshot = as_object(&self.resource);
    }

    /// Replaces the record with the server's copy and marks it clean.
    pub fn reset(&mut self, resource: T) {
        self.resource = resource;
        self.mark_clean();
    }

    /// Consumes the wrapper and returns the record.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.resource
    }
}

fn as_object<T: Serialize>(resource: &T) -> Option<Map<String, Value>> {
    match serde_json::to_value(resource) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

impl<T> Deref for TrackedResource<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.resource
    }
}

impl<T> DerefMut for TrackedResource<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.resource
    }
}

// Verify TrackedResource is Send + Sync when T is Send + Sync
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<TrackedResource<Value>>();
};
