//! Types module
//!
//! This module contains the static description of the types the engine
//! introspects. It is built on three layers:
//!
//! - Declared type expressions (see `expr.rs`).
//! - Shapes: fields, properties, markers and the type shape itself (see `shape.rs`).
//! - A [`ShapeRegistry`] which stores shapes and hands out stable
//!   [`ShapeRef`] identifiers (UUID-based).
//!
//! Shapes are immutable once registered. Registering a shape under a name
//! that already exists does not overwrite the previous shape: it creates a
//! new version with a fresh [`ShapeRef`], so anything cached against the old
//! reference stays consistent with the shape it was computed from.
use std::{collections::BTreeMap, sync::Arc};

use log::debug;
use parking_lot::RwLock;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};
use uuid::{Timestamp, Uuid};

use crate::types::shape::{Marker, TypeShape};

pub mod expr;
pub mod shape;

/// A stable reference to a shape stored inside a [`ShapeRegistry`].
///
/// Each registered version of a type receives its own reference, which makes
/// it usable as a type-version token for caches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ShapeRef(Uuid);

impl std::fmt::Display for ShapeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stable reference to one registered set of package markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MarkerSetRef(Uuid);

impl std::fmt::Display for MarkerSetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A central registry of type shapes.
///
/// Example:
///
/// ```rust
/// # use proptag::{ShapeRegistry, TypeShape};
/// let reg = ShapeRegistry::new([0u8; 6]);
/// let shape_ref = reg.register(TypeShape::new("Container"));
/// assert_eq!(reg.lookup("Container"), Some(shape_ref));
/// assert_eq!(reg.get(shape_ref).unwrap().name, "Container");
/// ```
pub struct ShapeRegistry {
    shapes: RwLock<BTreeMap<Uuid, Arc<TypeShape>>>,
    by_name: RwLock<BTreeMap<String, SmallVec<[Uuid; 1]>>>,
    packages: RwLock<BTreeMap<String, Uuid>>,
    marker_sets: RwLock<BTreeMap<Uuid, Arc<[Marker]>>>,
    context: uuid::timestamp::context::Context,
    node_id: [u8; 6],
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self::new([0; 6])
    }
}

impl ShapeRegistry {
    fn next_uuid(&self) -> Uuid {
        let ts = Timestamp::now(&self.context);
        Uuid::new_v6(ts, &self.node_id)
    }

    /// Create a new [`ShapeRegistry`] instance.
    ///
    /// `node_id` is used when allocating UUIDs for newly registered shapes.
    pub fn new(node_id: [u8; 6]) -> Self {
        Self {
            shapes: Default::default(),
            // INFO: Always lock shapes before by_name to avoid deadlock
            by_name: Default::default(),
            // INFO: Always lock marker_sets before packages
            packages: Default::default(),
            marker_sets: Default::default(),
            context: uuid::timestamp::context::Context::new(0),
            node_id,
        }
    }

    /// Register `shape` and return the [`ShapeRef`] of this new version.
    ///
    /// # A note on concurrency
    /// Registration takes both write locks, in the order `shapes` then
    /// `by_name`. Readers never hold a lock after returning, so calling this
    /// from any thread is deadlock free.
    pub fn register(&self, shape: TypeShape) -> ShapeRef {
        let mut shapes_lock = self.shapes.write();
        let mut by_name_lock = self.by_name.write();

        let uuid = self.next_uuid();
        let versions = by_name_lock.entry(shape.name.clone()).or_insert_with(|| smallvec![]);
        if versions.is_empty() {
            debug!("Registered shape {} with UUID {}.", shape.name, uuid);
        } else {
            debug!(
                "Registered version {} of shape {} with UUID {} (previous: {:?}).",
                versions.len() + 1,
                shape.name,
                uuid,
                versions
            );
        }
        versions.push(uuid);
        shapes_lock.insert(uuid, Arc::new(shape));
        ShapeRef(uuid)
    }

    /// Retrieve the shape for the given `shape_ref`. Returns [`None`] if it is
    /// not present in the registry.
    pub fn get(&self, shape_ref: ShapeRef) -> Option<Arc<TypeShape>> {
        self.shapes.read_recursive().get(&shape_ref.0).cloned()
    }

    /// Returns the latest registered version of the type called `name`.
    pub fn lookup(&self, name: &str) -> Option<ShapeRef> {
        self.by_name
            .read_recursive()
            .get(name)
            .and_then(|versions| versions.last())
            .copied()
            .map(ShapeRef)
    }

    /// Returns every registered version of `name`, oldest first.
    pub fn versions(&self, name: &str) -> Vec<ShapeRef> {
        self.by_name
            .read_recursive()
            .get(name)
            .map(|versions| versions.iter().copied().map(ShapeRef).collect())
            .unwrap_or_default()
    }

    /// Returns the [`ShapeRef`] of the superclass of `shape`, if that
    /// superclass is registered.
    pub fn superclass_of(&self, shape: &TypeShape) -> Option<ShapeRef> {
        shape.superclass_name().and_then(|name| self.lookup(name))
    }

    /// Attach package-level markers. The new set replaces the current one for
    /// `package`; sets registered earlier stay reachable through their
    /// [`MarkerSetRef`].
    pub fn register_package_markers(
        &self,
        package: impl Into<String>,
        markers: impl IntoIterator<Item = Marker>,
    ) -> MarkerSetRef {
        let package = package.into();
        let markers: Arc<[Marker]> = markers.into_iter().collect();

        let mut sets_lock = self.marker_sets.write();
        let mut packages_lock = self.packages.write();

        let uuid = self.next_uuid();
        debug!(
            "Registered {} marker(s) on package {} with UUID {}.",
            markers.len(),
            package,
            uuid
        );
        sets_lock.insert(uuid, markers);
        packages_lock.insert(package, uuid);
        MarkerSetRef(uuid)
    }

    /// Returns the current marker set of `package`.
    pub fn package_marker_set(&self, package: &str) -> Option<MarkerSetRef> {
        self.packages
            .read_recursive()
            .get(package)
            .copied()
            .map(MarkerSetRef)
    }

    /// Returns the markers of a registered set.
    pub fn marker_set(&self, set: MarkerSetRef) -> Option<Arc<[Marker]>> {
        self.marker_sets.read_recursive().get(&set.0).cloned()
    }

    /// Returns the markers currently attached to `package`.
    pub fn package_markers(&self, package: &str) -> Option<Arc<[Marker]>> {
        self.package_marker_set(package)
            .and_then(|set| self.marker_set(set))
    }

    /// Number of registered shape versions.
    pub fn len(&self) -> usize {
        self.shapes.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
