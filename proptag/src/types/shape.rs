//! Type shapes
//!
//! This file provides the declarative building blocks of a registered type:
//! - `FieldShape`: a physical storage location (what the type actually stores).
//! - `PropertyShape`: a logical property, as reported by the delegate metadata
//!   facility. Delegated properties have a property declaration but their
//!   storage carries a different, convention-derived name.
//! - `Marker`: a marker (annotation) occurrence with its named values.
//! - `TypeShape`: everything above plus type parameters and supertypes.
use std::collections::BTreeMap;

use bitflags::bitflags;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::types::expr::{TypeExpr, TypeParam};

bitflags! {
    /// Modifiers of a physical storage location.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct FieldFlags: u8 {
        /// Class-level storage, never instance state.
        const STATIC = 1 << 0;
        /// Emitted by the compiler rather than written by the user.
        const SYNTHETIC = 1 << 1;
        const FINAL = 1 << 2;
        const TRANSIENT = 1 << 3;
    }
}

/// A marker occurrence, e.g. `@Basic(fetch = LAZY)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Marker {
    /// Fully-qualified marker name.
    pub name: String,
    /// Named values. Scalars are stored as single-element lists.
    pub values: BTreeMap<String, Vec<String>>,
}

impl Marker {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Attaches a named value (appending if the key already has values).
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.entry(key.into()).or_default().push(value.into());
        self
    }

    /// Returns the values stored under `key`, or `None`.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.values.get(key).map(Vec::as_slice)
    }

    /// Returns the first value stored under `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.values(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// One physical storage location of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FieldShape {
    pub name: String,
    pub ty: TypeExpr,
    pub flags: FieldFlags,
    pub markers: Vec<Marker>,
}

impl FieldShape {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            flags: FieldFlags::empty(),
            markers: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: FieldFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::STATIC)
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.flags.contains(FieldFlags::SYNTHETIC)
    }
}

/// A logical property declaration.
///
/// Only available when the delegate metadata facility is present; consumers
/// must not rely on these for types whose shape was captured without it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyShape {
    pub name: String,
    /// The declared value type (for a lazy property, the wrapped type).
    pub ty: TypeExpr,
    pub markers: Vec<Marker>,
}

impl PropertyShape {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            markers: Vec::new(),
        }
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }
}

/// The full static description of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeShape {
    /// Fully-qualified name, also used as the registry lookup key.
    pub name: String,
    pub package: Option<String>,
    pub type_params: Vec<TypeParam>,
    /// Parameterized superclass, e.g. `Base<List<T>>`.
    pub superclass: Option<TypeExpr>,
    /// Name of the lexically enclosing type, for nested types.
    pub enclosing: Option<String>,
    pub fields: Vec<FieldShape>,
    pub properties: Vec<PropertyShape>,
    pub markers: Vec<Marker>,
}

impl TypeShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            type_params: Vec::new(),
            superclass: None,
            enclosing: None,
            fields: Vec::new(),
            properties: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn in_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn type_param(mut self, param: impl Into<TypeParam>) -> Self {
        self.type_params.push(param.into());
        self
    }

    pub fn extends(mut self, superclass: TypeExpr) -> Self {
        self.superclass = Some(superclass);
        self
    }

    pub fn nested_in(mut self, enclosing: impl Into<String>) -> Self {
        self.enclosing = Some(enclosing.into());
        self
    }

    pub fn field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    pub fn property(mut self, property: PropertyShape) -> Self {
        self.properties.push(property);
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    /// Finds a declared property by name.
    pub fn find_property(&self, name: &str) -> Option<&PropertyShape> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Finds a physical storage location by name.
    pub fn find_field(&self, name: &str) -> Option<&FieldShape> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the raw name of the superclass, if any.
    pub fn superclass_name(&self) -> Option<&str> {
        self.superclass.as_ref().and_then(TypeExpr::raw_name)
    }
}
