//! Field selection
//!
//! The field-name configuration of a verification run: which fields to
//! ignore, which to restrict to, and which have caller-supplied sample
//! values. Names may be given in canonical or storage form; both resolve to
//! the same property.
use std::collections::BTreeSet;

use proptag::ShapeRef;

use crate::{introspector::Introspector, utils::error::ProbeResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelection {
    ignored: Vec<String>,
    only: Vec<String>,
    prefab: Vec<String>,
}

impl FieldSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore(mut self, name: impl Into<String>) -> Self {
        self.ignored.push(name.into());
        self
    }

    pub fn only(mut self, name: impl Into<String>) -> Self {
        self.only.push(name.into());
        self
    }

    pub fn prefab_for(mut self, name: impl Into<String>) -> Self {
        self.prefab.push(name.into());
        self
    }

    /// Normalizes every configured name against the properties of `ty`.
    ///
    /// Fails on the first name that matches no property, and up front if
    /// some state of `ty` cannot be inspected.
    pub fn resolve(
        &self,
        introspector: &Introspector,
        ty: ShapeRef,
    ) -> ProbeResult<ResolvedSelection> {
        introspector.check_capability(ty)?;
        let mapping = introspector.name_mapping(ty)?;

        let canonical = |names: &[String]| -> ProbeResult<BTreeSet<String>> {
            names.iter().map(|n| mapping.to_canonical_name(n)).collect()
        };
        let ignored = canonical(&self.ignored)?;
        let only = canonical(&self.only)?;
        let prefab = canonical(&self.prefab)?;

        let properties = introspector.properties(ty)?;
        let mut significant: Vec<String> = Vec::new();
        for name in properties.canonical_names() {
            let selected = only.is_empty() || only.contains(name);
            if selected && !ignored.contains(name) && !significant.iter().any(|s| s == name) {
                significant.push(name.to_string());
            }
        }

        Ok(ResolvedSelection {
            type_name: properties.type_name().to_string(),
            significant,
            ignored,
            prefab,
        })
    }
}

/// A [`FieldSelection`] with every name in canonical form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    type_name: String,
    significant: Vec<String>,
    ignored: BTreeSet<String>,
    prefab: BTreeSet<String>,
}

impl ResolvedSelection {
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn is_significant(&self, canonical_name: &str) -> bool {
        self.significant.iter().any(|s| s == canonical_name)
    }

    /// Significant canonical names, in enumeration order.
    pub fn significant(&self) -> &[String] {
        &self.significant
    }

    pub fn ignored(&self) -> &BTreeSet<String> {
        &self.ignored
    }

    pub fn prefab_fields(&self) -> &BTreeSet<String> {
        &self.prefab
    }
}
