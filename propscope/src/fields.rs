//! Field model
//!
//! Enumerates the significant state of a type across its hierarchy. Every
//! physical storage location is classified by the [`DelegateProbe`] and
//! given a resolved type tag by the [`Resolver`].
//!
//! In the default mode an ancestor's storage location is suppressed when a
//! descendant already produced a property under the same logical name and
//! either of the two is delegated; this is the case of a property redeclared
//! through delegation in a subclass. [`FieldModel::enumerate_raw`] keeps
//! every location for diagnostics.
use std::collections::HashMap;

use log::{debug, warn};
use proptag::{FieldFlags, FieldShape, ShapeRef, TypeTag};

use crate::{
    context::{Lineage, ProbeContext},
    delegate::{
        Classification, DelegateFamily, DelegateKind, DelegateProbe, StorageSite, ValueAccess,
    },
    resolver::{FieldTagMemo, Level, Resolution, Resolver},
    utils::error::{ProbeError, ProbeResult},
};

/// One significant piece of instance state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Property {
    pub canonical_name: String,
    pub storage_name: String,
    pub declaring_type: ShapeRef,
    pub declaring_type_name: String,
    pub delegate: DelegateKind,
    /// The value cannot be inspected without the delegate metadata facility.
    pub requires_capability: bool,
    /// A delegation family recognized by convention but left unconfirmed.
    pub suspected: Option<DelegateFamily>,
    /// The canonical name this property would have with the facility.
    pub alias: Option<String>,
    /// Resolved storage type. For a lazy cache, the wrapper with the wrapped
    /// value type as child.
    pub type_tag: TypeTag,
    /// Resolved logical value type.
    pub value_tag: TypeTag,
    pub resolution: Resolution,
    pub flags: FieldFlags,
}

impl Property {
    pub fn is_delegated(&self) -> bool {
        self.delegate.is_delegated()
    }

    pub fn value_tag(&self) -> &TypeTag {
        &self.value_tag
    }

    pub fn access(&self) -> ValueAccess {
        self.delegate.access(&self.canonical_name)
    }

    /// The error describing a partial resolution, if any.
    pub fn unresolved_error(&self) -> Option<ProbeError> {
        match &self.resolution {
            Resolution::Complete => None,
            Resolution::Partial { placeholders } => Some(ProbeError::UnresolvedGeneric {
                type_name: self.declaring_type_name.clone(),
                property: self.canonical_name.clone(),
                placeholders: placeholders.clone(),
            }),
        }
    }
}

/// The ordered properties of one type, most-derived declarations first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySet {
    shape: ShapeRef,
    type_name: String,
    properties: Vec<Property>,
}

impl PropertySet {
    pub fn new(shape: ShapeRef, type_name: impl Into<String>, properties: Vec<Property>) -> Self {
        Self {
            shape,
            type_name: type_name.into(),
            properties,
        }
    }

    pub fn shape(&self) -> ShapeRef {
        self.shape
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The most-derived property with the given canonical name.
    pub fn get(&self, canonical_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.canonical_name == canonical_name)
    }

    /// The most-derived property stored under the given identifier.
    pub fn by_storage(&self, storage_name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.storage_name == storage_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Property> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.canonical_name.as_str())
    }

    pub fn requires_capability(&self) -> bool {
        self.properties.iter().any(|p| p.requires_capability)
    }

    /// The error aborting verification of this type, if some of its state
    /// is invisible without the delegate metadata facility.
    pub fn capability_error(&self) -> Option<ProbeError> {
        self.properties
            .iter()
            .find(|p| p.requires_capability)
            .map(|p| ProbeError::CapabilityRequired {
                type_name: self.type_name.clone(),
                field: p.alias.clone().unwrap_or_else(|| p.canonical_name.clone()),
                suspected: p.suspected.unwrap_or(DelegateFamily::None),
            })
    }
}

impl<'a> IntoIterator for &'a PropertySet {
    type Item = &'a Property;
    type IntoIter = std::slice::Iter<'a, Property>;

    fn into_iter(self) -> Self::IntoIter {
        self.properties.iter()
    }
}

pub struct FieldModel<'c> {
    ctx: ProbeContext<'c>,
    probe: &'c DelegateProbe,
    memo: &'c FieldTagMemo,
}

impl<'c> FieldModel<'c> {
    pub fn new(ctx: ProbeContext<'c>, probe: &'c DelegateProbe, memo: &'c FieldTagMemo) -> Self {
        Self { ctx, probe, memo }
    }

    /// The significant properties of the type `lineage` pins, seen as `owning_tag`.
    pub fn enumerate(&self, lineage: &Lineage, owning_tag: &TypeTag) -> ProbeResult<PropertySet> {
        self.collect(lineage, owning_tag, true)
    }

    /// Every physical storage location of the type, including those a
    /// descendant's delegated redeclaration would suppress.
    pub fn enumerate_raw(
        &self,
        lineage: &Lineage,
        owning_tag: &TypeTag,
    ) -> ProbeResult<PropertySet> {
        self.collect(lineage, owning_tag, false)
    }

    fn collect(
        &self,
        lineage: &Lineage,
        owning_tag: &TypeTag,
        suppress: bool,
    ) -> ProbeResult<PropertySet> {
        let resolver = Resolver::new(self.ctx, self.memo);
        let levels = resolver.hierarchy(lineage, owning_tag)?;
        let type_name = levels[0].shape.name.clone();

        // logical name -> whether a delegated location claimed it
        let mut claimed: HashMap<String, bool> = HashMap::new();
        let mut properties = Vec::new();

        for (depth, level) in levels.iter().enumerate() {
            let mut level_claims: Vec<(String, bool)> = Vec::new();

            for field in &level.shape.fields {
                if field.is_static() || self.ctx.config.is_excluded_storage(&field.name) {
                    continue;
                }

                let classification = self.probe.classify(
                    &StorageSite {
                        declaring: &level.shape,
                        field,
                    },
                    &self.ctx.config.conventions,
                    self.ctx.capabilities,
                );
                let delegated = classification.is_convention_match();
                if field.is_synthetic() && !delegated {
                    continue;
                }

                let names = [
                    Some(classification.canonical_name.clone()),
                    classification.alias.clone(),
                ];

                if suppress && depth > 0 {
                    let overridden = names
                        .iter()
                        .flatten()
                        .any(|n| claimed.get(n).is_some_and(|d| *d || delegated));
                    if overridden {
                        debug!(
                            "Suppressing {}.{}: redeclared by a descendant of {}",
                            level.shape.name, field.name, type_name
                        );
                        continue;
                    }
                }

                level_claims.extend(names.into_iter().flatten().map(|n| (n, delegated)));
                properties.push(self.property(&resolver, level, field, classification));
            }

            for (name, delegated) in level_claims {
                *claimed.entry(name).or_insert(false) |= delegated;
            }
        }

        debug!("Enumerated {} properties of {}", properties.len(), type_name);
        Ok(PropertySet::new(lineage.root(), type_name, properties))
    }

    fn property(
        &self,
        resolver: &Resolver<'c>,
        level: &Level,
        field: &FieldShape,
        classification: Classification<'_>,
    ) -> Property {
        let declared_value = classification.property.map(|p| &p.ty);

        let (delegate, type_tag, value_tag) = match classification.family {
            DelegateFamily::LazyCache => {
                let (storage, wrapped) = resolver.resolve_lazy(level, field, declared_value);
                (DelegateKind::LazyCache(wrapped.clone()), storage, wrapped)
            }
            family => {
                let storage = resolver.resolve_field(level, field);
                let value = match declared_value {
                    Some(expr) if family != DelegateFamily::InterfaceForward => {
                        resolver.resolve_expr(expr, &level.shape, &level.tag)
                    }
                    _ => storage.clone(),
                };
                let delegate = match family {
                    DelegateFamily::None | DelegateFamily::LazyCache => DelegateKind::None,
                    DelegateFamily::InterfaceForward => {
                        DelegateKind::InterfaceForward(storage.clone())
                    }
                    DelegateFamily::ReferenceForward => {
                        DelegateKind::ReferenceForward(storage.clone())
                    }
                    DelegateFamily::MapBacked => DelegateKind::MapBacked,
                    DelegateFamily::CustomProvider => DelegateKind::CustomProvider,
                };
                (delegate, storage, value)
            }
        };

        let resolution = Resolution::of([&type_tag, &value_tag]);
        if let Resolution::Partial { placeholders } = &resolution {
            warn!(
                "Type of {}.{} is partially resolved ({}): unresolved {}",
                level.shape.name,
                classification.canonical_name,
                type_tag,
                placeholders.join(", ")
            );
        }

        Property {
            canonical_name: classification.canonical_name,
            storage_name: field.name.clone(),
            declaring_type: level.shape_ref,
            declaring_type_name: level.shape.name.clone(),
            delegate,
            requires_capability: classification.requires_capability,
            suspected: classification.suspected,
            alias: classification.alias,
            type_tag,
            value_tag,
            resolution,
            flags: field.flags,
        }
    }
}
