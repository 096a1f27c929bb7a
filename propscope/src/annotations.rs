//! Annotation cache
//!
//! Records, once per type, which of the supported markers are present on the
//! type and on each of its storage locations. Markers are recognized by name
//! suffix, so any library (or a user's own marker with the same simple name)
//! is supported without depending on it.
use std::{collections::HashMap, sync::Arc};

use enum_map::{Enum, EnumMap};
use log::debug;
use proptag::Marker;
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::{
    context::{Lineage, ProbeContext},
    delegate::{DelegateProbe, StorageSite},
    resolver::{FieldTagMemo, Resolver},
    utils::{cache::TypeCache, error::ProbeResult},
};

/// The markers that alter verification policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, EnumIter, Display)]
pub enum MarkerKind {
    /// The type promises not to change after construction.
    Immutable,
    NonNull,
    /// Reverts a type-level default for a single field.
    Nullable,
    /// Every field of the type (or package) defaults to non-null.
    DefaultNonNull,
    Entity,
    /// Excluded from the equality contract like a transient field.
    Transient,
    /// Part of an entity's surrogate key.
    Id,
    /// Part of an entity's business key.
    NaturalId,
    /// A link to another entity, initialized on access.
    JpaLinkedField,
    /// A lazily fetched entity field.
    JpaLazyField,
}

impl MarkerKind {
    /// Whether an occurrence on an ancestor also counts for descendants.
    pub fn inherits(self) -> bool {
        matches!(
            self,
            MarkerKind::NonNull
                | MarkerKind::Transient
                | MarkerKind::Id
                | MarkerKind::JpaLinkedField
                | MarkerKind::JpaLazyField
        )
    }

    /// Marker names (or name suffixes) recognized as this kind.
    pub fn descriptors(self) -> &'static [&'static str] {
        match self {
            MarkerKind::Immutable => &["Immutable"],
            MarkerKind::NonNull => &["Nonnull", "NonNull", "NotNull"],
            MarkerKind::Nullable => &["Nullable", "CheckForNull"],
            MarkerKind::DefaultNonNull => &[
                "edu.umd.cs.findbugs.annotations.DefaultAnnotation",
                "edu.umd.cs.findbugs.annotations.DefaultAnnotationForFields",
                "org.eclipse.jdt.annotation.NonNullByDefault",
                "org.jspecify.annotations.NullMarked",
                "org.springframework.lang.NonNullFields",
            ],
            MarkerKind::Entity => &[
                "javax.persistence.Entity",
                "javax.persistence.Embeddable",
                "javax.persistence.MappedSuperclass",
                "jakarta.persistence.Entity",
                "jakarta.persistence.Embeddable",
                "jakarta.persistence.MappedSuperclass",
            ],
            MarkerKind::Transient => {
                &["javax.persistence.Transient", "jakarta.persistence.Transient"]
            }
            MarkerKind::Id => &[
                "javax.persistence.Id",
                "javax.persistence.EmbeddedId",
                "jakarta.persistence.Id",
                "jakarta.persistence.EmbeddedId",
            ],
            MarkerKind::NaturalId => &["org.hibernate.annotations.NaturalId"],
            MarkerKind::JpaLinkedField => &[
                "javax.persistence.OneToOne",
                "javax.persistence.OneToMany",
                "javax.persistence.ManyToOne",
                "javax.persistence.ManyToMany",
                "javax.persistence.ElementCollection",
                "javax.persistence.GeneratedValue",
                "jakarta.persistence.OneToOne",
                "jakarta.persistence.OneToMany",
                "jakarta.persistence.ManyToOne",
                "jakarta.persistence.ManyToMany",
                "jakarta.persistence.ElementCollection",
                "jakarta.persistence.GeneratedValue",
            ],
            MarkerKind::JpaLazyField => {
                &["javax.persistence.Basic", "jakarta.persistence.Basic"]
            }
        }
    }

    /// Returns `true` if `marker` is an occurrence of this kind.
    pub fn matches(self, marker: &Marker) -> bool {
        self.descriptors().iter().any(|d| marker.name.ends_with(d)) && self.validate(marker)
    }

    fn validate(self, marker: &Marker) -> bool {
        match self {
            MarkerKind::DefaultNonNull => {
                if marker.name.ends_with("DefaultAnnotation")
                    || marker.name.ends_with("DefaultAnnotationForFields")
                {
                    let nonnull = MarkerKind::NonNull.descriptors();
                    return marker
                        .values("value")
                        .unwrap_or_default()
                        .iter()
                        .any(|v| nonnull.iter().any(|n| v.contains(n)));
                }
                if marker.name.ends_with("NullMarked") {
                    return true;
                }
                match marker.values("value") {
                    Some(values) => values.iter().any(|v| v == "FIELD"),
                    None => true,
                }
            }
            MarkerKind::JpaLazyField => marker.value("fetch") == Some("LAZY"),
            _ => true,
        }
    }
}

/// Where a marker is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerTarget {
    Type,
    /// A storage location; [`crate::Introspector::has_marker`] also accepts
    /// canonical names here.
    Field(String),
}

/// Marker presence for one type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationRecord {
    type_markers: EnumMap<MarkerKind, bool>,
    fields: HashMap<String, EnumMap<MarkerKind, bool>>,
}

impl AnnotationRecord {
    pub fn has_type(&self, kind: MarkerKind) -> bool {
        self.type_markers[kind]
    }

    pub fn has_field(&self, storage_name: &str, kind: MarkerKind) -> bool {
        self.fields.get(storage_name).is_some_and(|m| m[kind])
    }

    pub fn has(&self, target: &MarkerTarget, kind: MarkerKind) -> bool {
        match target {
            MarkerTarget::Type => self.has_type(kind),
            MarkerTarget::Field(name) => self.has_field(name, kind),
        }
    }
}

/// Accumulates marker occurrences into a record.
struct RecordBuilder<'c> {
    ctx: ProbeContext<'c>,
    record: AnnotationRecord,
}

impl RecordBuilder<'_> {
    fn kinds<'m>(
        &self,
        markers: impl IntoIterator<Item = &'m Marker>,
        inheriting: bool,
    ) -> EnumMap<MarkerKind, bool> {
        let mut found = EnumMap::default();
        for marker in markers {
            if self.ctx.config.ignored_markers.contains(&marker.name) {
                continue;
            }
            for kind in MarkerKind::iter() {
                if (!inheriting || kind.inherits()) && kind.matches(marker) {
                    found[kind] = true;
                }
            }
        }
        found
    }

    fn add_type<'m>(&mut self, markers: impl IntoIterator<Item = &'m Marker>, inheriting: bool) {
        let found = self.kinds(markers, inheriting);
        for (kind, present) in found {
            self.record.type_markers[kind] |= present;
        }
    }

    fn add_field<'m>(
        &mut self,
        storage_name: &str,
        markers: impl IntoIterator<Item = &'m Marker>,
        inheriting: bool,
    ) {
        let found = self.kinds(markers, inheriting);
        let entry = self.record.fields.entry(storage_name.to_string()).or_default();
        for (kind, present) in found {
            entry[kind] |= present;
        }
    }

    fn add_enclosing(&mut self, lineage: &Lineage) -> ProbeResult<()> {
        for &outer_ref in &lineage.enclosing {
            let outer = self.ctx.shape(outer_ref)?;
            self.add_type(&outer.markers, false);
        }
        Ok(())
    }
}

fn build_record(
    ctx: ProbeContext<'_>,
    probe: &DelegateProbe,
    lineage: &Lineage,
) -> ProbeResult<AnnotationRecord> {
    let root = ctx.shape(lineage.root())?;
    let memo = FieldTagMemo::new();
    let levels = Resolver::new(ctx, &memo).hierarchy(lineage, &Resolver::tag_of(&root, []))?;

    let mut builder = RecordBuilder {
        ctx,
        record: AnnotationRecord::default(),
    };

    for (depth, level) in levels.iter().enumerate() {
        let inheriting = depth > 0;
        let shape = &level.shape;
        builder.add_type(&shape.markers, inheriting);

        for field in &shape.fields {
            builder.add_field(&field.name, &field.markers, inheriting);
        }

        if !ctx.capabilities.delegate_metadata {
            continue;
        }
        // Markers on a property declaration belong to the storage backing it.
        let mut backing: HashMap<&str, &str> = HashMap::new();
        for field in &shape.fields {
            let classification = probe.classify(
                &StorageSite {
                    declaring: shape,
                    field,
                },
                &ctx.config.conventions,
                ctx.capabilities,
            );
            if let Some(property) = classification.property {
                backing.insert(property.name.as_str(), field.name.as_str());
            }
        }
        for property in &shape.properties {
            let storage = match backing.get(property.name.as_str()) {
                Some(storage) => *storage,
                None if shape.find_field(&property.name).is_some() => property.name.as_str(),
                None => continue,
            };
            builder.add_field(storage, &property.markers, inheriting);
        }
    }

    builder.add_enclosing(lineage)?;
    if let Some(markers) = lineage.package.and_then(|set| ctx.registry.marker_set(set)) {
        builder.add_type(markers.iter(), false);
    }

    let mut record = builder.record;
    for kind in [MarkerKind::Id, MarkerKind::NaturalId] {
        if record.fields.values().any(|m| m[kind]) {
            record.type_markers[kind] = true;
        }
    }

    Ok(record)
}

/// Process-wide marker index, one record per [`Lineage`].
#[derive(Default)]
pub struct AnnotationCache {
    records: TypeCache<Lineage, AnnotationRecord>,
}

impl AnnotationCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the record of `lineage` on first call, returns the stored one afterwards.
    pub fn build(
        &self,
        ctx: ProbeContext<'_>,
        probe: &DelegateProbe,
        lineage: &Lineage,
    ) -> ProbeResult<Arc<AnnotationRecord>> {
        self.records.get_or_build(lineage.clone(), || {
            debug!("Building annotation record for {}", lineage.root());
            build_record(ctx, probe, lineage)
        })
    }

    /// `false` for lineages whose record was never built.
    pub fn has(&self, lineage: &Lineage, target: &MarkerTarget, kind: MarkerKind) -> bool {
        self.records
            .get(lineage)
            .is_some_and(|record| record.has(target, kind))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
