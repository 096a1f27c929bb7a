//! Introspector
//!
//! The entry point consumers use. It owns the shape registry, the
//! configuration, the detected capabilities and one [`TypeCache`] per derived
//! artifact. Every artifact is keyed by the [`Lineage`] of the type: its own
//! [`ShapeRef`] plus the versions of its ancestors, enclosing types and
//! package current at query time. Redefining any of them (registering it
//! again, with a new reference) makes the next query introspect afresh.
use std::sync::Arc;

use log::{debug, warn};
use once_cell::sync::Lazy;
use proptag::{ShapeRef, ShapeRegistry, TypeTag};

use crate::{
    annotations::{AnnotationCache, AnnotationRecord, MarkerKind, MarkerTarget},
    capability::Capabilities,
    context::{Lineage, ProbeContext},
    delegate::DelegateProbe,
    fields::{FieldModel, PropertySet},
    names::NameMapping,
    resolver::{FieldTagMemo, Resolver},
    utils::{
        cache::TypeCache,
        conf::ProbeConfig,
        error::{ProbeError, ProbeResult},
    },
};

static GLOBAL: Lazy<Introspector> = Lazy::new(|| {
    let config = ProbeConfig::from_env().unwrap_or_else(|e| {
        warn!("Ignoring propscope configuration: {}", e);
        ProbeConfig::default()
    });
    Introspector::new(Arc::new(ShapeRegistry::default()), config, Capabilities::detect())
});

pub struct Introspector {
    registry: Arc<ShapeRegistry>,
    config: ProbeConfig,
    capabilities: Capabilities,
    probe: DelegateProbe,
    field_tags: FieldTagMemo,
    properties: TypeCache<(Lineage, TypeTag), PropertySet>,
    raw_properties: TypeCache<(Lineage, TypeTag), PropertySet>,
    mappings: TypeCache<Lineage, NameMapping>,
    annotations: AnnotationCache,
}

impl Introspector {
    pub fn new(
        registry: Arc<ShapeRegistry>,
        config: ProbeConfig,
        capabilities: Capabilities,
    ) -> Self {
        Self::with_probe(registry, config, capabilities, DelegateProbe::default())
    }

    /// Like [`Introspector::new`], with a custom set of delegate conventions.
    pub fn with_probe(
        registry: Arc<ShapeRegistry>,
        config: ProbeConfig,
        capabilities: Capabilities,
        probe: DelegateProbe,
    ) -> Self {
        Self {
            registry,
            config,
            capabilities,
            probe,
            field_tags: FieldTagMemo::new(),
            properties: TypeCache::new(),
            raw_properties: TypeCache::new(),
            mappings: TypeCache::new(),
            annotations: AnnotationCache::new(),
        }
    }

    /// The process-wide introspector: an empty registry, the configuration
    /// named by the environment and the detected capabilities.
    pub fn global() -> &'static Introspector {
        &GLOBAL
    }

    pub fn registry(&self) -> &ShapeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn context(&self) -> ProbeContext<'_> {
        ProbeContext::new(&self.registry, &self.config, self.capabilities)
    }

    /// The latest registered version of the type called `name`.
    pub fn lookup(&self, name: &str) -> ProbeResult<ShapeRef> {
        self.registry
            .lookup(name)
            .ok_or_else(|| ProbeError::UnknownType(name.to_string()))
    }

    /// The versions `ty`'s introspection currently depends on.
    pub fn lineage(&self, ty: ShapeRef) -> ProbeResult<Lineage> {
        self.context().lineage(ty)
    }

    fn raw_tag(&self, ty: ShapeRef) -> ProbeResult<TypeTag> {
        let shape = self.context().shape(ty)?;
        Ok(Resolver::tag_of(&shape, []))
    }

    fn field_model(&self) -> FieldModel<'_> {
        FieldModel::new(self.context(), &self.probe, &self.field_tags)
    }

    /// The significant properties of `ty`, its type parameters left unbound.
    pub fn properties(&self, ty: ShapeRef) -> ProbeResult<Arc<PropertySet>> {
        let tag = self.raw_tag(ty)?;
        self.properties_as(ty, tag)
    }

    /// The significant properties of `ty` seen as the parameterization `owning_tag`.
    pub fn properties_as(
        &self,
        ty: ShapeRef,
        owning_tag: TypeTag,
    ) -> ProbeResult<Arc<PropertySet>> {
        let key = (self.lineage(ty)?, owning_tag);
        self.properties.get_or_build(key.clone(), || {
            debug!("Enumerating properties of {} as {}", ty, key.1);
            self.field_model().enumerate(&key.0, &key.1)
        })
    }

    /// Every storage location of `ty`, for diagnostics.
    pub fn properties_raw(&self, ty: ShapeRef) -> ProbeResult<Arc<PropertySet>> {
        let key = (self.lineage(ty)?, self.raw_tag(ty)?);
        self.raw_properties.get_or_build(key.clone(), || {
            self.field_model().enumerate_raw(&key.0, &key.1)
        })
    }

    pub fn name_mapping(&self, ty: ShapeRef) -> ProbeResult<Arc<NameMapping>> {
        self.mappings.get_or_build(self.lineage(ty)?, || {
            let properties = self.properties(ty)?;
            Ok(NameMapping::build(&properties))
        })
    }

    pub fn to_storage_name(&self, ty: ShapeRef, name: &str) -> ProbeResult<String> {
        self.name_mapping(ty)?.to_storage_name(name)
    }

    pub fn to_canonical_name(&self, ty: ShapeRef, name: &str) -> ProbeResult<String> {
        self.name_mapping(ty)?.to_canonical_name(name)
    }

    pub fn annotations(&self, ty: ShapeRef) -> ProbeResult<Arc<AnnotationRecord>> {
        let lineage = self.lineage(ty)?;
        self.annotations.build(self.context(), &self.probe, &lineage)
    }

    /// Marker presence on `ty` or one of its fields. Field targets accept
    /// either name form.
    pub fn has_marker(
        &self,
        ty: ShapeRef,
        target: &MarkerTarget,
        kind: MarkerKind,
    ) -> ProbeResult<bool> {
        let record = self.annotations(ty)?;
        match target {
            MarkerTarget::Type => Ok(record.has_type(kind)),
            MarkerTarget::Field(name) => {
                let storage = self.to_storage_name(ty, name)?;
                Ok(record.has_field(&storage, kind))
            }
        }
    }

    /// Fails with [`ProbeError::CapabilityRequired`] if some state of `ty`
    /// is invisible without the delegate metadata facility.
    pub fn check_capability(&self, ty: ShapeRef) -> ProbeResult<()> {
        match self.properties(ty)?.capability_error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
