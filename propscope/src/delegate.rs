//! Delegate probe
//!
//! Classifies a single physical storage location by the naming and type
//! shape conventions of property delegation. Each convention is an
//! independent [`DelegateMatcher`]; [`DelegateProbe`] evaluates them in order
//! and the first match wins:
//!
//! 1. interface forward (`$$delegate_<N>`),
//! 2. lazy cache (`<name>$delegate` holding a lazy wrapper),
//! 3. reference forward (`<name>$receiver`),
//! 4. map-backed (`<name>$delegate` holding a key-value map),
//! 5. custom provider (any other `<name>$delegate`).
//!
//! The probe only looks at declarations. It never reads a value and never
//! forces a lazy wrapper.
use log::trace;
use proptag::{FieldShape, PropertyShape, TypeShape, TypeTag};
use strum::EnumDiscriminants;

use crate::{capability::Capabilities, utils::conf::DelegateConventions};

/// How a property's value is produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(name(DelegateFamily), derive(Hash, PartialOrd, Ord))]
pub enum DelegateKind {
    /// A plain field.
    None,
    /// A lazily computed, cached value. Carries the wrapped value type.
    LazyCache(TypeTag),
    /// A compiler-generated delegate implementing an interface. Carries the
    /// delegate's storage type.
    InterfaceForward(TypeTag),
    /// Forwarded to another object's member. Carries the receiver type.
    ReferenceForward(TypeTag),
    /// Looked up in a key-value map by the property's canonical name.
    MapBacked,
    /// Produced by a user-supplied provider object.
    CustomProvider,
}

impl std::fmt::Display for DelegateFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DelegateFamily::None => write!(f, "no"),
            DelegateFamily::LazyCache => write!(f, "lazy"),
            DelegateFamily::InterfaceForward => write!(f, "interface"),
            DelegateFamily::ReferenceForward => write!(f, "member reference"),
            DelegateFamily::MapBacked => write!(f, "map"),
            DelegateFamily::CustomProvider => write!(f, "custom provider"),
        }
    }
}

/// How a consumer would read the value of a property of a given kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueAccess {
    /// Read the storage directly.
    Field,
    /// Read the storage, then take the value out of the lazy wrapper.
    UnwrapLazy,
    /// Invoke the interface member on the instance itself.
    InvokeInterfaceMember,
    /// Invoke the referenced accessor on the stored receiver.
    InvokeReferencedAccessor,
    /// Look `key` up in the stored map.
    MapLookup { key: String },
    /// Ask the stored provider for the value.
    InvokeProvider,
}

impl DelegateKind {
    pub fn family(&self) -> DelegateFamily {
        self.into()
    }

    pub fn is_delegated(&self) -> bool {
        !matches!(self, DelegateKind::None)
    }

    /// The value-extraction rule for a property called `canonical_name`.
    pub fn access(&self, canonical_name: &str) -> ValueAccess {
        match self {
            DelegateKind::None => ValueAccess::Field,
            DelegateKind::LazyCache(_) => ValueAccess::UnwrapLazy,
            DelegateKind::InterfaceForward(_) => ValueAccess::InvokeInterfaceMember,
            DelegateKind::ReferenceForward(_) => ValueAccess::InvokeReferencedAccessor,
            DelegateKind::MapBacked => ValueAccess::MapLookup {
                key: canonical_name.to_string(),
            },
            DelegateKind::CustomProvider => ValueAccess::InvokeProvider,
        }
    }
}

/// What a convention needs from the delegate metadata facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityGate {
    /// Recognizable from the storage alone.
    Never,
    /// The storage is ordinary state without the facility, but its canonical
    /// name can only be confirmed with it.
    AliasOnly,
    /// The value is unreachable without the facility.
    Required,
}

/// The location being classified.
pub struct StorageSite<'a> {
    pub declaring: &'a TypeShape,
    pub field: &'a FieldShape,
}

/// A syntactic match: the convention recognized the storage identifier and
/// the storage type shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionMatch {
    pub canonical_name: String,
}

/// One naming convention.
pub trait DelegateMatcher: Send + Sync {
    fn family(&self) -> DelegateFamily;

    fn gate(&self) -> CapabilityGate;

    fn matches(&self, site: &StorageSite<'_>, conventions: &DelegateConventions)
    -> Option<ConventionMatch>;
}

fn strip_suffix<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    name.strip_suffix(suffix).filter(|stem| !stem.is_empty())
}

pub struct InterfaceMatcher;

impl DelegateMatcher for InterfaceMatcher {
    fn family(&self) -> DelegateFamily {
        DelegateFamily::InterfaceForward
    }

    fn gate(&self) -> CapabilityGate {
        CapabilityGate::Never
    }

    fn matches(
        &self,
        site: &StorageSite<'_>,
        conventions: &DelegateConventions,
    ) -> Option<ConventionMatch> {
        let index = site.field.name.strip_prefix(conventions.interface_prefix.as_str())?;
        if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(ConventionMatch {
            canonical_name: site.field.name.clone(),
        })
    }
}

pub struct LazyMatcher;

impl DelegateMatcher for LazyMatcher {
    fn family(&self) -> DelegateFamily {
        DelegateFamily::LazyCache
    }

    fn gate(&self) -> CapabilityGate {
        CapabilityGate::Required
    }

    fn matches(
        &self,
        site: &StorageSite<'_>,
        conventions: &DelegateConventions,
    ) -> Option<ConventionMatch> {
        let stem = strip_suffix(&site.field.name, &conventions.lazy_suffix)?;
        let wrapper = site.field.ty.raw_name()?;
        conventions
            .is_lazy_wrapper(wrapper)
            .then(|| ConventionMatch {
                canonical_name: stem.to_string(),
            })
    }
}

pub struct ReferenceMatcher;

impl DelegateMatcher for ReferenceMatcher {
    fn family(&self) -> DelegateFamily {
        DelegateFamily::ReferenceForward
    }

    fn gate(&self) -> CapabilityGate {
        CapabilityGate::AliasOnly
    }

    fn matches(
        &self,
        site: &StorageSite<'_>,
        conventions: &DelegateConventions,
    ) -> Option<ConventionMatch> {
        strip_suffix(&site.field.name, &conventions.reference_suffix).map(|stem| ConventionMatch {
            canonical_name: stem.to_string(),
        })
    }
}

pub struct MapMatcher;

impl DelegateMatcher for MapMatcher {
    fn family(&self) -> DelegateFamily {
        DelegateFamily::MapBacked
    }

    fn gate(&self) -> CapabilityGate {
        CapabilityGate::AliasOnly
    }

    fn matches(
        &self,
        site: &StorageSite<'_>,
        conventions: &DelegateConventions,
    ) -> Option<ConventionMatch> {
        let stem = strip_suffix(&site.field.name, &conventions.provider_suffix)?;
        let map = site.field.ty.raw_name()?;
        conventions.is_map_type(map).then(|| ConventionMatch {
            canonical_name: stem.to_string(),
        })
    }
}

pub struct ProviderMatcher;

impl DelegateMatcher for ProviderMatcher {
    fn family(&self) -> DelegateFamily {
        DelegateFamily::CustomProvider
    }

    fn gate(&self) -> CapabilityGate {
        CapabilityGate::Required
    }

    fn matches(
        &self,
        site: &StorageSite<'_>,
        conventions: &DelegateConventions,
    ) -> Option<ConventionMatch> {
        strip_suffix(&site.field.name, &conventions.provider_suffix).map(|stem| ConventionMatch {
            canonical_name: stem.to_string(),
        })
    }
}

/// The outcome of classifying one storage location, before type resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification<'a> {
    /// The confirmed delegation family. `None` when nothing matched, and also
    /// when a match could not be confirmed for lack of the facility.
    pub family: DelegateFamily,
    pub canonical_name: String,
    /// The value of this location is unreachable without the facility.
    pub requires_capability: bool,
    /// The family a convention recognized but could not confirm.
    pub suspected: Option<DelegateFamily>,
    /// The would-be canonical name of an unconfirmed match.
    pub alias: Option<String>,
    /// The logical property declaration backing a confirmed match.
    pub property: Option<&'a PropertyShape>,
}

impl Classification<'_> {
    fn plain(field: &FieldShape) -> Self {
        Self {
            family: DelegateFamily::None,
            canonical_name: field.name.clone(),
            requires_capability: false,
            suspected: None,
            alias: None,
            property: None,
        }
    }

    /// `true` if a convention matched, confirmed or not.
    pub fn is_convention_match(&self) -> bool {
        self.family != DelegateFamily::None || self.suspected.is_some()
    }

    /// The name used to detect a descendant overriding an ancestor's storage.
    pub fn logical_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.canonical_name)
    }
}

/// An ordered set of naming conventions.
pub struct DelegateProbe {
    matchers: Vec<Box<dyn DelegateMatcher>>,
}

impl Default for DelegateProbe {
    fn default() -> Self {
        Self::new(vec![
            Box::new(InterfaceMatcher),
            Box::new(LazyMatcher),
            Box::new(ReferenceMatcher),
            Box::new(MapMatcher),
            Box::new(ProviderMatcher),
        ])
    }
}

impl DelegateProbe {
    pub fn new(matchers: Vec<Box<dyn DelegateMatcher>>) -> Self {
        Self { matchers }
    }

    /// Classify the storage location `site.field` of `site.declaring`.
    ///
    /// With the delegate metadata facility, a gated convention only matches
    /// if the declaring type also declares a property under the derived
    /// canonical name; otherwise the next convention is tried. Without it, the
    /// first syntactic match of a gated convention degrades to
    /// [`DelegateFamily::None`] and is reported through `suspected`.
    pub fn classify<'a>(
        &self,
        site: &StorageSite<'a>,
        conventions: &DelegateConventions,
        capabilities: Capabilities,
    ) -> Classification<'a> {
        for matcher in &self.matchers {
            let Some(found) = matcher.matches(site, conventions) else {
                continue;
            };

            let family = matcher.family();
            let gate = matcher.gate();

            if gate == CapabilityGate::Never {
                trace!(
                    "{}.{} classified as {} delegate",
                    site.declaring.name, site.field.name, family
                );
                return Classification {
                    family,
                    canonical_name: found.canonical_name,
                    requires_capability: false,
                    suspected: None,
                    alias: None,
                    property: None,
                };
            }

            if !capabilities.delegate_metadata {
                trace!(
                    "{}.{} looks like a {} delegate, but delegate metadata is unavailable",
                    site.declaring.name, site.field.name, family
                );
                return Classification {
                    family: DelegateFamily::None,
                    canonical_name: site.field.name.clone(),
                    requires_capability: gate == CapabilityGate::Required,
                    suspected: Some(family),
                    alias: Some(found.canonical_name),
                    property: None,
                };
            }

            match site.declaring.find_property(&found.canonical_name) {
                Some(property) => {
                    trace!(
                        "{}.{} classified as {} delegate",
                        site.declaring.name, site.field.name, family
                    );
                    return Classification {
                        family,
                        canonical_name: found.canonical_name,
                        requires_capability: false,
                        suspected: None,
                        alias: None,
                        property: Some(property),
                    };
                }
                None => trace!(
                    "{}.{} matches the {} convention but no property '{}' is declared",
                    site.declaring.name, site.field.name, family, found.canonical_name
                ),
            }
        }

        Classification::plain(site.field)
    }
}
