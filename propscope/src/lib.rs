//! Delegation-aware field introspection for class-contract verification.
//!
//! Given the static shape of a type (see [`proptag`]), the engine produces
//! the type's significant state as a set of [`Property`] values, whether
//! each property is a plain field or produced through property delegation
//! (lazy caches, interface delegates, member references, maps or custom
//! providers). Consumers may refer to a property by its canonical name or by
//! its storage identifier; the [`NameMapping`] translates between the two.
//!
//! Most consumers go through [`Introspector`].

pub mod annotations;
pub mod capability;
pub mod context;
pub mod delegate;
pub mod fields;
pub mod introspector;
pub mod magic;
pub mod names;
pub mod resolver;
pub mod selection;
#[cfg(any(test, feature = "test-utils"))]
pub mod tests_utils;
pub mod utils;

pub use annotations::{AnnotationCache, AnnotationRecord, MarkerKind, MarkerTarget};
pub use capability::Capabilities;
pub use context::{Lineage, ProbeContext};
pub use delegate::{DelegateFamily, DelegateKind, DelegateProbe, ValueAccess};
pub use fields::{FieldModel, Property, PropertySet};
pub use introspector::Introspector;
pub use names::NameMapping;
pub use resolver::{FieldTagMemo, Resolution, Resolver};
pub use selection::{FieldSelection, ResolvedSelection};
pub use utils::{
    conf::ProbeConfig,
    error::{ProbeError, ProbeResult},
};

pub extern crate proptag;
