use std::{collections::HashSet, sync::Arc};

use log::{debug, warn};
use proptag::{MarkerSetRef, ShapeRef, ShapeRegistry, TypeShape};

use crate::{
    capability::Capabilities,
    utils::{
        conf::ProbeConfig,
        error::{ProbeError, ProbeResult},
    },
};

/// Everything a single introspection pass reads: the shapes, the
/// conventions and the capability flag. Cheap to copy around by reference.
#[derive(Clone, Copy)]
pub struct ProbeContext<'a> {
    pub registry: &'a ShapeRegistry,
    pub config: &'a ProbeConfig,
    pub capabilities: Capabilities,
}

/// The exact shape versions one introspection of a type reads.
///
/// Superclasses, enclosing types and packages are looked up by name, so a
/// type's result depends on their versions too. Every cache is keyed by a
/// `Lineage`: redefining any of them yields a different key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lineage {
    /// The type itself, then each registered superclass, most-derived first.
    pub ancestors: Vec<ShapeRef>,
    /// Lexically enclosing types of the type, innermost first.
    pub enclosing: Vec<ShapeRef>,
    /// Markers of the type's package.
    pub package: Option<MarkerSetRef>,
}

impl Lineage {
    pub fn root(&self) -> ShapeRef {
        self.ancestors[0]
    }
}

impl<'a> ProbeContext<'a> {
    pub fn new(
        registry: &'a ShapeRegistry,
        config: &'a ProbeConfig,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            registry,
            config,
            capabilities,
        }
    }

    pub fn shape(&self, shape_ref: ShapeRef) -> ProbeResult<Arc<TypeShape>> {
        self.registry
            .get(shape_ref)
            .ok_or_else(|| ProbeError::UnknownType(shape_ref.to_string()))
    }

    /// Pins the current versions of everything `ty` depends on.
    ///
    /// The superclass walk ends at the first unregistered superclass, or at
    /// a superclass already visited.
    pub fn lineage(&self, ty: ShapeRef) -> ProbeResult<Lineage> {
        let root = self.shape(ty)?;
        let mut ancestors = vec![ty];
        let mut visited: HashSet<String> = HashSet::from([root.name.clone()]);

        let mut current = Arc::clone(&root);
        while let Some(name) = current.superclass_name().map(str::to_string) {
            if visited.contains(&name) {
                warn!(
                    "Superclass chain of {} loops back to {}; stopping the walk",
                    root.name, name
                );
                break;
            }
            let Some(super_ref) = self.registry.superclass_of(&current) else {
                debug!("Superclass {} of {} is not registered", name, current.name);
                break;
            };
            ancestors.push(super_ref);
            visited.insert(name);
            current = self.shape(super_ref)?;
        }

        let mut enclosing = Vec::new();
        let mut seen: HashSet<String> = HashSet::from([root.name.clone()]);
        let mut next = root.enclosing.clone();
        while let Some(name) = next {
            if !seen.insert(name.clone()) {
                break;
            }
            let Some(outer_ref) = self.registry.lookup(&name) else {
                break;
            };
            enclosing.push(outer_ref);
            next = self.shape(outer_ref)?.enclosing.clone();
        }

        let package = root
            .package
            .as_deref()
            .and_then(|p| self.registry.package_marker_set(p));

        Ok(Lineage {
            ancestors,
            enclosing,
            package,
        })
    }
}
