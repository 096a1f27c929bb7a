//! Type resolver
//!
//! Turns declared [`TypeExpr`]s into [`TypeTag`]s by substituting the
//! placeholders of the declaring type with the arguments recovered from the
//! owning type's tag. The declaring type's tag is found by walking the
//! superclass chain from the owning type down to the declaring type, and
//! substituting each step's parameterized superclass on the way.
//!
//! Field tags are memoized in a [`FieldTagMemo`] shared by every resolver of
//! an introspector. Its key pins the declaring shape version, so an entry
//! never goes stale. Recursive bounds terminate through the stack of
//! placeholders being resolved, not through the memo.
use std::{convert::Infallible, sync::Arc};

use proptag::{FieldShape, ShapeRef, TypeExpr, TypeParam, TypeShape, TypeTag};

use crate::{
    context::{Lineage, ProbeContext},
    utils::{cache::TypeCache, error::ProbeResult},
};

/// Resolved field tags, keyed by declaring shape, field name and the tag the
/// declaring shape is seen under.
pub type FieldTagMemo = TypeCache<(ShapeRef, String, TypeTag), TypeTag>;

/// Whether a resolved tag still contains placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Resolution {
    Complete,
    Partial { placeholders: Vec<String> },
}

impl Resolution {
    /// Summarizes the given tags; placeholders are deduplicated in order of appearance.
    pub fn of<'t>(tags: impl IntoIterator<Item = &'t TypeTag>) -> Self {
        let mut placeholders: Vec<String> = Vec::new();
        for tag in tags {
            for name in tag.unresolved_placeholders() {
                if !placeholders.iter().any(|p| p == name) {
                    placeholders.push(name.to_string());
                }
            }
        }
        if placeholders.is_empty() {
            Resolution::Complete
        } else {
            Resolution::Partial { placeholders }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Resolution::Complete)
    }
}

/// One type of a hierarchy, together with the tag it is seen under from the
/// most-derived type.
#[derive(Debug, Clone)]
pub struct Level {
    pub shape_ref: ShapeRef,
    pub shape: Arc<TypeShape>,
    pub tag: TypeTag,
}

/// Placeholder bindings of one declaring type.
struct Scope<'a> {
    params: &'a [TypeParam],
    args: &'a [TypeTag],
}

impl<'a> Scope<'a> {
    fn new(shape: &'a TypeShape, tag: &'a TypeTag) -> Self {
        Self {
            params: &shape.type_params,
            args: &tag.args,
        }
    }

    fn binding(&self, name: &str) -> Option<&'a TypeTag> {
        self.params
            .iter()
            .position(|p| p.name == name)
            .and_then(|i| self.args.get(i))
    }

    fn param(&self, name: &str) -> Option<&'a TypeParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

pub struct Resolver<'c> {
    ctx: ProbeContext<'c>,
    memo: &'c FieldTagMemo,
}

impl<'c> Resolver<'c> {
    pub fn new(ctx: ProbeContext<'c>, memo: &'c FieldTagMemo) -> Self {
        Self { ctx, memo }
    }

    /// The tag of `shape` applied to `args`.
    pub fn tag_of(shape: &TypeShape, args: impl IntoIterator<Item = TypeTag>) -> TypeTag {
        TypeTag::new(shape.name.clone(), args)
    }

    /// The levels of `lineage`, from the root (seen as `root_tag`) to its
    /// least-derived registered ancestor. Each level's tag is its subtype's
    /// superclass expression resolved in the subtype's scope.
    pub fn hierarchy(&self, lineage: &Lineage, root_tag: &TypeTag) -> ProbeResult<Vec<Level>> {
        let mut levels: Vec<Level> = Vec::with_capacity(lineage.ancestors.len());
        for &shape_ref in &lineage.ancestors {
            let shape = self.ctx.shape(shape_ref)?;
            let tag = match levels.last() {
                None => root_tag.clone(),
                Some(sub) => match sub.shape.superclass.as_ref() {
                    Some(superclass) => self.resolve_expr(superclass, &sub.shape, &sub.tag),
                    None => TypeTag::simple(shape.name.clone()),
                },
            };
            levels.push(Level {
                shape_ref,
                shape,
                tag,
            });
        }
        Ok(levels)
    }

    /// Resolves the declared type of `field` as seen from `level`.
    pub fn resolve_field(&self, level: &Level, field: &FieldShape) -> TypeTag {
        let key = (level.shape_ref, field.name.clone(), level.tag.clone());
        let built = self.memo.get_or_build(key, || {
            Ok::<_, Infallible>(self.resolve_expr(&field.ty, &level.shape, &level.tag))
        });
        let Ok(tag) = built;
        TypeTag::clone(&tag)
    }

    /// Resolves the storage of a lazily cached property.
    ///
    /// Returns the wrapper tag, with the wrapped value tag as its only child,
    /// and the wrapped value tag itself. If the wrapper is declared raw, the
    /// wrapped type comes from `declared_value`.
    pub fn resolve_lazy(
        &self,
        level: &Level,
        field: &FieldShape,
        declared_value: Option<&TypeExpr>,
    ) -> (TypeTag, TypeTag) {
        let wrapper = self.resolve_field(level, field);
        if let Some(wrapped) = wrapper.args.first() {
            let wrapped = wrapped.clone();
            return (wrapper, wrapped);
        }

        let wrapped = match declared_value {
            Some(expr) => self.resolve_expr(expr, &level.shape, &level.tag),
            None => TypeTag::simple(self.ctx.config.top_type.clone()),
        };
        let mut storage = wrapper;
        storage.args.push(wrapped.clone());
        (storage, wrapped)
    }

    /// Resolves `expr` as declared in `declaring`, seen under `declaring_tag`.
    pub fn resolve_expr(
        &self,
        expr: &TypeExpr,
        declaring: &TypeShape,
        declaring_tag: &TypeTag,
    ) -> TypeTag {
        let scope = Scope::new(declaring, declaring_tag);
        let mut resolving = Vec::new();
        self.resolve_in(expr, &scope, &mut resolving)
    }

    fn resolve_in(
        &self,
        expr: &TypeExpr,
        scope: &Scope<'_>,
        resolving: &mut Vec<String>,
    ) -> TypeTag {
        match expr {
            TypeExpr::Named { name, args } => TypeTag::new(
                name.clone(),
                args.iter().map(|arg| self.resolve_in(arg, scope, resolving)),
            ),
            TypeExpr::Array(elem) => TypeTag::array(self.resolve_in(elem, scope, resolving)),
            TypeExpr::Wildcard { upper, lower } => {
                if let Some(bound) = lower.first() {
                    return self.resolve_in(bound, scope, resolving);
                }
                let top = self.ctx.config.top_type.as_str();
                match upper.iter().find(|u| u.raw_name() != Some(top)) {
                    Some(bound) => self.resolve_in(bound, scope, resolving),
                    None => TypeTag::simple(top),
                }
            }
            TypeExpr::Param(name) => {
                if resolving.iter().any(|r| r == name) {
                    return TypeTag::unresolved(name.clone());
                }
                if let Some(bound) = scope.binding(name) {
                    return bound.clone();
                }
                match scope.param(name).and_then(|p| p.bounds.first()) {
                    Some(bound) => {
                        resolving.push(name.clone());
                        let tag = self.resolve_in(bound, scope, resolving);
                        resolving.pop();
                        tag
                    }
                    None => TypeTag::unresolved(name.clone()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptag::{ShapeRegistry, TypeParam};

    use super::*;
    use crate::{capability::Capabilities, utils::conf::ProbeConfig};

    fn resolve(shape: &TypeShape, tag: &TypeTag, expr: &TypeExpr) -> TypeTag {
        let registry = ShapeRegistry::default();
        let config = ProbeConfig::default();
        let memo = FieldTagMemo::new();
        let ctx = ProbeContext::new(&registry, &config, Capabilities::default());
        Resolver::new(ctx, &memo).resolve_expr(expr, shape, tag)
    }

    #[test]
    fn substitutes_bound_placeholders() {
        let shape = TypeShape::new("Box").type_param("T");
        let tag = TypeTag::new("Box", [TypeTag::simple("String")]);
        let expr = TypeExpr::named(
            "List",
            [TypeExpr::named("List", [TypeExpr::param("T")])],
        );

        let resolved = resolve(&shape, &tag, &expr);
        assert_eq!(resolved.to_string(), "List<List<String>>");
        assert_eq!(resolved.depth(), 3);
    }

    #[test]
    fn unbound_placeholders() {
        let shape = TypeShape::new("Box")
            .type_param("T")
            .type_param(TypeParam::new("N").bounded_by(TypeExpr::simple("Number")))
            .type_param(
                TypeParam::new("S")
                    .bounded_by(TypeExpr::named("Comparable", [TypeExpr::param("S")])),
            );
        let raw = TypeTag::simple("Box");

        assert_eq!(resolve(&shape, &raw, &TypeExpr::param("T")), TypeTag::unresolved("T"));
        assert_eq!(resolve(&shape, &raw, &TypeExpr::param("N")), TypeTag::simple("Number"));
        assert_eq!(
            resolve(&shape, &raw, &TypeExpr::param("S")),
            TypeTag::new("Comparable", [TypeTag::unresolved("S")])
        );
    }

    #[test]
    fn wildcards_and_arrays() {
        let shape = TypeShape::new("W");
        let raw = TypeTag::simple("W");

        assert_eq!(
            resolve(&shape, &raw, &TypeExpr::super_of(TypeExpr::simple("Int"))),
            TypeTag::simple("Int")
        );
        assert_eq!(
            resolve(&shape, &raw, &TypeExpr::extends(TypeExpr::simple("Any"))),
            TypeTag::simple("Any")
        );
        assert_eq!(
            resolve(&shape, &raw, &TypeExpr::extends(TypeExpr::simple("Point"))),
            TypeTag::simple("Point")
        );
        assert_eq!(
            resolve(&shape, &raw, &TypeExpr::array(TypeExpr::simple("Int"))).to_string(),
            "Int[]"
        );
    }

    #[test]
    fn resolution_summary() {
        let a = TypeTag::new("Map", [TypeTag::unresolved("K"), TypeTag::unresolved("V")]);
        let b = TypeTag::unresolved("K");
        assert_eq!(
            Resolution::of([&a, &b]),
            Resolution::Partial {
                placeholders: vec!["K".to_string(), "V".to_string()]
            }
        );
        assert!(Resolution::of([&TypeTag::simple("Int")]).is_complete());
    }

    #[test]
    fn field_tags_are_shared_between_resolvers() {
        let registry = ShapeRegistry::default();
        let config = ProbeConfig::default();
        let ctx = ProbeContext::new(&registry, &config, Capabilities::default());
        let memo = FieldTagMemo::new();

        let shape_ref = registry.register(
            TypeShape::new("Box")
                .type_param("T")
                .field(FieldShape::new("value", TypeExpr::param("T"))),
        );
        let lineage = ctx.lineage(shape_ref).unwrap();
        let tag = TypeTag::new("Box", [TypeTag::simple("Int")]);

        for _ in 0..2 {
            let resolver = Resolver::new(ctx, &memo);
            let levels = resolver.hierarchy(&lineage, &tag).unwrap();
            let field = &levels[0].shape.fields[0];
            assert_eq!(resolver.resolve_field(&levels[0], field), TypeTag::simple("Int"));
        }
        assert_eq!(memo.len(), 1);

        let other = TypeTag::new("Box", [TypeTag::simple("String")]);
        let resolver = Resolver::new(ctx, &memo);
        let levels = resolver.hierarchy(&lineage, &other).unwrap();
        let field = &levels[0].shape.fields[0];
        assert_eq!(resolver.resolve_field(&levels[0], field), TypeTag::simple("String"));
        assert_eq!(memo.len(), 2);
    }
}
