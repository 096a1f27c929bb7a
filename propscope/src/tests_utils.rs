//! Sample type shapes, as a Kotlin compiler would emit them, for tests and
//! benchmarks.
use std::sync::Arc;

use proptag::{
    FieldFlags, FieldShape, Marker, PropertyShape, ShapeRef, ShapeRegistry, TypeExpr, TypeParam,
    TypeShape,
};

use crate::{capability::Capabilities, introspector::Introspector, utils::conf::ProbeConfig};

fn int() -> TypeExpr {
    TypeExpr::simple("Int")
}

fn string() -> TypeExpr {
    TypeExpr::simple("String")
}

fn lazy_of(wrapped: TypeExpr) -> TypeExpr {
    TypeExpr::named("kotlin.Lazy", [wrapped])
}

fn raw_lazy() -> TypeExpr {
    TypeExpr::simple("kotlin.Lazy")
}

fn delegate_field(name: &str, ty: TypeExpr) -> FieldShape {
    FieldShape::new(name, ty).with_flags(FieldFlags::FINAL)
}

/// `class Normal(val x: Int, val y: Int)`
pub fn normal() -> TypeShape {
    TypeShape::new("Normal")
        .field(FieldShape::new("x", int()).with_flags(FieldFlags::FINAL))
        .field(FieldShape::new("y", int()).with_flags(FieldFlags::FINAL))
        .property(PropertyShape::new("x", int()))
        .property(PropertyShape::new("y", int()))
}

/// `class Container(val normal: Int) { val delegate by lazy { normal + 1 } }`
///
/// The lazy wrapper is stored raw; the wrapped type only survives in the
/// property declaration.
pub fn container() -> TypeShape {
    TypeShape::new("Container")
        .field(FieldShape::new("normal", int()).with_flags(FieldFlags::FINAL))
        .field(delegate_field("delegate$delegate", raw_lazy()))
        .property(PropertyShape::new("normal", int()))
        .property(PropertyShape::new("delegate", int()))
}

/// `class NestedLazy { val nested by lazy { listOf(listOf(1)) } }`
pub fn nested_lazy() -> TypeShape {
    let nested = TypeExpr::named("List", [TypeExpr::named("List", [int()])]);
    TypeShape::new("NestedLazy")
        .field(delegate_field("nested$delegate", lazy_of(nested.clone())))
        .property(PropertyShape::new("nested", nested))
}

/// `class TwoLazy(val n: Int) { val a by lazy { n }; val b by lazy { "$n" } }`
pub fn two_lazy() -> TypeShape {
    TypeShape::new("TwoLazy")
        .field(FieldShape::new("n", int()).with_flags(FieldFlags::FINAL))
        .field(delegate_field("a$delegate", lazy_of(int())))
        .field(delegate_field("b$delegate", lazy_of(string())))
        .property(PropertyShape::new("n", int()))
        .property(PropertyShape::new("a", int()))
        .property(PropertyShape::new("b", string()))
}

/// `class InterfaceDelegation(foo: Foo) : Foo by foo`
pub fn interface_delegation() -> TypeShape {
    TypeShape::new("InterfaceDelegation")
        .field(
            FieldShape::new("$$delegate_0", TypeExpr::simple("Foo"))
                .with_flags(FieldFlags::FINAL | FieldFlags::SYNTHETIC),
        )
        .property(PropertyShape::new("bar", int()))
}

/// `class ObjectDelegation(val container: IntContainer) { val foo by container::foo }`
pub fn object_delegation() -> TypeShape {
    TypeShape::new("ObjectDelegation")
        .field(
            FieldShape::new("container", TypeExpr::simple("IntContainer"))
                .with_flags(FieldFlags::FINAL),
        )
        .field(delegate_field("foo$receiver", TypeExpr::simple("IntContainer")))
        .property(PropertyShape::new("container", TypeExpr::simple("IntContainer")))
        .property(PropertyShape::new("foo", int()))
}

/// `class MapDelegation(val map: Map<String, Any?>) { val name: String by map }`
pub fn map_delegation() -> TypeShape {
    let map = TypeExpr::named("Map", [string(), TypeExpr::simple("Any")]);
    TypeShape::new("MapDelegation")
        .field(FieldShape::new("map", map.clone()).with_flags(FieldFlags::FINAL))
        .field(delegate_field("name$delegate", map.clone()))
        .property(PropertyShape::new("map", map))
        .property(PropertyShape::new("name", string()))
}

/// `class ReflectionDelegation { val prop: String by ReadOnlyProvider() }`
pub fn provider_delegation() -> TypeShape {
    TypeShape::new("ReflectionDelegation")
        .field(delegate_field("prop$delegate", TypeExpr::simple("ReadOnlyProvider")))
        .property(PropertyShape::new("prop", string()))
}

/// `open class Base { open val x: Int = 1 }`
pub fn base() -> TypeShape {
    TypeShape::new("Base")
        .field(FieldShape::new("x", int()))
        .property(PropertyShape::new("x", int()))
}

/// `class LazySub : Base() { override val x by lazy { 2 } }`
pub fn lazy_sub() -> TypeShape {
    TypeShape::new("LazySub")
        .extends(TypeExpr::simple("Base"))
        .field(delegate_field("x$delegate", lazy_of(int())))
        .property(PropertyShape::new("x", int()))
}

/// Two plain fields with the same name in a class and its superclass.
pub fn plain_base() -> TypeShape {
    TypeShape::new("PlainBase").field(FieldShape::new("shadow", int()))
}

pub fn plain_sub() -> TypeShape {
    TypeShape::new("PlainSub")
        .extends(TypeExpr::simple("PlainBase"))
        .field(FieldShape::new("shadow", string()))
}

/// ```text
/// open class GenericBase<T> {
///     val items: List<T>; val array: Array<T>; val bounded: List<out T>
/// }
/// ```
pub fn generic_base() -> TypeShape {
    TypeShape::new("GenericBase")
        .type_param("T")
        .field(FieldShape::new("items", TypeExpr::named("List", [TypeExpr::param("T")])))
        .field(FieldShape::new("array", TypeExpr::array(TypeExpr::param("T"))))
        .field(FieldShape::new(
            "bounded",
            TypeExpr::named("List", [TypeExpr::extends(TypeExpr::param("T"))]),
        ))
}

/// `class StringSub : GenericBase<String>()`
pub fn string_sub() -> TypeShape {
    TypeShape::new("StringSub").extends(TypeExpr::named("GenericBase", [string()]))
}

/// `open class MiddleSub<U> : GenericBase<List<U>>() { val own: U }`
pub fn middle_sub() -> TypeShape {
    TypeShape::new("MiddleSub")
        .type_param("U")
        .extends(TypeExpr::named(
            "GenericBase",
            [TypeExpr::named("List", [TypeExpr::param("U")])],
        ))
        .field(FieldShape::new("own", TypeExpr::param("U")))
}

/// `class LeafSub : MiddleSub<Int>() { val lazyList by lazy { listOf(1) } }`
pub fn leaf_sub() -> TypeShape {
    TypeShape::new("LeafSub")
        .extends(TypeExpr::named("MiddleSub", [int()]))
        .field(delegate_field(
            "lazyList$delegate",
            lazy_of(TypeExpr::named("List", [int()])),
        ))
        .property(PropertyShape::new("lazyList", TypeExpr::named("List", [int()])))
}

/// `class SelfBounded<S : Comparable<S>>(val value: S, val other: Any)`
pub fn self_bounded() -> TypeShape {
    TypeShape::new("SelfBounded")
        .type_param(
            TypeParam::new("S")
                .bounded_by(TypeExpr::named("Comparable", [TypeExpr::param("S")])),
        )
        .field(FieldShape::new("value", TypeExpr::param("S")))
        .field(FieldShape::new("other", TypeExpr::simple("Any")))
}

/// Tooling artifacts next to one real field.
pub fn instrumented() -> TypeShape {
    TypeShape::new("Instrumented")
        .field(FieldShape::new("COUNT", int()).with_flags(FieldFlags::STATIC))
        .field(FieldShape::new("__cobertura_counters", TypeExpr::array(int())))
        .field(FieldShape::new("bitmap$init$0", TypeExpr::simple("Byte")))
        .field(FieldShape::new("$stable", int()).with_flags(FieldFlags::SYNTHETIC))
        .field(FieldShape::new("value", int()))
        .property(PropertyShape::new("value", int()))
}

pub const ENTITY_PACKAGE: &str = "com.example.model";

/// A JPA entity in a null-marked package.
pub fn order_entity() -> TypeShape {
    TypeShape::new("com.example.model.Order")
        .in_package(ENTITY_PACKAGE)
        .marker(Marker::new("jakarta.persistence.Entity"))
        .field(
            FieldShape::new("id", TypeExpr::simple("Long"))
                .with_marker(Marker::new("jakarta.persistence.Id")),
        )
        .field(
            FieldShape::new("customer", TypeExpr::simple("Customer"))
                .with_marker(Marker::new("jakarta.persistence.ManyToOne")),
        )
        .field(
            FieldShape::new("notes", string())
                .with_marker(Marker::new("jakarta.persistence.Basic").with_value("fetch", "LAZY")),
        )
        .field(delegate_field("summary$delegate", lazy_of(string())))
        .property(PropertyShape::new("id", TypeExpr::simple("Long")))
        .property(PropertyShape::new("customer", TypeExpr::simple("Customer")))
        .property(
            PropertyShape::new("notes", string())
                .with_marker(Marker::new("javax.annotation.Nullable")),
        )
        .property(
            PropertyShape::new("summary", string())
                .with_marker(Marker::new("jakarta.persistence.Transient")),
        )
}

/// `@Entity class SpecialOrder : Order()` with its own immutable marker, which
/// does not inherit.
pub fn special_order() -> TypeShape {
    TypeShape::new("com.example.model.SpecialOrder")
        .in_package(ENTITY_PACKAGE)
        .extends(TypeExpr::simple("com.example.model.Order"))
        .field(FieldShape::new("discount", int()))
}

/// `@Immutable class Outer { class Inner(val v: Int) }`
pub fn outer() -> TypeShape {
    TypeShape::new("Outer").marker(Marker::new("javax.annotation.concurrent.Immutable"))
}

pub fn inner() -> TypeShape {
    TypeShape::new("Outer$Inner")
        .nested_in("Outer")
        .field(FieldShape::new("v", int()))
}

/// Every sample shape, superclasses before subclasses.
pub fn all_shapes() -> Vec<TypeShape> {
    vec![
        normal(),
        container(),
        nested_lazy(),
        two_lazy(),
        interface_delegation(),
        object_delegation(),
        map_delegation(),
        provider_delegation(),
        base(),
        lazy_sub(),
        plain_base(),
        plain_sub(),
        generic_base(),
        string_sub(),
        middle_sub(),
        leaf_sub(),
        self_bounded(),
        instrumented(),
        order_entity(),
        special_order(),
        outer(),
        inner(),
    ]
}

/// A registry holding [`all_shapes`] and the markers of [`ENTITY_PACKAGE`].
pub fn sample_registry() -> ShapeRegistry {
    let registry = ShapeRegistry::new([0x70, 0x72, 0x6f, 0x70, 0x73, 0x63]);
    for shape in all_shapes() {
        registry.register(shape);
    }
    registry.register_package_markers(
        ENTITY_PACKAGE,
        [Marker::new("org.jspecify.annotations.NullMarked")],
    );
    registry
}

/// An introspector over [`sample_registry`] with default configuration.
pub fn sample_introspector(capabilities: Capabilities) -> Introspector {
    Introspector::new(Arc::new(sample_registry()), ProbeConfig::default(), capabilities)
}

/// Looks up a sample shape by name.
pub fn shape_of(introspector: &Introspector, name: &str) -> ShapeRef {
    introspector
        .lookup(name)
        .unwrap_or_else(|e| panic!("sample shape missing: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_names_are_unique() {
        let registry = sample_registry();
        assert_eq!(registry.len(), all_shapes().len());
        for shape in all_shapes() {
            assert_eq!(registry.versions(&shape.name).len(), 1, "{}", shape.name);
        }
    }
}
