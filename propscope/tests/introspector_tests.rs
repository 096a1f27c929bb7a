use std::{sync::Arc, thread};

use propscope::{
    Capabilities, DelegateKind, Introspector, ProbeConfig, ProbeError,
    proptag::{FieldShape, PropertyShape, ShapeRegistry, TypeExpr, TypeShape, TypeTag},
    tests_utils::{normal, sample_introspector, shape_of},
};

#[test]
fn concurrent_first_access_converges() {
    let intro = Arc::new(sample_introspector(Capabilities::default()));
    let ty = shape_of(&intro, "LeafSub");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let intro = Arc::clone(&intro);
            thread::spawn(move || {
                let props = intro.properties(ty).unwrap();
                let mapping = intro.name_mapping(ty).unwrap();
                (props, mapping)
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let (first_props, first_mapping) = &results[0];
    for (props, mapping) in &results {
        assert!(Arc::ptr_eq(first_props, props));
        assert!(Arc::ptr_eq(first_mapping, mapping));
    }
}

#[test]
fn redefinition_is_a_new_version() {
    let intro = sample_introspector(Capabilities::default());
    let old = shape_of(&intro, "Normal");
    assert_eq!(intro.properties(old).unwrap().len(), 2);

    let new = intro
        .registry()
        .register(normal().field(FieldShape::new("z", TypeExpr::simple("Int"))));
    assert_eq!(intro.lookup("Normal").unwrap(), new);
    assert_eq!(intro.properties(new).unwrap().len(), 3);
    assert_eq!(intro.properties(old).unwrap().len(), 2);
}

#[test]
fn redefined_superclass_is_seen_by_cached_subtypes() {
    let registry = Arc::new(ShapeRegistry::default());
    registry.register(TypeShape::new("Base").field(FieldShape::new("a", TypeExpr::simple("Int"))));
    let sub = registry.register(
        TypeShape::new("Sub")
            .extends(TypeExpr::simple("Base"))
            .field(FieldShape::new("s", TypeExpr::simple("Int"))),
    );
    let intro = Introspector::new(
        Arc::clone(&registry),
        ProbeConfig::default(),
        Capabilities::default(),
    );

    let names = |intro: &Introspector| -> Vec<String> {
        let props = intro.properties(sub).unwrap();
        props.canonical_names().map(str::to_string).collect()
    };
    assert_eq!(names(&intro), ["s", "a"]);
    assert_eq!(intro.to_storage_name(sub, "a").unwrap(), "a");
    let before = intro.lineage(sub).unwrap();

    registry.register(
        TypeShape::new("Base")
            .field(FieldShape::new("a", TypeExpr::simple("Int")))
            .field(FieldShape::new("b", TypeExpr::simple("Int"))),
    );
    let after = intro.lineage(sub).unwrap();
    assert_ne!(before, after);
    assert_eq!(before.root(), after.root());

    let fresh = Introspector::new(registry, ProbeConfig::default(), Capabilities::default());
    assert_eq!(names(&intro), ["s", "a", "b"]);
    assert_eq!(names(&intro), names(&fresh));
    assert_eq!(intro.to_storage_name(sub, "b").unwrap(), "b");
}

#[test]
fn unknown_types() {
    let intro = sample_introspector(Capabilities::default());
    assert!(matches!(intro.lookup("Nope"), Err(ProbeError::UnknownType(_))));
}

#[test]
fn conventions_come_from_configuration() {
    let config = ProbeConfig::from_toml_str(
        r#"
        [conventions]
        reference_suffix = "$ref"
        lazy_wrappers = ["my.Memo"]
        "#,
    )
    .unwrap();

    let registry = Arc::new(ShapeRegistry::default());
    let ty = registry.register(
        TypeShape::new("Custom")
            .field(FieldShape::new("a$ref", TypeExpr::simple("Holder")))
            .field(FieldShape::new(
                "b$delegate",
                TypeExpr::named("my.Memo", [TypeExpr::simple("Long")]),
            ))
            .property(PropertyShape::new("a", TypeExpr::simple("Int")))
            .property(PropertyShape::new("b", TypeExpr::simple("Long"))),
    );
    let intro = Introspector::new(registry, config, Capabilities::default());

    let props = intro.properties(ty).unwrap();
    assert_eq!(
        props.get("a").unwrap().delegate,
        DelegateKind::ReferenceForward(TypeTag::simple("Holder"))
    );
    assert_eq!(
        props.get("b").unwrap().delegate,
        DelegateKind::LazyCache(TypeTag::simple("Long"))
    );
}

#[test]
fn global_introspector_is_shared() {
    let a = Introspector::global();
    let b = Introspector::global();
    assert!(std::ptr::eq(a, b));
    assert_eq!(a.capabilities(), Capabilities::detect());
}
