use propscope::{
    Capabilities, DelegateKind, Introspector, Property, Resolution, ValueAccess,
    proptag::{TagHead, TypeTag},
    tests_utils::{sample_introspector, shape_of},
};

fn introspector() -> Introspector {
    sample_introspector(Capabilities::with_delegate_metadata(true))
}

fn names(props: &[Property]) -> Vec<(&str, &str)> {
    props
        .iter()
        .map(|p| (p.canonical_name.as_str(), p.storage_name.as_str()))
        .collect()
}

fn collect(intro: &Introspector, ty: &str) -> Vec<Property> {
    intro
        .properties(shape_of(intro, ty))
        .unwrap()
        .iter()
        .cloned()
        .collect()
}

#[test]
fn plain_types_enumerate_like_fields() {
    let intro = introspector();
    let ty = shape_of(&intro, "Normal");
    let props = intro.properties(ty).unwrap();
    let raw = intro.properties_raw(ty).unwrap();

    assert_eq!(props.len(), 2);
    assert_eq!(*props, *raw);
    for p in props.iter() {
        assert_eq!(p.delegate, DelegateKind::None);
        assert_eq!(p.canonical_name, p.storage_name);
        assert_eq!(p.access(), ValueAccess::Field);
        assert!(!p.requires_capability);
    }
}

#[test]
fn container_with_lazy_property() {
    let intro = introspector();
    let props = collect(&intro, "Container");

    assert_eq!(
        names(&props),
        vec![("normal", "normal"), ("delegate", "delegate$delegate")]
    );

    let delegate = &props[1];
    assert_eq!(delegate.delegate, DelegateKind::LazyCache(TypeTag::simple("Int")));
    assert_eq!(delegate.type_tag.to_string(), "kotlin.Lazy<Int>");
    assert_eq!(delegate.value_tag(), &TypeTag::simple("Int"));
    assert_eq!(delegate.access(), ValueAccess::UnwrapLazy);
    assert!(delegate.resolution.is_complete());
}

#[test]
fn several_lazy_properties() {
    let intro = introspector();
    let props = collect(&intro, "TwoLazy");

    assert_eq!(
        names(&props),
        vec![("n", "n"), ("a", "a$delegate"), ("b", "b$delegate")]
    );
    assert_eq!(props[2].delegate, DelegateKind::LazyCache(TypeTag::simple("String")));
}

#[test]
fn nested_generic_depth_is_preserved() {
    let intro = introspector();
    let props = collect(&intro, "NestedLazy");

    let nested = &props[0];
    assert_eq!(nested.value_tag().to_string(), "List<List<Int>>");
    assert_eq!(nested.value_tag().depth(), 3);
    assert_eq!(nested.type_tag.depth(), 4);
}

#[test]
fn interface_delegate_is_kept_under_its_storage_name() {
    let intro = introspector();
    let props = collect(&intro, "InterfaceDelegation");

    assert_eq!(names(&props), vec![("$$delegate_0", "$$delegate_0")]);
    assert_eq!(
        props[0].delegate,
        DelegateKind::InterfaceForward(TypeTag::simple("Foo"))
    );
    assert_eq!(props[0].access(), ValueAccess::InvokeInterfaceMember);
}

#[test]
fn reference_map_and_provider_delegates() {
    let intro = introspector();

    let object = collect(&intro, "ObjectDelegation");
    assert_eq!(
        names(&object),
        vec![("container", "container"), ("foo", "foo$receiver")]
    );
    assert_eq!(
        object[1].delegate,
        DelegateKind::ReferenceForward(TypeTag::simple("IntContainer"))
    );
    assert_eq!(object[1].value_tag(), &TypeTag::simple("Int"));

    let map = collect(&intro, "MapDelegation");
    assert_eq!(map[1].delegate, DelegateKind::MapBacked);
    assert_eq!(
        map[1].access(),
        ValueAccess::MapLookup {
            key: "name".to_string()
        }
    );
    assert_eq!(map[1].value_tag(), &TypeTag::simple("String"));
    assert_eq!(map[1].type_tag.to_string(), "Map<String, Any>");

    let provider = collect(&intro, "ReflectionDelegation");
    assert_eq!(names(&provider), vec![("prop", "prop$delegate")]);
    assert_eq!(provider[0].delegate, DelegateKind::CustomProvider);
}

#[test]
fn delegated_override_suppresses_ancestor_storage() {
    let intro = introspector();
    let ty = shape_of(&intro, "LazySub");

    let props = intro.properties(ty).unwrap();
    assert_eq!(props.len(), 1);
    let x = props.get("x").unwrap();
    assert_eq!(x.storage_name, "x$delegate");
    assert_eq!(x.declaring_type, ty);

    let raw = intro.properties_raw(ty).unwrap();
    let raw: Vec<_> = raw
        .iter()
        .map(|p| (p.storage_name.as_str(), p.declaring_type_name.as_str()))
        .collect();
    assert_eq!(raw, vec![("x$delegate", "LazySub"), ("x", "Base")]);
}

#[test]
fn plain_shadowing_keeps_both_fields() {
    let intro = introspector();
    let props = intro.properties(shape_of(&intro, "PlainSub")).unwrap();

    assert_eq!(props.len(), 2);
    assert_eq!(props.get("shadow").unwrap().declaring_type_name, "PlainSub");
    assert_eq!(props.get("shadow").unwrap().type_tag, TypeTag::simple("String"));
}

#[test]
fn tooling_storage_is_not_state() {
    let intro = introspector();
    let props = collect(&intro, "Instrumented");
    assert_eq!(names(&props), vec![("value", "value")]);
}

#[test]
fn ancestor_parameters_are_substituted() {
    let intro = introspector();

    let string_sub = intro.properties(shape_of(&intro, "StringSub")).unwrap();
    let tags: Vec<_> = string_sub
        .iter()
        .map(|p| (p.canonical_name.as_str(), p.type_tag.to_string()))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("items", "List<String>".to_string()),
            ("array", "String[]".to_string()),
            ("bounded", "List<String>".to_string()),
        ]
    );

    let leaf = intro.properties(shape_of(&intro, "LeafSub")).unwrap();
    let tags: Vec<_> = leaf
        .iter()
        .map(|p| (p.canonical_name.as_str(), p.value_tag().to_string()))
        .collect();
    assert_eq!(
        tags,
        vec![
            ("lazyList", "List<Int>".to_string()),
            ("own", "Int".to_string()),
            ("items", "List<List<Int>>".to_string()),
            ("array", "List<Int>[]".to_string()),
            ("bounded", "List<List<Int>>".to_string()),
        ]
    );
    assert!(leaf.iter().all(|p| p.resolution.is_complete()));
    assert_eq!(leaf.get("array").unwrap().type_tag.head, TagHead::Array);
}

#[test]
fn unbound_parameters_are_reported_not_fatal() {
    let intro = introspector();
    let ty = shape_of(&intro, "GenericBase");

    let raw_view = intro.properties(ty).unwrap();
    assert_eq!(raw_view.len(), 3);
    let items = raw_view.get("items").unwrap();
    assert_eq!(items.type_tag.to_string(), "List<?T>");
    assert_eq!(
        items.resolution,
        Resolution::Partial {
            placeholders: vec!["T".to_string()]
        }
    );
    assert!(items.unresolved_error().unwrap().to_string().contains("items"));

    let applied = intro
        .properties_as(ty, TypeTag::new("GenericBase", [TypeTag::simple("Int")]))
        .unwrap();
    assert_eq!(applied.get("items").unwrap().type_tag.to_string(), "List<Int>");
    assert!(applied.iter().all(|p| p.unresolved_error().is_none()));
}

#[test]
fn recursive_bounds_terminate() {
    let intro = introspector();
    let props = intro.properties(shape_of(&intro, "SelfBounded")).unwrap();

    let value = props.get("value").unwrap();
    assert_eq!(value.type_tag.to_string(), "Comparable<?S>");
    assert!(!value.resolution.is_complete());
    assert!(props.get("other").unwrap().resolution.is_complete());
}
