use propscope::{
    Capabilities, DelegateFamily, DelegateKind, FieldSelection, Introspector, ProbeError,
    tests_utils::{sample_introspector, shape_of},
};

fn without_metadata() -> Introspector {
    sample_introspector(Capabilities::with_delegate_metadata(false))
}

#[test]
fn lazy_storage_is_flagged_not_misreported() {
    let intro = without_metadata();
    let ty = shape_of(&intro, "Container");
    let props = intro.properties(ty).unwrap();

    let flagged = props.by_storage("delegate$delegate").unwrap();
    assert_eq!(flagged.delegate, DelegateKind::None);
    assert!(flagged.requires_capability);
    assert_eq!(flagged.suspected, Some(DelegateFamily::LazyCache));
    assert!(props.requires_capability());

    let err = intro.check_capability(ty).unwrap_err();
    assert!(matches!(
        &err,
        ProbeError::CapabilityRequired {
            suspected: DelegateFamily::LazyCache,
            field,
            ..
        } if field == "delegate"
    ));
    assert!(err.to_string().contains("PROPSCOPE_DELEGATE_METADATA"));
}

#[test]
fn selection_refuses_types_with_invisible_state() {
    let intro = without_metadata();
    let ty = shape_of(&intro, "Container");

    let result = FieldSelection::new().ignore("normal").resolve(&intro, ty);
    assert!(matches!(result, Err(ProbeError::CapabilityRequired { .. })));

    let provider = shape_of(&intro, "ReflectionDelegation");
    assert!(intro.check_capability(provider).is_err());
}

#[test]
fn interface_delegates_need_no_metadata() {
    let intro = without_metadata();
    let ty = shape_of(&intro, "InterfaceDelegation");

    intro.check_capability(ty).unwrap();
    let selection = FieldSelection::new().ignore("$$delegate_0").resolve(&intro, ty).unwrap();
    assert!(selection.significant().is_empty());
}

#[test]
fn reference_delegates_work_by_storage_name_only() {
    let intro = without_metadata();
    let ty = shape_of(&intro, "ObjectDelegation");

    intro.check_capability(ty).unwrap();
    assert_eq!(intro.to_canonical_name(ty, "foo$receiver").unwrap(), "foo$receiver");

    let selection = FieldSelection::new().ignore("foo$receiver").resolve(&intro, ty).unwrap();
    assert_eq!(selection.significant(), ["container".to_string()]);

    let err = FieldSelection::new().ignore("foo").resolve(&intro, ty).unwrap_err();
    assert!(matches!(
        err,
        ProbeError::CapabilityRequired {
            suspected: DelegateFamily::ReferenceForward,
            ..
        }
    ));
}

#[test]
fn map_delegates_degrade_to_plain_storage() {
    let intro = without_metadata();
    let ty = shape_of(&intro, "MapDelegation");

    intro.check_capability(ty).unwrap();
    let props = intro.properties(ty).unwrap();
    assert_eq!(
        props.by_storage("name$delegate").unwrap().suspected,
        Some(DelegateFamily::MapBacked)
    );
    assert!(matches!(
        intro.to_storage_name(ty, "name"),
        Err(ProbeError::CapabilityRequired { .. })
    ));
    assert!(matches!(
        intro.to_storage_name(ty, "nothing"),
        Err(ProbeError::UnknownField { .. })
    ));
}

#[test]
fn suspected_override_still_suppresses_ancestor() {
    let intro = without_metadata();
    let props = intro.properties(shape_of(&intro, "LazySub")).unwrap();

    assert_eq!(props.len(), 1);
    assert_eq!(props.iter().next().unwrap().storage_name, "x$delegate");
}
