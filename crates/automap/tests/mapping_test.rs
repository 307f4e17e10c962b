//! Integration tests for struct, optional and scalar mapping

use automap::{Error, MapOptions, Mappable, Mapper};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;

#[derive(Mappable, Debug, Default, Clone, PartialEq)]
pub struct SourceTypeA {
    pub foo: i64,
    pub bar: String,
}

#[derive(Mappable, Debug, Default, Clone, PartialEq)]
pub struct DestTypeA {
    pub foo: i64,
    pub bar: String,
}

#[derive(Mappable, Debug, Default)]
pub struct SourceWithChild {
    pub baz: String,
    pub child: SourceTypeA,
}

#[derive(Mappable, Debug, Default)]
pub struct DestWithChild {
    pub baz: String,
    pub child: DestTypeA,
}

#[test]
fn test_destination_is_updated_from_source() {
    let source = SourceTypeA {
        foo: 42,
        bar: "Bar".to_string(),
    };
    let mut dest = DestTypeA::default();

    automap::map_into(&source, &mut dest).unwrap();
    assert_eq!(dest.foo, 42);
    assert_eq!(dest.bar, "Bar");
}

#[test]
fn test_source_passed_as_optional() {
    let source = Some(SourceTypeA {
        foo: 42,
        bar: "Bar".to_string(),
    });

    let dest: DestTypeA = automap::map(&source).unwrap();
    assert_eq!(dest.foo, 42);
    assert_eq!(dest.bar, "Bar");
}

#[test]
fn test_null_source_maps_to_empty_struct() {
    let source: Option<SourceTypeA> = None;
    let dest: DestTypeA = automap::map(&source).unwrap();
    assert_eq!(dest, DestTypeA::default());
}

#[test]
fn test_with_nested_types() {
    let source = SourceWithChild {
        baz: "Baz".to_string(),
        child: SourceTypeA {
            foo: 0,
            bar: "Bar".to_string(),
        },
    };

    let dest: DestWithChild = automap::map(&source).unwrap();
    assert_eq!(dest.baz, "Baz");
    assert_eq!(dest.child.bar, "Bar");
}

#[test]
fn test_superset_source_copies_matching_fields_only() {
    #[derive(Mappable, Debug, Default)]
    pub struct Wide {
        pub foo: i64,
        pub bar: String,
        pub extra: Vec<u8>,
        pub more: Option<bool>,
    }

    let source = Wide {
        foo: 3,
        bar: "three".to_string(),
        extra: vec![1, 2, 3],
        more: Some(true),
    };

    let dest: DestTypeA = automap::map(&source).unwrap();
    assert_eq!(
        dest,
        DestTypeA {
            foo: 3,
            bar: "three".to_string()
        }
    );
}

#[derive(Mappable, Debug, Default)]
pub struct OnlyA {
    pub a: String,
}

#[derive(Mappable, Debug, Default, PartialEq)]
pub struct AAndB {
    pub a: String,
    pub b: String,
}

#[test]
fn test_missing_source_field_fails_in_strict_mode() {
    let source = OnlyA {
        a: "a".to_string(),
    };

    let err = automap::map::<AAndB, _>(&source).unwrap_err();
    assert_eq!(err.path(), "b");
    match err.root_cause() {
        Error::MissingSourceField {
            field,
            dest_type,
            source_type,
        } => {
            assert_eq!(*field, "b");
            assert!(dest_type.ends_with("AAndB"));
            assert!(source_type.ends_with("OnlyA"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_source_field_is_zero_in_loose_mode() {
    let source = OnlyA {
        a: "a".to_string(),
    };

    let dest: AAndB = automap::map_loose(&source).unwrap();
    assert_eq!(
        dest,
        AAndB {
            a: "a".to_string(),
            b: String::new()
        }
    );

    let mut existing = AAndB {
        a: "old".to_string(),
        b: "old".to_string(),
    };
    automap::map_loose_into(&source, &mut existing).unwrap();
    assert_eq!(existing.a, "a");
    assert_eq!(existing.b, "");
}

#[derive(Mappable, Debug, Default)]
pub struct StringFoo {
    pub foo: String,
}

#[derive(Mappable, Debug, Default)]
pub struct IntFoo {
    pub foo: i64,
}

#[test]
fn test_scalar_type_mismatch_fails() {
    let source = StringFoo {
        foo: "x".to_string(),
    };

    let err = automap::map::<IntFoo, _>(&source).unwrap_err();
    assert!(matches!(err.root_cause(), Error::TypeMismatch { .. }));
    assert_eq!(err.path(), "foo");
}

#[test]
fn test_loose_mode_still_rejects_type_mismatch() {
    let source = StringFoo {
        foo: "x".to_string(),
    };

    let err = automap::map_loose::<IntFoo, _>(&source).unwrap_err();
    assert!(matches!(err.root_cause(), Error::TypeMismatch { .. }));
}

#[test]
fn test_nested_failure_reports_full_path() {
    #[derive(Mappable, Debug, Default)]
    pub struct Outer {
        pub inner: Middle,
    }

    #[derive(Mappable, Debug, Default)]
    pub struct Middle {
        pub leaf: StringFoo,
    }

    #[derive(Mappable, Debug, Default)]
    pub struct OuterDest {
        pub inner: MiddleDest,
    }

    #[derive(Mappable, Debug, Default)]
    pub struct MiddleDest {
        pub leaf: IntFoo,
    }

    let err = automap::map::<OuterDest, _>(&Outer::default()).unwrap_err();
    assert_eq!(err.path(), "inner.leaf.foo");

    let message = err.to_string();
    assert!(message.contains("Error mapping field `inner`"));
    assert!(message.contains("Error mapping field `foo`"));
}

#[test]
#[should_panic(expected = "has no field `b`")]
fn test_must_map_panics_on_failure() {
    let _: AAndB = automap::must_map(&OnlyA::default());
}

#[test]
fn test_must_map_into_succeeds() {
    let mut dest = DestTypeA::default();
    automap::must_map_into(
        &SourceTypeA {
            foo: 1,
            bar: "one".to_string(),
        },
        &mut dest,
    );
    assert_eq!(dest.foo, 1);
}

#[derive(Mappable, Debug, Default)]
pub struct SourceWithPointer {
    pub child: Option<SourceTypeA>,
}

#[derive(Mappable, Debug, Default)]
pub struct DestWithPointer {
    pub child: Option<DestTypeA>,
}

#[derive(Mappable, Debug, Default)]
pub struct DestWithValue {
    pub child: DestTypeA,
}

#[test]
fn test_null_pointer_maps_to_null() {
    let dest: DestWithPointer = automap::map(&SourceWithPointer { child: None }).unwrap();
    assert!(dest.child.is_none());
}

#[test]
fn test_pointer_maps_to_new_pointee() {
    let source = SourceWithPointer {
        child: Some(SourceTypeA {
            foo: 9,
            bar: "nine".to_string(),
        }),
    };

    let dest: DestWithPointer = automap::map(&source).unwrap();
    assert_eq!(
        dest.child,
        Some(DestTypeA {
            foo: 9,
            bar: "nine".to_string()
        })
    );
}

#[test]
fn test_null_pointer_into_value_field_is_zero() {
    let dest: DestWithValue = automap::map(&SourceWithPointer { child: None }).unwrap();
    assert_eq!(dest.child, DestTypeA::default());
}

#[test]
fn test_value_into_pointer_field_is_allocated() {
    #[derive(Mappable, Debug, Default)]
    pub struct SourceWithValue {
        pub child: SourceTypeA,
    }

    let source = SourceWithValue {
        child: SourceTypeA {
            foo: 4,
            bar: "four".to_string(),
        },
    };

    let dest: DestWithPointer = automap::map(&source).unwrap();
    assert_eq!(dest.child.unwrap().foo, 4);
}

#[test]
fn test_optional_scalar_into_value_scalar() {
    #[derive(Mappable, Debug, Default)]
    pub struct MaybeFoo {
        pub foo: Option<i64>,
    }

    let some: IntFoo = automap::map(&MaybeFoo { foo: Some(12) }).unwrap();
    assert_eq!(some.foo, 12);

    let none: IntFoo = automap::map(&MaybeFoo { foo: None }).unwrap();
    assert_eq!(none.foo, 0);

    let back: MaybeFoo = automap::map(&IntFoo { foo: 5 }).unwrap();
    assert_eq!(back.foo, Some(5));
}

#[test]
fn test_boxed_fields_are_transparent() {
    #[derive(Mappable, Debug, Default)]
    pub struct Boxed {
        pub child: Box<SourceTypeA>,
    }

    let source = Boxed {
        child: Box::new(SourceTypeA {
            foo: 8,
            bar: "eight".to_string(),
        }),
    };

    let dest: DestWithValue = automap::map(&source).unwrap();
    assert_eq!(dest.child.foo, 8);
}

#[test]
fn test_timestamps_are_copied_atomically() {
    #[derive(Mappable, Debug, Default)]
    pub struct EventDto {
        pub name: String,
        pub at: DateTime<Utc>,
    }

    #[derive(Mappable, Debug, Default)]
    pub struct Event {
        pub name: String,
        pub at: DateTime<Utc>,
    }

    let at = Utc.with_ymd_and_hms(2015, 6, 1, 8, 0, 0).unwrap();
    let event: Event = automap::map(&EventDto {
        name: "launch".to_string(),
        at,
    })
    .unwrap();

    assert_eq!(event.name, "launch");
    assert_eq!(event.at, at);
}

#[test]
fn test_private_fields_are_not_mapped() {
    #[derive(Mappable, Debug, Default)]
    pub struct WithSecret {
        pub foo: i64,
        pub bar: String,
        secret: String,
    }

    impl WithSecret {
        fn secret(&self) -> &str {
            &self.secret
        }
    }

    let source = WithSecret {
        foo: 1,
        bar: "b".to_string(),
        secret: "hidden".to_string(),
    };
    assert_eq!(source.secret(), "hidden");

    let copy: WithSecret = automap::map(&source).unwrap();
    assert_eq!(copy.foo, 1);
    assert_eq!(copy.secret(), "");

    let dest: DestTypeA = automap::map(&source).unwrap();
    assert_eq!(dest.bar, "b");
}

#[test]
fn test_skipped_fields_are_not_mapped() {
    #[derive(Mappable, Debug, Default)]
    pub struct WithSkip {
        pub foo: i64,
        pub bar: String,
        #[mappable(skip)]
        pub cache: Vec<String>,
    }

    let source = SourceTypeA {
        foo: 2,
        bar: "two".to_string(),
    };

    let dest: WithSkip = automap::map(&source).unwrap();
    assert_eq!(dest.foo, 2);
    assert!(dest.cache.is_empty());
}

#[derive(Mappable, Debug, Default)]
pub struct Settings {
    pub level: i64,
    note: String,
}

#[derive(Mappable, Debug, Default)]
pub struct SessionDto {
    pub foo: i64,
    pub settings: Settings,
}

#[derive(Mappable, Debug, Default)]
pub struct Session {
    pub foo: i64,
    pub settings: Settings,
    #[mappable(skip)]
    pub cache: Vec<String>,
    token: String,
}

#[test]
fn test_map_into_keeps_unmapped_fields() {
    let mut dest = Session {
        foo: 0,
        settings: Settings {
            level: 1,
            note: "local".to_string(),
        },
        cache: vec!["warm".to_string()],
        token: "secret".to_string(),
    };
    let source = SessionDto {
        foo: 7,
        settings: Settings {
            level: 3,
            note: "remote".to_string(),
        },
    };

    automap::map_into(&source, &mut dest).unwrap();
    assert_eq!(dest.foo, 7);
    assert_eq!(dest.settings.level, 3);
    assert_eq!(dest.settings.note, "local");
    assert_eq!(dest.cache, vec!["warm".to_string()]);
    assert_eq!(dest.token, "secret");
}

#[test]
fn test_failed_map_into_keeps_unmapped_fields() {
    #[derive(Mappable, Debug, Default)]
    pub struct WrongSettings {
        pub foo: i64,
        pub settings: String,
    }

    let mut dest = Session {
        foo: 1,
        cache: vec!["warm".to_string()],
        token: "secret".to_string(),
        ..Session::default()
    };

    let err = automap::map_into(&WrongSettings::default(), &mut dest).unwrap_err();
    assert_eq!(err.path(), "settings");
    assert_eq!(dest.foo, 1);
    assert_eq!(dest.cache, vec!["warm".to_string()]);
    assert_eq!(dest.token, "secret");
}

#[derive(Mappable, Debug, Default)]
pub struct NodeDto {
    pub value: i64,
    pub next: Option<Box<NodeDto>>,
}

#[derive(Mappable, Debug, Default)]
pub struct Node {
    pub value: i64,
    pub next: Option<Box<Node>>,
}

#[test]
fn test_long_linked_list_maps_with_default_options() {
    let mut head: Option<Box<NodeDto>> = None;
    for value in (0..100).rev() {
        head = Some(Box::new(NodeDto { value, next: head }));
    }
    let source = head.map(|node| *node).unwrap();

    let dest: Node = automap::map(&source).unwrap();
    let mut values = vec![dest.value];
    let mut cursor = dest.next.as_deref();
    while let Some(node) = cursor {
        values.push(node.value);
        cursor = node.next.as_deref();
    }
    assert_eq!(values, (0..100).collect::<Vec<i64>>());
}

#[test]
fn test_maps_only_copy_between_identical_types() {
    #[derive(Mappable, Debug, Default)]
    pub struct Labels {
        pub labels: HashMap<String, String>,
    }

    #[derive(Mappable, Debug, Default)]
    pub struct LabelsCopy {
        pub labels: HashMap<String, String>,
    }

    #[derive(Mappable, Debug, Default)]
    pub struct Counts {
        pub labels: HashMap<String, i64>,
    }

    let mut labels = HashMap::new();
    labels.insert("env".to_string(), "prod".to_string());
    let source = Labels { labels };

    let copy: LabelsCopy = automap::map(&source).unwrap();
    assert_eq!(copy.labels.get("env").map(String::as_str), Some("prod"));

    let err = automap::map::<Counts, _>(&source).unwrap_err();
    assert!(matches!(err.root_cause(), Error::UnsupportedShape { .. }));
}

#[test]
fn test_source_second_level_with_named_promotion() {
    #[derive(Mappable, Debug, Default)]
    pub struct Holder {
        pub child: DestTypeA,
    }

    let source = Holder {
        child: DestTypeA {
            foo: 0,
            bar: "Bar".to_string(),
        },
    };

    let strict = automap::map::<SourceTypeA, _>(&source).unwrap_err();
    assert!(matches!(
        strict.root_cause(),
        Error::MissingSourceField { .. }
    ));

    let mapper = Mapper::with_options(MapOptions::default().promote_from_named_fields(true));
    let dest: SourceTypeA = mapper.map(&source).unwrap();
    assert_eq!(dest.bar, "Bar");
}

#[test]
fn test_dest_second_level_with_descend() {
    #[derive(Mappable, Debug, Default)]
    pub struct Wrapper {
        pub child: DestTypeA,
    }

    let source = SourceTypeA {
        foo: 0,
        bar: "Bar".to_string(),
    };

    let strict = automap::map::<Wrapper, _>(&source).unwrap_err();
    assert!(matches!(
        strict.root_cause(),
        Error::MissingSourceField { .. }
    ));

    let mapper = Mapper::with_options(MapOptions::default().descend_into_unmatched_structs(true));
    let dest: Wrapper = mapper.map(&source).unwrap();
    assert_eq!(dest.child.bar, "Bar");
}

#[test]
fn test_mapper_is_shareable_across_threads() {
    let mapper = std::sync::Arc::new(Mapper::new());

    let handles: Vec<_> = (0..4_i64)
        .map(|n| {
            let mapper = std::sync::Arc::clone(&mapper);
            std::thread::spawn(move || {
                let source = SourceTypeA {
                    foo: n,
                    bar: n.to_string(),
                };
                mapper.map::<DestTypeA, _>(&source).unwrap()
            })
        })
        .collect();

    for (n, handle) in (0..4_i64).zip(handles) {
        let dest = handle.join().unwrap();
        assert_eq!(dest.foo, n);
        assert_eq!(dest.bar, n.to_string());
    }
    assert_eq!(mapper.cached_plans(), 1);
}
