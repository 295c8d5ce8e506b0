use loam_core::prelude::*;
use loam_core::EntryShape;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Assoc(i64, i64),
    Without(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..30, any::<i64>()).prop_map(|(k, v)| Op::Assoc(k, v)),
        (0i64..30).prop_map(Op::Without),
    ]
}

fn apply_persistent(map: &PersistentMap, op: &Op) -> PersistentMap {
    match op {
        Op::Assoc(k, v) => map.assoc(Value::Long(*k), Value::Long(*v)),
        Op::Without(k) => map.without(&Value::Long(*k)),
    }
}

#[test]
fn test_error_kinds_are_distinct() {
    let mut t = PersistentMap::new().as_transient();
    let shape_err = t.conj_value(&Value::Long(1)).unwrap_err();
    assert!(!shape_err.is_usage_error());
    t.persistent().unwrap();
    let sealed_err = t.conj_value(&Value::Long(1)).unwrap_err();
    assert!(sealed_err.is_usage_error());
    assert!(matches!(sealed_err, Error::TransientSealed));
}

#[test]
fn test_conj_rejects_wrong_pair_length() {
    let mut t = PersistentMap::new().as_transient();
    let err = t
        .conj(EntryShape::Pair(Value::vector([Value::Long(1), Value::Long(2), Value::Long(3)])))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid argument: vector arg to map conj must be a pair"
    );
}

proptest! {
    #[test]
    fn prop_transient_matches_persistent(ops in prop::collection::vec(op(), 0..60)) {
        let base = PersistentMap::array_map([(Value::Long(100), Value::Long(0))]);
        let expected = ops.iter().fold(base.clone(), |m, op| apply_persistent(&m, op));

        let mut t = base.as_transient();
        for op in &ops {
            match op {
                Op::Assoc(k, v) => { t.assoc(Value::Long(*k), Value::Long(*v)).unwrap(); }
                Op::Without(k) => { t.without(&Value::Long(*k)).unwrap(); }
            }
        }
        let built = t.persistent().unwrap();

        prop_assert_eq!(Value::Map(built), Value::Map(expected));
        prop_assert_eq!(base.count(), 1);
    }

    #[test]
    fn prop_sealed_transient_rejects_and_result_is_stable(
        ops in prop::collection::vec(op(), 1..20)
    ) {
        let mut t = PersistentMap::new().as_transient();
        t.assoc(Value::Long(-1), Value::Long(-1)).unwrap();
        let done = t.persistent().unwrap();
        let snapshot = Value::Map(done.clone());

        for op in &ops {
            let rejected = match op {
                Op::Assoc(k, v) => t.assoc(Value::Long(*k), Value::Long(*v)).map(|_| ()),
                Op::Without(k) => t.without(&Value::Long(*k)).map(|_| ()),
            };
            prop_assert!(matches!(rejected, Err(Error::TransientSealed)));
        }
        prop_assert!(t.persistent().is_err());
        prop_assert_eq!(Value::Map(done), snapshot);
    }

    #[test]
    fn prop_persistent_updates_never_touch_the_receiver(
        ops in prop::collection::vec(op(), 0..40)
    ) {
        let mut versions = vec![PersistentMap::new()];
        for op in &ops {
            let next = apply_persistent(versions.last().unwrap(), op);
            versions.push(next);
        }
        // replay from scratch and compare each snapshot
        let mut replay = PersistentMap::new();
        prop_assert_eq!(Value::Map(versions[0].clone()), Value::Map(replay.clone()));
        for (i, op) in ops.iter().enumerate() {
            replay = apply_persistent(&replay, op);
            prop_assert_eq!(Value::Map(versions[i + 1].clone()), Value::Map(replay.clone()));
        }
        prop_assert_eq!(versions[0].count(), 0);
    }
}
