//! Routing Criteria Property Tests
//!
//! Properties that must hold for every subscription predicate, whatever the
//! tuple and criteria contents.

use proptest::prelude::*;
use std::collections::BTreeMap;
use tuple_types::{keys, types, CriteriaAction, Tuple, TupleRoutingCriteria, Value};

prop_compose! {
    fn word()(s in "[A-Za-z][A-Za-z0-9]{0,7}") -> String {
        s
    }
}

prop_compose! {
    fn scalar()(choice in 0..2u8, s in word(), n in -1000i64..1000) -> Value {
        if choice == 0 { Value::from(s) } else { Value::from(n) }
    }
}

prop_compose! {
    fn required_values()(entries in prop::collection::btree_map("v[a-z]{1,4}", scalar(), 0..4))
        -> BTreeMap<String, Value> {
        entries
    }
}

prop_compose! {
    fn criteria()(
        types in prop::collection::btree_set(word(), 0..4),
        ids in prop::collection::btree_set(word(), 0..3),
        actors in prop::collection::btree_set(word(), 0..3),
        values in required_values(),
    ) -> TupleRoutingCriteria {
        TupleRoutingCriteria {
            types,
            destination_ids: ids,
            destination_actors: actors,
            values,
        }
    }
}

/// Tuple of a listed type carrying every required value plus extra payload
fn satisfying_tuple(criteria: &TupleRoutingCriteria, tuple_type: &str, extra: &str) -> Tuple {
    let mut tuple = Tuple::of_type(tuple_type).with("payload", extra);
    for (key, value) in &criteria.values {
        tuple.set(key.clone(), value.clone());
    }
    tuple
}

proptest! {
    #[test]
    fn prop_listed_type_with_values_matches(
        criteria in criteria(),
        tuple_type in word(),
        extra in word(),
    ) {
        let criteria = criteria.with_type(tuple_type.clone());
        let tuple = satisfying_tuple(&criteria, &tuple_type, &extra);
        prop_assert!(criteria.matches(&tuple));
    }

    #[test]
    fn prop_missing_required_value_never_matches(
        criteria in criteria(),
        tuple_type in word(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!criteria.values.is_empty());
        let criteria = criteria.with_type(tuple_type.clone());
        let mut tuple = satisfying_tuple(&criteria, &tuple_type, "x");

        let keys: Vec<&String> = criteria.values.keys().collect();
        let dropped = pick.get(&keys);
        tuple.remove(dropped);
        prop_assert!(!criteria.matches(&tuple));
    }

    #[test]
    fn prop_mismatched_required_value_never_matches(
        criteria in criteria(),
        tuple_type in word(),
        pick in any::<prop::sample::Index>(),
    ) {
        prop_assume!(!criteria.values.is_empty());
        let criteria = criteria.with_type(tuple_type.clone());
        let mut tuple = satisfying_tuple(&criteria, &tuple_type, "x");

        let keys: Vec<&String> = criteria.values.keys().collect();
        let changed = pick.get(&keys);
        // A list never equals any generated scalar
        tuple.set((*changed).clone(), Value::list());
        prop_assert!(!criteria.matches(&tuple));
    }

    #[test]
    fn prop_control_tuples_always_match(criteria in criteria(), extra in word()) {
        let control = Tuple::of_type(types::ROUTING_CRITERIA).with(keys::ACTION, extra);
        prop_assert!(criteria.matches(&control));
    }

    #[test]
    fn prop_wire_form_preserves_criteria(criteria in criteria(), remove in any::<bool>()) {
        let action = if remove { CriteriaAction::Remove } else { CriteriaAction::Add };
        let control = criteria.to_tuple(action);
        prop_assert_eq!(CriteriaAction::from_tuple(&control), Some(action));
        prop_assert_eq!(TupleRoutingCriteria::from_tuple(&control), criteria);
    }
}
