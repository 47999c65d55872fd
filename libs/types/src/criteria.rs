//! Routing criteria
//!
//! A [`TupleRoutingCriteria`] is a subscription: the set of tuples a route's
//! peer has asked to receive. Criteria travel between peers as control tuples
//! of type `RoutingCriteria`, which are themselves always routable.

use crate::envelope::{actions, keys, types};
use crate::tuple::Tuple;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// What a control tuple asks the receiving route to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriteriaAction {
    Add,
    Remove,
}

impl CriteriaAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            CriteriaAction::Add => actions::ADD,
            CriteriaAction::Remove => actions::REMOVE,
        }
    }

    /// Action carried by a control tuple, `None` if missing or unknown
    pub fn from_tuple(tuple: &Tuple) -> Option<Self> {
        match tuple.get(keys::ACTION).as_str()? {
            actions::ADD => Some(CriteriaAction::Add),
            actions::REMOVE => Some(CriteriaAction::Remove),
            _ => None,
        }
    }
}

/// Subscription predicate held by a route on behalf of its peer
///
/// Equality is structural over all four fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TupleRoutingCriteria {
    pub types: BTreeSet<String>,
    pub destination_ids: BTreeSet<String>,
    pub destination_actors: BTreeSet<String>,
    /// Exact-match payload entries required on top of the addressing match
    pub values: BTreeMap<String, Value>,
}

impl TupleRoutingCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, tuple_type: impl Into<String>) -> Self {
        self.types.insert(tuple_type.into());
        self
    }

    pub fn with_destination_id(mut self, id: impl Into<String>) -> Self {
        self.destination_ids.insert(id.into());
        self
    }

    pub fn with_destination_actor(mut self, actor: impl Into<String>) -> Self {
        self.destination_actors.insert(actor.into());
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Does `tuple` fall under this subscription?
    ///
    /// Control tuples always match. Otherwise the tuple's type, destination
    /// ID or destination actor must be present and in the corresponding set,
    /// and every entry of `values` must be present in the tuple with an equal
    /// value.
    pub fn matches(&self, tuple: &Tuple) -> bool {
        if tuple.is_control() {
            return true;
        }

        let listed =
            |set: &BTreeSet<String>, field: &str| !field.is_empty() && set.contains(field);
        let addressed = listed(&self.types, tuple.tuple_type())
            || listed(&self.destination_ids, tuple.destination_id())
            || listed(&self.destination_actors, tuple.destination_actor());

        addressed && self.values_match(tuple)
    }

    fn values_match(&self, tuple: &Tuple) -> bool {
        self.values
            .iter()
            .all(|(key, expected)| tuple.has_value(key) && tuple.get(key) == expected)
    }

    /// Control tuple asking the peer to `action` this criteria
    pub fn to_tuple(&self, action: CriteriaAction) -> Tuple {
        fn words(set: &BTreeSet<String>) -> Value {
            set.iter().map(String::as_str).collect()
        }

        Tuple::of_type(types::ROUTING_CRITERIA)
            .with(keys::TYPES, words(&self.types))
            .with(keys::DESTINATION_IDS, words(&self.destination_ids))
            .with(keys::DESTINATION_ACTORS, words(&self.destination_actors))
            .with(keys::VALUES, Value::Map(self.values.clone()))
            .with(keys::ACTION, action.as_str())
    }

    /// Criteria carried by a control tuple
    ///
    /// Missing fields read as empty; a bare word reads as a one-element set
    /// and non-word list items are skipped.
    pub fn from_tuple(tuple: &Tuple) -> Self {
        fn words(value: &Value) -> BTreeSet<String> {
            match value {
                Value::Word(s) => BTreeSet::from([s.clone()]),
                Value::List(items) => items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect(),
                _ => BTreeSet::new(),
            }
        }

        Self {
            types: words(tuple.get(keys::TYPES)),
            destination_ids: words(tuple.get(keys::DESTINATION_IDS)),
            destination_actors: words(tuple.get(keys::DESTINATION_ACTORS)),
            values: tuple
                .get(keys::VALUES)
                .as_map()
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_match_requires_values() {
        let criteria = TupleRoutingCriteria::new()
            .with_type("Chat")
            .with_value("channel", "general");

        let chat = Tuple::of_type("Chat").with("channel", "general");
        assert!(criteria.matches(&chat));

        let other_channel = Tuple::of_type("Chat").with("channel", "random");
        assert!(!criteria.matches(&other_channel));

        let no_channel = Tuple::of_type("Chat");
        assert!(!criteria.matches(&no_channel));
    }

    #[test]
    fn test_destination_matches() {
        let criteria = TupleRoutingCriteria::new()
            .with_destination_id("node-a")
            .with_destination_actor("Chat");

        let by_id = Tuple::of_type("Anything").with(keys::DESTINATION_ID, "node-a");
        let by_actor = Tuple::new().with(keys::DESTINATION_ACTOR, "Chat");
        let neither = Tuple::of_type("Anything").with(keys::DESTINATION_ID, "node-b");

        assert!(criteria.matches(&by_id));
        assert!(criteria.matches(&by_actor));
        assert!(!criteria.matches(&neither));
    }

    #[test]
    fn test_empty_criteria_only_matches_control() {
        let criteria = TupleRoutingCriteria::new();
        assert!(!criteria.matches(&Tuple::new()));
        assert!(!criteria.matches(&Tuple::of_type("Ping")));
        assert!(criteria.matches(&Tuple::of_type(types::ROUTING_CRITERIA)));
    }

    #[test]
    fn test_untyped_tuple_never_matches_on_type() {
        let criteria = TupleRoutingCriteria::new().with_type("").with_type("Ping");
        assert!(!criteria.matches(&Tuple::new()));

        let addressed = Tuple::new().with(keys::DESTINATION_ACTOR, "X");
        assert!(!criteria.matches(&addressed));
        assert!(criteria.with_destination_actor("X").matches(&addressed));
    }

    #[test]
    fn test_control_tuple_wire_form() {
        let criteria = TupleRoutingCriteria::new()
            .with_type("Ping")
            .with_destination_actor("Hydra")
            .with_value("worldID", "w1");

        let control = criteria.to_tuple(CriteriaAction::Remove);
        assert!(control.is_control());
        assert_eq!(control[keys::ACTION], Value::from("remove"));
        assert_eq!(control[keys::TYPES], Value::List(vec![Value::from("Ping")]));
        assert_eq!(control[keys::DESTINATION_IDS], Value::list());
        assert_eq!(control[keys::VALUES].get("worldID"), &Value::from("w1"));

        assert_eq!(CriteriaAction::from_tuple(&control), Some(CriteriaAction::Remove));
        assert_eq!(TupleRoutingCriteria::from_tuple(&control), criteria);
    }

    #[test]
    fn test_from_tuple_is_lenient() {
        let control = Tuple::of_type(types::ROUTING_CRITERIA)
            .with(keys::TYPES, "Ping")
            .with(
                keys::DESTINATION_ACTORS,
                Value::List(vec![Value::from("X"), Value::from(5)]),
            );

        let criteria = TupleRoutingCriteria::from_tuple(&control);
        assert_eq!(
            criteria,
            TupleRoutingCriteria::new()
                .with_type("Ping")
                .with_destination_actor("X")
        );
        assert_eq!(CriteriaAction::from_tuple(&control), None);
        assert_eq!(
            CriteriaAction::from_tuple(&control.with(keys::ACTION, "add")),
            Some(CriteriaAction::Add)
        );
    }
}
