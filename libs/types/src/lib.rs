//! # Tuple Space Types
//!
//! Message envelope shared by every component of the tuple space.
//!
//! - [`Value`]: tagged dynamic value (word, number, list, map, binary)
//! - [`Tuple`]: one message, a map of named values whose reserved keys
//!   (`type`, `sourceActor`, `sourceID`, `destinationActor`, `destinationID`)
//!   form the routing envelope
//! - [`TupleRoutingCriteria`]: subscription predicate and its
//!   `RoutingCriteria` control-tuple wire form
//!
//! ## Quick Start
//! ```rust
//! use tuple_types::{keys, Tuple, TupleRoutingCriteria};
//!
//! let ping = Tuple::of_type("Ping")
//!     .with(keys::SOURCE_ACTOR, "Client")
//!     .with(keys::DESTINATION_ACTOR, "Responder");
//!
//! let criteria = TupleRoutingCriteria::new().with_destination_actor("Responder");
//! assert!(criteria.matches(&ping));
//! ```

pub mod criteria;
pub mod envelope;
pub mod tuple;
pub mod value;

pub use criteria::{CriteriaAction, TupleRoutingCriteria};
pub use envelope::{actions, actors, keys, types};
pub use tuple::{Tuple, TupleError};
pub use value::Value;
