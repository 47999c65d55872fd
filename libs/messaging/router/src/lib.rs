//! Tuple Space Router
//!
//! Moves tuples between the actors of one node and the routes linking it to
//! other nodes. Each node runs a single [`TupleRouter`] on its own thread;
//! all routing state is single-threaded and only the inbox of a
//! [`Queueing`] route is shared with another thread.
//!
//! # Architecture
//!
//! ```text
//!            default route (toward root)
//!                     ▲
//!                     │ unconditional
//! ┌───────────────────┴────────────────────┐
//! │ TupleRouter                            │
//! │  TupleFilter ── permit_in/forward/out  │
//! │  TupleDispatcher ── monitor, actors    │
//! │  routes: Weak<dyn TupleRoute>[]        │
//! └───────┬─────────────────────┬──────────┘
//!         │ gated by            │ gated by
//!         │ RoutingTable        │ RoutingTable
//!         ▼                     ▼
//!      Queueing              other transport
//! ```
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use tuple_actors::{Actor, NativeActor};
//! use tuple_router::TupleRouter;
//! use tuple_types::{keys, Tuple};
//!
//! let router = TupleRouter::new("node");
//! let pong: Rc<dyn Actor> = Rc::new(NativeActor::new("Pong", |tuple: &Tuple| {
//!     tuple.tuple_type() == "Ping"
//! }));
//! router.register_actor(&pong);
//!
//! let ping = Tuple::of_type("Ping").with(keys::DESTINATION_ACTOR, "Pong");
//! assert_eq!(router.route(&ping), Ok(true));
//! ```

pub mod dispatcher;
pub mod error;
pub mod filter;
pub mod promise;
pub mod route;
pub mod router;
pub mod routes;
pub mod timer;

pub mod test_utils;

pub use dispatcher::TupleDispatcher;
pub use error::{RouteError, RouteResult};
pub use filter::{Authenticator, PermitAll, TupleFilter, WorldAccessFilter};
pub use promise::{Future, Promise};
pub use route::{Delivery, RoutingTable, TupleRoute};
pub use router::TupleRouter;
pub use routes::{NullRoute, QueueStopper, Queueing};
pub use timer::{ManualTimers, SystemTimers, Timer, TimerFactory};
