//! Tuple Space Actors
//!
//! An actor is a named delivery target with a single capability,
//! `accept(tuple) -> handled`. The dispatcher treats every actor the same way
//! whether its handler is native Rust code or an interpreted script.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────┐        ┌──────────────────────────┐
//! │   ActorDirectory       │        │   Actors (owned by app)  │
//! │   (TupleRouter)        │        │                          │
//! │                        │ Weak   │  ┌────────────────────┐  │
//! │  dispatcher ───────────┼────────┼─▶│ NativeActor        │  │
//! │                        │        │  │ Fn(&Tuple) -> bool │  │
//! │                        │        │  └────────────────────┘  │
//! │  subscriptions ◀───────┼────────┼─ ┌────────────────────┐  │
//! │                        │        │  │ ScriptedActor      │  │
//! └────────────────────────┘        │  │ TupleHandler[]     │  │
//!                                   │  └────────────────────┘  │
//!                                   └──────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```rust
//! use std::rc::Rc;
//! use tuple_actors::{Actor, NativeActor};
//! use tuple_types::Tuple;
//!
//! let echo: Rc<dyn Actor> = Rc::new(NativeActor::new("Echo", |tuple: &Tuple| {
//!     tuple.tuple_type() == "Ping"
//! }));
//!
//! assert!(echo.accept(&Tuple::of_type("Ping")));
//! assert_eq!(echo.actor_name(), "Echo");
//! ```

pub mod actor;
pub mod scripted;

pub use actor::{Actor, ActorDirectory, NativeActor};
pub use scripted::{ExecutionContext, Script, ScriptError, ScriptedActor, TupleHandler};
