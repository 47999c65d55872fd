//! Actor contract and the directory seam actors register through

use std::fmt;
use std::rc::Rc;
use tuple_types::{Tuple, TupleRoutingCriteria};

/// Delivery target for tuples
///
/// `accept` takes `&self` because an actor may be re-entered: its handler can
/// route a tuple that is dispatched straight back to it. Actors needing
/// mutable state keep it behind `Cell`/`RefCell` and must not hold a borrow
/// across a call into the router.
pub trait Actor {
    /// Handle one tuple, returning whether it was consumed
    fn accept(&self, tuple: &Tuple) -> bool;

    /// Dispatch name; several actors may share one
    fn actor_name(&self) -> String;
}

/// Where actors register and ask for subscriptions
///
/// Implemented by the router. Directories hold actors weakly: the caller keeps
/// the owning `Rc` alive for as long as the actor should receive tuples.
pub trait ActorDirectory {
    fn register_actor(&self, actor: &Rc<dyn Actor>);

    fn deregister_actor(&self, actor: &dyn Actor);

    /// Ask upstream peers to send tuples matching `criteria` to this node
    fn request_subscription(&self, criteria: &TupleRoutingCriteria) -> bool;

    /// Withdraw a subscription made with [`ActorDirectory::request_subscription`]
    fn cancel_subscription(&self, criteria: &TupleRoutingCriteria) -> bool;

    /// Route a tuple originated by an actor
    fn send(&self, tuple: &Tuple) -> bool;
}

/// Actor backed by a Rust closure
pub struct NativeActor<F>
where
    F: Fn(&Tuple) -> bool,
{
    name: String,
    handler: F,
}

impl<F> NativeActor<F>
where
    F: Fn(&Tuple) -> bool,
{
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> Actor for NativeActor<F>
where
    F: Fn(&Tuple) -> bool,
{
    fn accept(&self, tuple: &Tuple) -> bool {
        (self.handler)(tuple)
    }

    fn actor_name(&self) -> String {
        self.name.clone()
    }
}

impl<F> fmt::Debug for NativeActor<F>
where
    F: Fn(&Tuple) -> bool,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeActor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_native_actor_delegates_to_closure() {
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        let actor = NativeActor::new("Counter", move |tuple: &Tuple| {
            counter.set(counter.get() + 1);
            tuple.tuple_type() == "Ping"
        });

        assert!(actor.accept(&Tuple::of_type("Ping")));
        assert!(!actor.accept(&Tuple::of_type("Pong")));
        assert_eq!(seen.get(), 2);
        assert_eq!(actor.actor_name(), "Counter");
        assert!(format!("{:?}", actor).contains("Counter"));
    }
}
