//! Local fan-out of tuples to registered actors
//!
//! Actors are held weakly in registration order. Delivery walks the registry
//! by registration sequence number rather than by index, so an actor's
//! `accept` may register or deregister actors (itself included) while a
//! dispatch is in progress: removed actors are skipped, actors added behind
//! the cursor are visited in the same pass.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::trace;
use tuple_actors::Actor;
use tuple_types::Tuple;

struct Registration {
    seq: u64,
    actor: Weak<dyn Actor>,
}

/// Same-process tuple delivery
#[derive(Default)]
pub struct TupleDispatcher {
    actors: RefCell<Vec<Registration>>,
    next_seq: Cell<u64>,
    monitor: RefCell<Option<Weak<dyn Actor>>>,
}

fn same_actor(weak: &Weak<dyn Actor>, actor: &dyn Actor) -> bool {
    Weak::as_ptr(weak) as *const () == actor as *const _ as *const ()
}

impl TupleDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `actor` to the end of the delivery order
    pub fn register_actor(&self, actor: &Rc<dyn Actor>) {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.actors.borrow_mut().push(Registration {
            seq,
            actor: Rc::downgrade(actor),
        });
        trace!("Registered actor {}", actor.actor_name());
    }

    /// Remove the earliest registration of `actor`
    ///
    /// An actor registered twice needs two deregistrations to stop receiving.
    pub fn deregister_actor(&self, actor: &dyn Actor) {
        let mut actors = self.actors.borrow_mut();
        if let Some(index) = actors
            .iter()
            .position(|registration| same_actor(&registration.actor, actor))
        {
            actors.remove(index);
        }
    }

    /// Install the observer that sees every tuple before normal delivery
    ///
    /// Replaces any previous monitor.
    pub fn register_monitor(&self, monitor: &Rc<dyn Actor>) {
        *self.monitor.borrow_mut() = Some(Rc::downgrade(monitor));
    }

    /// Remove the monitor if it is `monitor`
    pub fn deregister_monitor(&self, monitor: &dyn Actor) {
        let mut current = self.monitor.borrow_mut();
        if current
            .as_ref()
            .is_some_and(|installed| same_actor(installed, monitor))
        {
            *current = None;
        }
    }

    /// Number of live registered actors
    pub fn actor_count(&self) -> usize {
        self.actors
            .borrow()
            .iter()
            .filter(|registration| registration.actor.strong_count() > 0)
            .count()
    }

    /// Deliver `tuple` to the actors it is addressed to
    ///
    /// With no `destinationActor` every actor is offered the tuple; otherwise
    /// only actors with that name are. Returns whether any actor handled it.
    pub fn dispatch(&self, tuple: &Tuple) -> bool {
        let monitor = self.monitor.borrow().as_ref().and_then(Weak::upgrade);
        if let Some(monitor) = monitor {
            monitor.accept(tuple);
        }

        let destination = tuple.destination_actor();
        let mut handled = false;
        let mut cursor = 0u64;

        while let Some(actor) = self.next_actor(&mut cursor) {
            if destination.is_empty() || actor.actor_name() == destination {
                // Non-short-circuiting: every addressed actor gets the tuple
                handled |= actor.accept(tuple);
            }
        }

        handled
    }

    /// Next live actor at or after `cursor`, advancing past it
    ///
    /// No borrow of the registry outlives this call, so `accept` is free to
    /// mutate it.
    fn next_actor(&self, cursor: &mut u64) -> Option<Rc<dyn Actor>> {
        let mut actors = self.actors.borrow_mut();
        loop {
            let start = actors.partition_point(|registration| registration.seq < *cursor);
            let registration = actors.get(start)?;
            *cursor = registration.seq + 1;

            match registration.actor.upgrade() {
                Some(actor) => return Some(actor),
                None => {
                    actors.remove(start);
                }
            }
        }
    }
}
