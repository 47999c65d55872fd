//! In-process route between two threads
//!
//! Two [`Queueing`] routes wired as partners form a channel: sending on one
//! pushes a copy of the tuple onto the other's inbox. The inbox is the only
//! state shared across threads; it sits behind a mutex and a condition
//! variable so a pump thread can sleep in [`Queueing::wait_incoming`] until
//! work arrives.

use crate::error::{RouteError, RouteResult};
use crate::route::{RoutingTable, TupleRoute};
use parking_lot::{Condvar, Mutex};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;
use tuple_types::{types, Tuple};

#[derive(Debug, Default)]
struct InboxState {
    queue: VecDeque<Tuple>,
    stopped: bool,
}

#[derive(Debug, Default)]
struct Inbox {
    state: Mutex<InboxState>,
    incoming: Condvar,
}

impl Inbox {
    fn enqueue(&self, tuple: Tuple) -> bool {
        let mut state = self.state.lock();
        if state.stopped {
            return false;
        }
        state.queue.push_back(tuple);
        self.incoming.notify_all();
        true
    }

    fn stop(&self) {
        self.state.lock().stopped = true;
        self.incoming.notify_all();
    }
}

/// Handle that stops a [`Queueing`] route from any thread
#[derive(Debug, Clone)]
pub struct QueueStopper {
    inbox: Arc<Inbox>,
}

impl QueueStopper {
    /// Wake any waiter and refuse further inbound tuples
    pub fn stop(&self) {
        self.inbox.stop();
    }
}

/// One end of a cross-thread tuple channel
#[derive(Debug)]
pub struct Queueing {
    table: RoutingTable,
    inbox: Arc<Inbox>,
    partner: RefCell<Option<Arc<Inbox>>>,
}

impl Queueing {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: RoutingTable::new(name),
            inbox: Arc::new(Inbox::default()),
            partner: RefCell::new(None),
        }
    }

    /// Two routes already partnered with each other
    pub fn pair(a: impl Into<String>, b: impl Into<String>) -> (Self, Self) {
        let a = Self::new(a);
        let b = Self::new(b);
        a.set_partner(&b);
        b.set_partner(&a);
        (a, b)
    }

    /// Deliver this route's sends to `partner`'s inbox
    pub fn set_partner(&self, partner: &Queueing) {
        debug!("Route {}: partnered with {}", self.name(), partner.name());
        *self.partner.borrow_mut() = Some(partner.inbox.clone());
    }

    /// Block until a tuple is queued or the route is stopped
    pub fn wait_incoming(&self) {
        let mut state = self.inbox.state.lock();
        while state.queue.is_empty() && !state.stopped {
            self.inbox.incoming.wait(&mut state);
        }
    }

    pub fn stop(&self) {
        self.inbox.stop();
    }

    pub fn is_stopped(&self) -> bool {
        self.inbox.state.lock().stopped
    }

    pub fn stopper(&self) -> QueueStopper {
        QueueStopper {
            inbox: self.inbox.clone(),
        }
    }

    /// Tuples waiting in the inbox
    pub fn pending(&self) -> usize {
        self.inbox.state.lock().queue.len()
    }
}

impl TupleRoute for Queueing {
    fn table(&self) -> &RoutingTable {
        &self.table
    }

    fn have_incoming(&self) -> bool {
        !self.inbox.state.lock().queue.is_empty()
    }

    fn receive_tuple(&self) -> Option<Tuple> {
        self.inbox.state.lock().queue.pop_front()
    }

    fn transmit(&self, tuple: &Tuple) -> RouteResult<()> {
        // Credentials never cross a thread boundary
        if tuple.tuple_type() == types::AUTHENTICATE {
            return Err(RouteError::Refused {
                route: self.name().to_string(),
                tuple_type: types::AUTHENTICATE.to_string(),
            });
        }

        let partner = self.partner.borrow();
        match partner.as_ref() {
            Some(inbox) if inbox.enqueue(tuple.clone()) => Ok(()),
            _ => Err(RouteError::Disconnected(self.name().to_string())),
        }
    }
}

impl Drop for Queueing {
    fn drop(&mut self) {
        self.inbox.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::Delivery;
    use std::thread;
    use std::time::Duration;
    use tuple_types::keys;

    #[test]
    fn test_pair_delivers_in_order() {
        let (a, b) = Queueing::pair("a", "b");
        a.send_tuple(&Tuple::of_type("One"), true).unwrap();
        a.send_tuple(&Tuple::of_type("Two"), true).unwrap();

        assert!(!a.have_incoming());
        assert!(b.have_incoming());
        assert_eq!(b.pending(), 2);
        assert_eq!(b.receive_tuple().map(|t| t.tuple_type().to_string()), Some("One".into()));
        assert_eq!(b.receive_tuple().map(|t| t.tuple_type().to_string()), Some("Two".into()));
        assert!(b.receive_tuple().is_none());
    }

    #[test]
    fn test_authenticate_never_crosses() {
        let (a, b) = Queueing::pair("a", "b");
        let auth = Tuple::of_type(types::AUTHENTICATE).with(keys::SEALING_KEY, "secret");

        assert!(matches!(
            a.send_tuple(&auth, true),
            Err(RouteError::Refused { .. })
        ));
        assert!(!b.have_incoming());
    }

    #[test]
    fn test_unpartnered_route_is_disconnected() {
        let lonely = Queueing::new("lonely");
        assert_eq!(
            lonely.send_tuple(&Tuple::of_type("Ping"), true),
            Err(RouteError::Disconnected("lonely".to_string()))
        );
    }

    #[test]
    fn test_stopped_partner_refuses_but_keeps_queue() {
        let (a, b) = Queueing::pair("a", "b");
        a.send_tuple(&Tuple::of_type("Before"), true).unwrap();
        b.stop();

        assert!(b.is_stopped());
        assert!(matches!(
            a.send_tuple(&Tuple::of_type("After"), true),
            Err(RouteError::Disconnected(_))
        ));
        assert_eq!(b.receive_tuple().map(|t| t.tuple_type().to_string()), Some("Before".into()));
    }

    #[test]
    fn test_dropping_partner_disconnects() {
        let (a, b) = Queueing::pair("a", "b");
        drop(b);
        assert!(a.send_tuple(&Tuple::of_type("Ping"), true).is_err());
        assert_eq!(
            a.send_tuple(&Tuple::of_type("Ping"), false),
            Ok(Delivery::Skipped)
        );
    }

    #[test]
    fn test_wait_incoming_wakes_on_send_from_other_thread() {
        let (a, b) = Queueing::pair("a", "b");

        let waiter = thread::spawn(move || {
            b.wait_incoming();
            b.receive_tuple()
        });

        thread::sleep(Duration::from_millis(20));
        a.send_tuple(&Tuple::of_type("Wake"), true).unwrap();

        let received = waiter.join().unwrap();
        assert_eq!(received.map(|t| t.tuple_type().to_string()), Some("Wake".into()));
    }

    #[test]
    fn test_stopper_wakes_waiter() {
        let route = Queueing::new("pump");
        let stopper = route.stopper();

        let waiter = thread::spawn(move || {
            route.wait_incoming();
            route.is_stopped()
        });

        thread::sleep(Duration::from_millis(20));
        stopper.stop();
        assert!(waiter.join().unwrap());
    }
}
