//! Test doubles for actors and routes
//!
//! Exposed unconditionally so integration tests and downstream crates can
//! drive a router without a real transport.

use crate::error::{RouteError, RouteResult};
use crate::route::{RoutingTable, TupleRoute};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use tuple_actors::Actor;
use tuple_types::Tuple;

/// Actor that records every tuple it is offered
#[derive(Debug)]
pub struct RecordingActor {
    name: String,
    handles: bool,
    received: RefCell<Vec<Tuple>>,
}

impl RecordingActor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            handles: true,
            received: RefCell::new(Vec::new()),
        }
    }

    /// What `accept` reports back to the dispatcher
    pub fn handling(mut self, handles: bool) -> Self {
        self.handles = handles;
        self
    }

    pub fn count(&self) -> usize {
        self.received.borrow().len()
    }

    pub fn received(&self) -> Vec<Tuple> {
        self.received.borrow().clone()
    }

    pub fn last(&self) -> Option<Tuple> {
        self.received.borrow().last().cloned()
    }
}

impl Actor for RecordingActor {
    fn accept(&self, tuple: &Tuple) -> bool {
        self.received.borrow_mut().push(tuple.clone());
        self.handles
    }

    fn actor_name(&self) -> String {
        self.name.clone()
    }
}

/// In-memory route with scriptable failures
///
/// Sent tuples are kept for inspection; incoming tuples are queued with
/// [`FailingRoute::push_incoming`].
#[derive(Debug)]
pub struct FailingRoute {
    table: RoutingTable,
    sent: RefCell<Vec<Tuple>>,
    incoming: RefCell<VecDeque<Tuple>>,
    error: Cell<bool>,
    fail_sends: Cell<bool>,
}

impl FailingRoute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: RoutingTable::new(name),
            sent: RefCell::new(Vec::new()),
            incoming: RefCell::new(VecDeque::new()),
            error: Cell::new(false),
            fail_sends: Cell::new(false),
        }
    }

    pub fn sent(&self) -> Vec<Tuple> {
        self.sent.borrow().clone()
    }

    pub fn push_incoming(&self, tuple: Tuple) {
        self.incoming.borrow_mut().push_back(tuple);
    }

    /// Report the route as permanently failed
    pub fn set_error(&self, error: bool) {
        self.error.set(error);
    }

    /// Make every transmit fail with a transport error
    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.set(fail);
    }
}

impl TupleRoute for FailingRoute {
    fn table(&self) -> &RoutingTable {
        &self.table
    }

    fn have_incoming(&self) -> bool {
        !self.incoming.borrow().is_empty()
    }

    fn receive_tuple(&self) -> Option<Tuple> {
        self.incoming.borrow_mut().pop_front()
    }

    fn error(&self) -> bool {
        self.error.get()
    }

    fn transmit(&self, tuple: &Tuple) -> RouteResult<()> {
        if self.fail_sends.get() {
            return Err(RouteError::Transport {
                route: self.table.name().to_string(),
                reason: "send failed".to_string(),
            });
        }
        self.sent.borrow_mut().push(tuple.clone());
        Ok(())
    }
}
