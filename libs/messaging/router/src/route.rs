//! Route abstraction
//!
//! A [`TupleRoute`] is one end of a channel to a peer router: another thread,
//! another process, a server. Each route keeps the subscriptions its peer has
//! asked for in a [`RoutingTable`] and only carries tuples matching one of
//! them, unless a send is unconditional.
//!
//! The subscription handshake is two-sided: a node calls
//! `send_add_routing_criteria_request` on its route, the peer's router drains
//! the resulting control tuple and calls `add_routing_criteria` on its own
//! route object facing back.

use crate::error::{RouteError, RouteResult};
use std::cell::RefCell;
use tracing::{debug, warn};
use tuple_types::{CriteriaAction, Tuple, TupleRoutingCriteria};

/// Outcome of a successful `send_tuple`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport
    Sent,
    /// Nothing subscribed to it; not an error
    Skipped,
}

/// Subscriptions a route holds on behalf of its peer
///
/// Duplicates are kept: two identical requests need two removals.
#[derive(Debug)]
pub struct RoutingTable {
    name: String,
    criteria: RefCell<Vec<TupleRoutingCriteria>>,
}

impl RoutingTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            criteria: RefCell::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&self, criteria: TupleRoutingCriteria) {
        debug!("Route {}: applying routing criteria", self.name);
        self.criteria.borrow_mut().push(criteria);
    }

    /// Remove one entry equal to `criteria`
    pub fn remove(&self, criteria: &TupleRoutingCriteria) -> bool {
        let mut table = self.criteria.borrow_mut();
        match table.iter().position(|existing| existing == criteria) {
            Some(index) => {
                table.remove(index);
                debug!("Route {}: removed routing criteria", self.name);
                true
            }
            None => {
                warn!(
                    "Route {}: asked to remove routing criteria it does not hold",
                    self.name
                );
                false
            }
        }
    }

    /// Does any held subscription match `tuple`?
    pub fn matches(&self, tuple: &Tuple) -> bool {
        self.criteria
            .borrow()
            .iter()
            .any(|criteria| criteria.matches(tuple))
    }

    pub fn criteria(&self) -> Vec<TupleRoutingCriteria> {
        self.criteria.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.criteria.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.borrow().is_empty()
    }
}

/// Channel to a peer router
///
/// Implementors provide the transport (`transmit`, `receive_tuple`,
/// `have_incoming`) and optionally `run`/`error`; subscription gating and the
/// handshake come from the provided methods.
pub trait TupleRoute {
    fn table(&self) -> &RoutingTable;

    /// Is a tuple waiting to be received? Never blocks.
    fn have_incoming(&self) -> bool;

    /// Pop the oldest incoming tuple, if any
    fn receive_tuple(&self) -> Option<Tuple>;

    /// Advance transport I/O without blocking
    fn run(&self) {}

    /// Has the route failed permanently?
    fn error(&self) -> bool {
        false
    }

    /// Hand one tuple to the transport
    fn transmit(&self, tuple: &Tuple) -> RouteResult<()>;

    fn name(&self) -> &str {
        self.table().name()
    }

    /// Would `tuple` be carried by a gated send?
    fn can_route(&self, tuple: &Tuple) -> bool {
        tuple.is_control() || self.table().matches(tuple)
    }

    /// Send `tuple` if the peer subscribed to it or `unconditional` is set
    fn send_tuple(&self, tuple: &Tuple, unconditional: bool) -> RouteResult<Delivery> {
        if self.error() {
            return Err(RouteError::Unavailable(self.name().to_string()));
        }

        if unconditional || self.can_route(tuple) {
            self.transmit(tuple)?;
            Ok(Delivery::Sent)
        } else {
            Ok(Delivery::Skipped)
        }
    }

    /// Record a subscription requested by the peer
    fn add_routing_criteria(&self, criteria: TupleRoutingCriteria) {
        self.table().add(criteria);
    }

    /// Drop a subscription the peer withdrew
    fn remove_routing_criteria(&self, criteria: &TupleRoutingCriteria) -> bool {
        self.table().remove(criteria)
    }

    /// Ask the peer to send us tuples matching `criteria`
    fn send_add_routing_criteria_request(
        &self,
        criteria: &TupleRoutingCriteria,
    ) -> RouteResult<Delivery> {
        self.send_tuple(&criteria.to_tuple(CriteriaAction::Add), true)
    }

    /// Ask the peer to stop sending tuples matching `criteria`
    fn send_remove_routing_criteria_request(
        &self,
        criteria: &TupleRoutingCriteria,
    ) -> RouteResult<Delivery> {
        self.send_tuple(&criteria.to_tuple(CriteriaAction::Remove), true)
    }
}
