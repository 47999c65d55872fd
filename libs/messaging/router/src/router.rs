//! Tuple router
//!
//! The router ties a node together: it owns the local dispatcher, holds weak
//! references to the routes attached to it, consults the installed filter
//! and runs the routing algorithm.
//!
//! - [`TupleRouter::route`] sends a locally originated tuple out over every
//!   route that wants it and then dispatches it locally.
//! - [`TupleRouter::run`] is one non-blocking pump cycle: drain every route,
//!   apply subscription changes, forward ordinary tuples to the other routes
//!   and dispatch them locally.
//!
//! At most one route is the default route, the link toward the root of the
//! routing tree. Sends over it are unconditional and subscriptions are only
//! ever requested over it.

use crate::dispatcher::TupleDispatcher;
use crate::error::RouteResult;
use crate::filter::TupleFilter;
use crate::promise::Promise;
use crate::route::{Delivery, TupleRoute};
use crate::timer::{SystemTimers, TimerFactory};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace, warn};
use tuple_actors::{Actor, ActorDirectory};
use tuple_config::{PromiseSettings, RouterSettings, TupleLogMode, TupleSpaceConfig};
use tuple_types::{actors, keys, types, CriteriaAction, Tuple, TupleRoutingCriteria};

fn same_route(a: &Rc<dyn TupleRoute>, b: &dyn TupleRoute) -> bool {
    Rc::as_ptr(a) as *const () == b as *const _ as *const ()
}

/// Orchestrates local dispatch and the attached routes of one node
pub struct TupleRouter {
    name: String,
    my_id: RefCell<String>,
    dispatcher: TupleDispatcher,
    routes: RefCell<Vec<Weak<dyn TupleRoute>>>,
    default_route: RefCell<Option<Weak<dyn TupleRoute>>>,
    filter: RefCell<Option<Rc<dyn TupleFilter>>>,
    route_error: Cell<bool>,
    settings: RouterSettings,
    promise_settings: PromiseSettings,
    timers: Rc<dyn TimerFactory>,
}

impl TupleRouter {
    /// Router with default settings and wall-clock timers
    pub fn new(name: impl Into<String>) -> Self {
        let settings = RouterSettings {
            name: name.into(),
            ..RouterSettings::default()
        };
        Self::with_settings(settings, PromiseSettings::default(), Rc::new(SystemTimers))
    }

    pub fn with_settings(
        settings: RouterSettings,
        promise_settings: PromiseSettings,
        timers: Rc<dyn TimerFactory>,
    ) -> Self {
        Self {
            name: settings.name.clone(),
            my_id: RefCell::new(settings.node_id.clone().unwrap_or_default()),
            dispatcher: TupleDispatcher::new(),
            routes: RefCell::new(Vec::new()),
            default_route: RefCell::new(None),
            filter: RefCell::new(None),
            route_error: Cell::new(false),
            settings,
            promise_settings,
            timers,
        }
    }

    pub fn from_config(config: &TupleSpaceConfig, timers: Rc<dyn TimerFactory>) -> Self {
        Self::with_settings(config.router.clone(), config.promise.clone(), timers)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_my_id(&self, id: impl Into<String>) {
        *self.my_id.borrow_mut() = id.into();
    }

    pub fn my_id(&self) -> String {
        self.my_id.borrow().clone()
    }

    pub fn dispatcher(&self) -> &TupleDispatcher {
        &self.dispatcher
    }

    /// Sticky flag: did a route report an error during the last `run`?
    pub fn route_error(&self) -> bool {
        self.route_error.get()
    }

    pub fn set_tuple_filter(&self, filter: Option<Rc<dyn TupleFilter>>) {
        *self.filter.borrow_mut() = filter;
    }

    /// Attach a route; the router keeps only a weak reference
    ///
    /// Marking a route as default replaces any previous default.
    pub fn add_route(&self, route: Rc<dyn TupleRoute>, default_route: bool) {
        debug!(
            "Router {}: adding route {}{}",
            self.name,
            route.name(),
            if default_route { " (default)" } else { "" }
        );
        self.routes.borrow_mut().push(Rc::downgrade(&route));
        if default_route {
            *self.default_route.borrow_mut() = Some(Rc::downgrade(&route));
        }
    }

    pub fn remove_route(&self, route: &dyn TupleRoute) {
        let target = route as *const _ as *const ();
        self.routes
            .borrow_mut()
            .retain(|held| Weak::as_ptr(held) as *const () != target);

        let mut default = self.default_route.borrow_mut();
        if default
            .as_ref()
            .is_some_and(|held| Weak::as_ptr(held) as *const () == target)
        {
            *default = None;
        }
    }

    /// Names of the live attached routes, in attachment order
    pub fn routes(&self) -> Vec<String> {
        self.live_routes()
            .iter()
            .map(|route| route.name().to_string())
            .collect()
    }

    fn live_routes(&self) -> Vec<Rc<dyn TupleRoute>> {
        let mut routes = self.routes.borrow_mut();
        routes.retain(|route| route.strong_count() > 0);
        routes.iter().filter_map(Weak::upgrade).collect()
    }

    fn default_route(&self) -> Option<Rc<dyn TupleRoute>> {
        self.default_route.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn filter(&self) -> Option<Rc<dyn TupleFilter>> {
        self.filter.borrow().clone()
    }

    pub fn register_actor(&self, actor: &Rc<dyn Actor>) {
        self.dispatcher.register_actor(actor);
    }

    pub fn deregister_actor(&self, actor: &dyn Actor) {
        self.dispatcher.deregister_actor(actor);
    }

    pub fn register_monitor(&self, monitor: &Rc<dyn Actor>) {
        self.dispatcher.register_monitor(monitor);
    }

    pub fn deregister_monitor(&self, monitor: &dyn Actor) {
        self.dispatcher.deregister_monitor(monitor);
    }

    /// Subscribe toward the root: sent over the default route only
    pub fn send_add_routing_criteria_request(
        &self,
        criteria: &TupleRoutingCriteria,
    ) -> RouteResult<Delivery> {
        match self.default_route() {
            Some(route) => route.send_add_routing_criteria_request(criteria),
            None => Ok(Delivery::Skipped),
        }
    }

    pub fn send_remove_routing_criteria_request(
        &self,
        criteria: &TupleRoutingCriteria,
    ) -> RouteResult<Delivery> {
        match self.default_route() {
            Some(route) => route.send_remove_routing_criteria_request(criteria),
            None => Ok(Delivery::Skipped),
        }
    }

    /// Promise polled by this router with its injected timers
    pub fn promise(self: &Rc<Self>) -> Promise {
        Promise::with_settings(self, self.timers.clone(), self.promise_settings.clone())
    }

    /// Tuples that stay on this node
    ///
    /// Addressed to this node's ID, or to or from the `World` actor.
    fn stays_local(&self, tuple: &Tuple) -> bool {
        *self.my_id.borrow() == tuple.destination_id()
            || tuple.destination_actor() == actors::WORLD
            || tuple.source_actor() == actors::WORLD
    }

    /// Route a locally originated tuple
    ///
    /// Sends it over the default route (unconditionally, if `permit_out_default`
    /// allows) and over every other route subscribed to it (if `permit_out`
    /// allows), stopping at the first failing send. The tuple is then always
    /// dispatched locally. Returns whether a local actor handled it, or the
    /// first send error.
    pub fn route(&self, tuple: &Tuple) -> RouteResult<bool> {
        self.log_traffic("route", &self.name, tuple);

        let mut sent: RouteResult<()> = Ok(());
        if !self.stays_local(tuple) {
            let default = self.default_route();
            let filter = self.filter();

            for route in self.live_routes() {
                let is_default = default.as_ref().is_some_and(|d| same_route(d, route.as_ref()));
                let permitted = match &filter {
                    Some(filter) if is_default => filter.permit_out_default(tuple),
                    Some(filter) => filter.permit_out(tuple),
                    None => true,
                };
                if !permitted {
                    trace!("Router {}: {} not permitted out on {}", self.name, tuple.tuple_type(), route.name());
                    continue;
                }

                match route.send_tuple(tuple, is_default) {
                    Ok(Delivery::Sent) => self.log_traffic("out", route.name(), tuple),
                    Ok(Delivery::Skipped) => {}
                    Err(e) => {
                        debug!("Router {}: {}", self.name, e);
                        sent = Err(e);
                        break;
                    }
                }
            }
        }

        // The sender's own process always sees its tuple
        let handled = self.dispatcher.dispatch(tuple);
        sent.map(|()| handled)
    }

    /// One non-blocking pump cycle over every attached route
    pub fn run(&self) {
        let was_route_error = self.route_error.replace(false);
        let default = self.default_route();

        for route in self.live_routes() {
            route.run();
            let from_default = default.as_ref().is_some_and(|d| same_route(d, route.as_ref()));

            loop {
                match route.receive_tuple() {
                    Some(tuple) => self.handle_incoming(&route, from_default, default.as_ref(), &tuple),
                    None => {
                        if route.error() {
                            if !was_route_error {
                                warn!("Router {}: route {} is in error", self.name, route.name());
                            }
                            self.route_error.set(true);
                        }
                        break;
                    }
                }
            }
        }
    }

    fn handle_incoming(
        &self,
        route: &Rc<dyn TupleRoute>,
        from_default: bool,
        default: Option<&Rc<dyn TupleRoute>>,
        tuple: &Tuple,
    ) {
        self.log_traffic("in", route.name(), tuple);

        let filter = self.filter();
        let permitted = match &filter {
            Some(filter) if from_default => filter.permit_in_default(tuple),
            Some(filter) => filter.permit_in(tuple),
            None => true,
        };
        if !permitted {
            trace!("Router {}: dropped {} from {}", self.name, tuple.tuple_type(), route.name());
            return;
        }

        if tuple.is_control() {
            self.handle_routing_request(route, default, tuple);
            return;
        }

        let forward = tuple.tuple_type() != types::AUTHENTICATE
            && match &filter {
                Some(filter) if from_default => filter.permit_forward_default(tuple),
                Some(filter) => filter.permit_forward(tuple),
                None => true,
            };

        if forward {
            // No loop protection: the routing graph is assumed to be a tree
            for other in self.live_routes() {
                if same_route(&other, route.as_ref()) {
                    continue;
                }
                let is_default = default.is_some_and(|d| same_route(d, other.as_ref()));
                match other.send_tuple(tuple, is_default) {
                    Ok(Delivery::Sent) => self.log_traffic("forward", other.name(), tuple),
                    Ok(Delivery::Skipped) => {}
                    Err(e) => debug!("Router {}: forwarding failed: {}", self.name, e),
                }
            }
        }

        self.dispatcher.dispatch(tuple);
    }

    /// Apply a peer's subscription change and pass it one hop toward the root
    fn handle_routing_request(
        &self,
        route: &Rc<dyn TupleRoute>,
        default: Option<&Rc<dyn TupleRoute>>,
        tuple: &Tuple,
    ) {
        let Some(action) = CriteriaAction::from_tuple(tuple) else {
            debug!(
                "Router {}: ignoring routing criteria with action {:?}",
                self.name,
                tuple.get(keys::ACTION)
            );
            return;
        };

        let criteria = TupleRoutingCriteria::from_tuple(tuple);
        debug!(
            "Router {}: {} routing criteria on {}",
            self.name,
            action.as_str(),
            route.name()
        );

        match action {
            CriteriaAction::Add => route.add_routing_criteria(criteria.clone()),
            CriteriaAction::Remove => {
                route.remove_routing_criteria(&criteria);
            }
        }

        let Some(default) = default else {
            return;
        };
        if same_route(default, route.as_ref()) {
            return;
        }

        let relayed = match action {
            CriteriaAction::Add => default.send_add_routing_criteria_request(&criteria),
            CriteriaAction::Remove => default.send_remove_routing_criteria_request(&criteria),
        };
        if let Err(e) = relayed {
            debug!("Router {}: relaying routing criteria failed: {}", self.name, e);
        }
    }

    fn log_traffic(&self, direction: &str, via: &str, tuple: &Tuple) {
        let tuple_type = tuple.tuple_type();
        if !self.settings.logs_traffic(&self.name, tuple_type)
            || !self.settings.logs_traffic(via, tuple_type)
        {
            return;
        }

        match self.settings.log_tuples {
            TupleLogMode::Off => {}
            TupleLogMode::Brief => debug!("{} [{}] {}: {}", self.name, direction, via, tuple.brief()),
            TupleLogMode::Full => {
                debug!("{} [{}] {}:\n{}", self.name, direction, via, tuple.dump())
            }
        }
    }

    pub fn tuple_type(tuple: &Tuple) -> &str {
        tuple.tuple_type()
    }

    pub fn source_actor(tuple: &Tuple) -> &str {
        tuple.source_actor()
    }

    pub fn source_id(tuple: &Tuple) -> &str {
        tuple.source_id()
    }

    pub fn destination_actor(tuple: &Tuple) -> &str {
        tuple.destination_actor()
    }

    pub fn destination_id(tuple: &Tuple) -> &str {
        tuple.destination_id()
    }

    pub fn set_tuple_type(tuple: &mut Tuple, value: &str) {
        tuple.set_tuple_type(value);
    }

    pub fn set_source_actor(tuple: &mut Tuple, value: &str) {
        tuple.set_source_actor(value);
    }

    pub fn set_source_id(tuple: &mut Tuple, value: &str) {
        tuple.set_source_id(value);
    }

    pub fn set_destination_actor(tuple: &mut Tuple, value: &str) {
        tuple.set_destination_actor(value);
    }

    pub fn set_destination_id(tuple: &mut Tuple, value: &str) {
        tuple.set_destination_id(value);
    }
}

impl ActorDirectory for TupleRouter {
    fn register_actor(&self, actor: &Rc<dyn Actor>) {
        TupleRouter::register_actor(self, actor);
    }

    fn deregister_actor(&self, actor: &dyn Actor) {
        TupleRouter::deregister_actor(self, actor);
    }

    fn request_subscription(&self, criteria: &TupleRoutingCriteria) -> bool {
        self.send_add_routing_criteria_request(criteria) == Ok(Delivery::Sent)
    }

    fn cancel_subscription(&self, criteria: &TupleRoutingCriteria) -> bool {
        self.send_remove_routing_criteria_request(criteria) == Ok(Delivery::Sent)
    }

    fn send(&self, tuple: &Tuple) -> bool {
        self.route(tuple).is_ok()
    }
}

impl std::fmt::Debug for TupleRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TupleRouter")
            .field("name", &self.name)
            .field("my_id", &*self.my_id.borrow())
            .field("routes", &self.routes())
            .field("route_error", &self.route_error.get())
            .finish()
    }
}
