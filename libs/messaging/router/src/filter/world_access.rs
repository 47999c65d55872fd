//! Server-side filter scoping traffic to the worlds a client has joined

use super::TupleFilter;
use std::rc::Rc;
use tracing::{debug, trace};
use tuple_config::WorldAccessSettings;
use tuple_types::{keys, types, Tuple};

/// What the connected client is allowed to see and change
pub trait Authenticator {
    fn credentials_valid(&self) -> bool;

    fn joined_world(&self, world_id: &str) -> bool;

    fn writable_world(&self, world_id: &str) -> bool;
}

impl<T: Authenticator + ?Sized> Authenticator for Rc<T> {
    fn credentials_valid(&self) -> bool {
        (**self).credentials_valid()
    }

    fn joined_world(&self, world_id: &str) -> bool {
        (**self).joined_world(world_id)
    }

    fn writable_world(&self, world_id: &str) -> bool {
        (**self).writable_world(world_id)
    }
}

/// World ID from the tuple's `coordinates`, empty when absent
fn world_id(tuple: &Tuple) -> &str {
    tuple
        .get(keys::COORDINATES)
        .get(keys::WORLD_ID)
        .as_str()
        .unwrap_or("")
}

fn is_uncoordinated_time(tuple: &Tuple) -> bool {
    tuple.tuple_type() == types::TIME && !tuple.has_value(keys::COORDINATES)
}

/// Filter for a server's link to one client
pub struct WorldAccessFilter<A: Authenticator> {
    authenticator: A,
    settings: WorldAccessSettings,
}

impl<A: Authenticator> WorldAccessFilter<A> {
    pub fn new(authenticator: A) -> Self {
        Self::with_settings(authenticator, WorldAccessSettings::default())
    }

    pub fn with_settings(authenticator: A, settings: WorldAccessSettings) -> Self {
        Self {
            authenticator,
            settings,
        }
    }

    pub fn authenticator(&self) -> &A {
        &self.authenticator
    }

    fn joined(&self, tuple: &Tuple, check: &str) -> bool {
        let world = world_id(tuple);
        let permitted = self.authenticator.joined_world(world);
        log_world_decision(check, world, permitted);
        permitted
    }

    fn writable(&self, tuple: &Tuple, check: &str) -> bool {
        let world = world_id(tuple);
        let permitted = self.authenticator.writable_world(world);
        log_world_decision(check, world, permitted);
        permitted
    }

    fn shared_asset_request(&self, tuple: &Tuple) -> bool {
        tuple.source_actor() == self.settings.asset_loader_actor
            && self
                .settings
                .shared_assets_world_id
                .as_deref()
                .is_some_and(|shared| shared == world_id(tuple))
    }
}

fn log_world_decision(check: &str, world: &str, permitted: bool) {
    if permitted {
        trace!("{}: permitted for world ID {}", check, world);
    } else if world.is_empty() {
        debug!("{}: world ID not found in tuple, forbidden", check);
    } else {
        debug!("{}: forbidden for world ID {}", check, world);
    }
}

impl<A: Authenticator> TupleFilter for WorldAccessFilter<A> {
    fn permit_in(&self, tuple: &Tuple) -> bool {
        if !self.authenticator.credentials_valid() {
            let permitted = tuple.tuple_type() == types::AUTHENTICATE;
            if !permitted {
                debug!("permit_in: tuple forbidden, no valid authentication");
            }
            return permitted;
        }

        if tuple.is_control() {
            return true;
        }

        let source = tuple.source_actor();
        if self
            .settings
            .open_source_actors
            .iter()
            .any(|open| open == source)
        {
            trace!("permit_in: {} requests permitted", source);
            return true;
        }

        if self.shared_asset_request(tuple) {
            trace!("permit_in: shared asset request permitted");
            return true;
        }

        self.joined(tuple, "permit_in")
    }

    fn permit_in_default(&self, tuple: &Tuple) -> bool {
        is_uncoordinated_time(tuple) || self.joined(tuple, "permit_in_default")
    }

    fn permit_forward(&self, tuple: &Tuple) -> bool {
        if tuple.tuple_type() == types::AUTHENTICATE {
            debug!("permit_forward: not forwarding authentication request");
            return false;
        }
        self.writable(tuple, "permit_forward")
    }

    fn permit_forward_default(&self, tuple: &Tuple) -> bool {
        if is_uncoordinated_time(tuple) {
            return true;
        }
        let permitted = self.authenticator.credentials_valid();
        if !permitted {
            debug!("permit_forward_default: forbidden, no valid authentication");
        }
        permitted
    }

    fn permit_out(&self, _tuple: &Tuple) -> bool {
        true
    }

    fn permit_out_default(&self, tuple: &Tuple) -> bool {
        self.writable(tuple, "permit_out_default")
    }
}
