//! Security policy hooks
//!
//! A router consults its [`TupleFilter`] at six points. Inbound tuples are
//! checked by `permit_in*` before local dispatch, relayed tuples by
//! `permit_forward*` before going out on another route, and locally
//! originated tuples by `permit_out*`. Each check has a separate variant for
//! the default route, which is usually the single link to an authorising
//! peer. A rejected tuple is dropped silently.

pub mod world_access;

pub use world_access::{Authenticator, WorldAccessFilter};

use tuple_types::Tuple;

/// Six-point routing policy; every check permits by default
pub trait TupleFilter {
    /// Accept a tuple arriving on a non-default route?
    fn permit_in(&self, _tuple: &Tuple) -> bool {
        true
    }

    /// Accept a tuple arriving on the default route?
    fn permit_in_default(&self, _tuple: &Tuple) -> bool {
        true
    }

    /// Relay a tuple that arrived on a non-default route?
    fn permit_forward(&self, _tuple: &Tuple) -> bool {
        true
    }

    /// Relay a tuple that arrived on the default route?
    fn permit_forward_default(&self, _tuple: &Tuple) -> bool {
        true
    }

    /// Send a local tuple over a non-default route?
    fn permit_out(&self, _tuple: &Tuple) -> bool {
        true
    }

    /// Send a local tuple over the default route?
    fn permit_out_default(&self, _tuple: &Tuple) -> bool {
        true
    }
}

/// Filter that permits everything, same as having none installed
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

impl TupleFilter for PermitAll {}
