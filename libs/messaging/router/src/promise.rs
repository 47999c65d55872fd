//! Promise/future bridge
//!
//! Lets code waiting for a reply block without stalling the node: while a
//! [`Future`] waits it keeps pumping its router, so the very tuple that will
//! resolve the [`Promise`] can arrive and be dispatched.
//!
//! ```rust,ignore
//! let promise = router.promise();
//! let future = promise.future();
//! // an actor holding a clone of `promise` calls `set(true)` on the reply
//! router.route(&request)?;
//! if future.get() { /* reply arrived within the timeout */ }
//! ```

use crate::router::TupleRouter;
use crate::timer::{SystemTimers, TimerFactory};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use tracing::{debug, trace};
use tuple_config::PromiseSettings;
use tuple_types::Value;

#[derive(Debug, Default)]
struct PromiseState {
    set: Cell<bool>,
    success: Cell<bool>,
    value: RefCell<Value>,
}

/// Where a future pumps while it waits
#[derive(Clone)]
struct Pump {
    router: Weak<TupleRouter>,
    timers: Rc<dyn TimerFactory>,
}

/// Producer side; clones share one result
///
/// Only the first `set` takes effect.
#[derive(Clone)]
pub struct Promise {
    state: Rc<PromiseState>,
    pump: Option<Pump>,
    settings: PromiseSettings,
}

impl Promise {
    /// Promise pumping `router` with wall-clock timers and default settings
    pub fn new(router: &Rc<TupleRouter>) -> Self {
        Self::with_settings(router, Rc::new(SystemTimers), PromiseSettings::default())
    }

    pub fn with_settings(
        router: &Rc<TupleRouter>,
        timers: Rc<dyn TimerFactory>,
        settings: PromiseSettings,
    ) -> Self {
        Self {
            state: Rc::new(PromiseState::default()),
            pump: Some(Pump {
                router: Rc::downgrade(router),
                timers,
            }),
            settings,
        }
    }

    /// Promise with no router; its futures never wait
    pub fn unbound() -> Self {
        Self {
            state: Rc::new(PromiseState::default()),
            pump: None,
            settings: PromiseSettings::default(),
        }
    }

    pub fn future(&self) -> Future {
        Future {
            state: self.state.clone(),
            pump: self.pump.clone(),
            settings: self.settings.clone(),
        }
    }

    pub fn set(&self, success: bool) {
        self.set_with_value(success, Value::Null);
    }

    pub fn set_with_value(&self, success: bool, value: Value) {
        if self.state.set.get() {
            trace!("Promise already set, ignoring");
            return;
        }
        self.state.success.set(success);
        *self.state.value.borrow_mut() = value;
        self.state.set.set(true);
    }

    pub fn is_set(&self) -> bool {
        self.state.set.get()
    }
}

impl Default for Promise {
    fn default() -> Self {
        Self::unbound()
    }
}

impl std::fmt::Debug for Promise {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Promise")
            .field("state", &self.state)
            .field("bound", &self.pump.is_some())
            .finish()
    }
}

/// Consumer side of a [`Promise`]
pub struct Future {
    state: Rc<PromiseState>,
    pump: Option<Pump>,
    settings: PromiseSettings,
}

impl Future {
    /// Wait for the outcome; false on timeout
    pub fn get(&self) -> bool {
        self.get_value().0
    }

    /// Wait for the outcome and its value; `(false, Null)` on timeout
    ///
    /// Returns at once when already set. Otherwise pumps the router every
    /// poll interval until set or the timeout elapses. Gives up early if the
    /// router is dropped.
    pub fn get_value(&self) -> (bool, Value) {
        if let Some(result) = self.result() {
            return result;
        }

        let Some(pump) = &self.pump else {
            return (false, Value::Null);
        };

        let timeout = self.settings.timeout();
        let poll_interval = self.settings.poll_interval();
        let mut timer = pump.timers.make_timer();
        timer.reset();

        loop {
            match pump.router.upgrade() {
                Some(router) => router.run(),
                None => {
                    debug!("Future abandoned, router dropped");
                    return (false, Value::Null);
                }
            }

            if let Some(result) = self.result() {
                return result;
            }

            if timer.elapsed() >= timeout {
                debug!("Future timed out");
                return (false, Value::Null);
            }

            timer.sleep(poll_interval);
        }
    }

    fn result(&self) -> Option<(bool, Value)> {
        self.state
            .set
            .get()
            .then(|| (self.state.success.get(), self.state.value.borrow().clone()))
    }
}

impl std::fmt::Debug for Future {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future").field("state", &self.state).finish()
    }
}
