//! Hydra - background router pump
//!
//! Runs a [`TupleRouter`] on its own named OS thread. The thread owns the
//! router and every actor `setup` registers on it; the only link back to the
//! spawning thread is the [`Queueing`] route handed to [`Hydra::spawn`].
//!
//! The pump sleeps in `wait_incoming` until a tuple arrives, runs one router
//! cycle, and repeats until stopped.

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info};
use tuple_actors::Actor;
use tuple_config::{RouterSettings, TupleSpaceConfig};
use tuple_router::{QueueStopper, Queueing, SystemTimers, TupleRouter};

/// Pump thread errors
#[derive(Debug, thiserror::Error)]
pub enum HydraError {
    #[error("Failed to spawn thread {name}: {source}")]
    Spawn {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Thread {0} panicked")]
    Panicked(String),
}

/// Handle to a running pump thread
///
/// Dropping the handle stops and joins the thread.
#[derive(Debug)]
pub struct Hydra {
    thread_name: String,
    stopping: Arc<AtomicBool>,
    stopper: QueueStopper,
    handle: Option<JoinHandle<()>>,
}

impl Hydra {
    /// Start the pump thread
    ///
    /// `setup` runs on the new thread once the router exists and the route is
    /// attached as its default route. The actors it returns live as long as
    /// the thread does.
    pub fn spawn<F>(config: &TupleSpaceConfig, route: Queueing, setup: F) -> Result<Self, HydraError>
    where
        F: FnOnce(&Rc<TupleRouter>) -> Vec<Rc<dyn Actor>> + Send + 'static,
    {
        let thread_name = config.hydra.thread_name.clone();
        let router_settings = RouterSettings {
            name: config.hydra.router_name.clone(),
            node_id: Some(config.hydra.node_id.clone()),
            ..config.router.clone()
        };
        let promise_settings = config.promise.clone();

        let stopping = Arc::new(AtomicBool::new(false));
        let stopper = route.stopper();
        let thread_stopping = stopping.clone();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                let router = Rc::new(TupleRouter::with_settings(
                    router_settings,
                    promise_settings,
                    Rc::new(SystemTimers),
                ));
                let route = Rc::new(route);
                router.add_route(route.clone(), true);

                let actors = setup(&router);
                debug!(
                    "Hydra {} running with {} actors",
                    router.name(),
                    actors.len()
                );

                loop {
                    route.wait_incoming();
                    if thread_stopping.load(Ordering::Acquire) || route.is_stopped() {
                        break;
                    }
                    router.run();
                }

                debug!("Hydra {} stopped", router.name());
            })
            .map_err(|source| HydraError::Spawn {
                name: thread_name.clone(),
                source,
            })?;

        info!("Started pump thread {}", thread_name);
        Ok(Self {
            thread_name,
            stopping,
            stopper,
            handle: Some(handle),
        })
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the pump and join it; idempotent
    pub fn stop(&mut self) -> Result<(), HydraError> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };

        self.stopping.store(true, Ordering::Release);
        self.stopper.stop();

        handle
            .join()
            .map_err(|_| HydraError::Panicked(self.thread_name.clone()))?;
        info!("Stopped pump thread {}", self.thread_name);
        Ok(())
    }
}

impl Drop for Hydra {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!("{}", e);
        }
    }
}
