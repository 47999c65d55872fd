//! Scripted actors
//!
//! A [`ScriptedActor`] reacts to tuples through an ordered list of
//! [`TupleHandler`]s. The script interpreter itself lives outside this crate
//! and plugs in through the [`Script`] trait; closures implement it directly.

use crate::actor::{Actor, ActorDirectory};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;
use tracing::{debug, warn};
use tuple_types::{Tuple, TupleRoutingCriteria, Value};

/// Errors raised while evaluating a script
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("No tuple bound to alias '{0}'")]
    UnboundAlias(String),

    #[error("Type error: expected {expected}, found {found}")]
    Type { expected: String, found: String },

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Interpreter seam: anything that evaluates against an execution context
pub trait Script {
    fn eval(&self, ctx: &mut ExecutionContext) -> Result<Value, ScriptError>;
}

impl<F> Script for F
where
    F: Fn(&mut ExecutionContext) -> Result<Value, ScriptError>,
{
    fn eval(&self, ctx: &mut ExecutionContext) -> Result<Value, ScriptError> {
        self(ctx)
    }
}

/// State visible to scripts during one `accept` call
#[derive(Debug, Default)]
pub struct ExecutionContext {
    actor_name: String,
    tuples: HashMap<String, Tuple>,
    received_alias: String,
    outbox: Vec<Tuple>,
}

impl ExecutionContext {
    pub fn new(actor_name: impl Into<String>) -> Self {
        Self {
            actor_name: actor_name.into(),
            ..Self::default()
        }
    }

    pub fn actor_name(&self) -> &str {
        &self.actor_name
    }

    /// Tuple bound under `alias`
    pub fn tuple(&self, alias: &str) -> Result<&Tuple, ScriptError> {
        self.tuples
            .get(alias)
            .ok_or_else(|| ScriptError::UnboundAlias(alias.to_string()))
    }

    /// The tuple that triggered the running handler
    pub fn received(&self) -> Result<&Tuple, ScriptError> {
        self.tuple(&self.received_alias)
    }

    pub fn bind(&mut self, alias: impl Into<String>, tuple: Tuple) {
        let alias = alias.into();
        self.tuples.insert(alias.clone(), tuple);
        self.received_alias = alias;
    }

    /// Queue a tuple to be routed once the handler finishes
    ///
    /// Tuples without a `sourceActor` are stamped with this actor's name.
    pub fn send(&mut self, mut tuple: Tuple) {
        if tuple.source_actor().is_empty() {
            tuple.set_source_actor(&self.actor_name);
        }
        self.outbox.push(tuple);
    }

}

/// One "receives" clause of a scripted actor
pub struct TupleHandler {
    tuple_type: String,
    source_actor: Option<String>,
    alias: Option<String>,
    condition: Option<Box<dyn Script>>,
    body: Box<dyn Script>,
    runtime_errors: RefCell<Vec<ScriptError>>,
}

impl TupleHandler {
    pub fn new(tuple_type: impl Into<String>, body: impl Script + 'static) -> Self {
        Self {
            tuple_type: tuple_type.into(),
            source_actor: None,
            alias: None,
            condition: None,
            body: Box::new(body),
            runtime_errors: RefCell::new(Vec::new()),
        }
    }

    /// Only handle tuples sent by `actor`
    pub fn from_actor(mut self, actor: impl Into<String>) -> Self {
        self.source_actor = Some(actor.into());
        self
    }

    /// Bind the received tuple under `alias` instead of its type
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Run the body only when `condition` evaluates to 1
    pub fn when(mut self, condition: impl Script + 'static) -> Self {
        self.condition = Some(Box::new(condition));
        self
    }

    pub fn tuple_type(&self) -> &str {
        &self.tuple_type
    }

    fn matches(&self, tuple: &Tuple) -> bool {
        let source_ok = match &self.source_actor {
            Some(source) => source.is_empty() || source == tuple.source_actor(),
            None => true,
        };
        source_ok && tuple.tuple_type() == self.tuple_type
    }

    /// Errors raised by this handler's most recent run
    pub fn runtime_errors(&self) -> Vec<ScriptError> {
        self.runtime_errors.borrow().clone()
    }

    fn record(&self, error: ScriptError) {
        self.runtime_errors.borrow_mut().push(error);
    }

    /// Evaluate this handler, returning whether its body ran
    ///
    /// Errors from the condition or the body are kept on this handler until
    /// it next matches a tuple.
    fn run(&self, tuple: &Tuple, ctx: &mut ExecutionContext) -> bool {
        if !self.matches(tuple) {
            return false;
        }
        self.runtime_errors.borrow_mut().clear();

        let alias = self.alias.as_deref().unwrap_or(&self.tuple_type);
        ctx.bind(alias, tuple.clone());

        if let Some(condition) = &self.condition {
            match condition.eval(ctx) {
                Ok(result) if result.is_truthy() => {}
                Ok(_) => return false,
                Err(e) => {
                    warn!(
                        "Condition for {} handler in {} failed: {}",
                        self.tuple_type, ctx.actor_name, e
                    );
                    self.record(e);
                    return false;
                }
            }
        }

        // A failing body still counts as handled
        if let Err(e) = self.body.eval(ctx) {
            warn!(
                "{} handler in {} failed: {}",
                self.tuple_type, ctx.actor_name, e
            );
            self.record(e);
        }
        true
    }
}

impl fmt::Debug for TupleHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TupleHandler")
            .field("tuple_type", &self.tuple_type)
            .field("source_actor", &self.source_actor)
            .field("alias", &self.alias)
            .field("has_condition", &self.condition.is_some())
            .finish()
    }
}

/// Actor whose behaviour is a list of script handlers
///
/// Handlers are tried in order; the first whose type, source and condition
/// match runs and wins.
pub struct ScriptedActor {
    name: RefCell<String>,
    handlers: Vec<TupleHandler>,
    directory: RefCell<Option<Weak<dyn ActorDirectory>>>,
}

impl ScriptedActor {
    pub fn new(name: impl Into<String>, handlers: Vec<TupleHandler>) -> Self {
        Self {
            name: RefCell::new(name.into()),
            handlers,
            directory: RefCell::new(None),
        }
    }

    pub fn handlers(&self) -> &[TupleHandler] {
        &self.handlers
    }

    /// Register with `directory` and subscribe to this actor's tuples
    ///
    /// Requests one subscription for the actor's name and one per handler
    /// type. Subscriptions are not withdrawn on drop since other actors on
    /// this node may share them.
    pub fn register(self: &Rc<Self>, directory: Rc<dyn ActorDirectory>) {
        let actor: Rc<dyn Actor> = self.clone();
        directory.register_actor(&actor);

        for criteria in self.subscriptions() {
            directory.request_subscription(&criteria);
        }

        *self.directory.borrow_mut() = Some(Rc::downgrade(&directory));
    }

    /// Deregister from the directory this actor registered with
    pub fn deregister(&self) {
        let directory = self.directory.borrow_mut().take();
        if let Some(directory) = directory.and_then(|d| d.upgrade()) {
            directory.deregister_actor(self);
        }
    }

    fn subscriptions(&self) -> Vec<TupleRoutingCriteria> {
        let mut criteria =
            vec![TupleRoutingCriteria::new().with_destination_actor(self.name.borrow().clone())];
        criteria.extend(
            self.handlers
                .iter()
                .map(|handler| TupleRoutingCriteria::new().with_type(handler.tuple_type.clone())),
        );
        criteria
    }

    /// Change the dispatch name, subscribing to the new name if registered
    pub fn rename(&self, name: impl Into<String>) {
        let name = name.into();
        *self.name.borrow_mut() = name.clone();

        if let Some(directory) = self.directory() {
            directory.request_subscription(&TupleRoutingCriteria::new().with_destination_actor(name));
        }
    }

    /// Errors raised by each handler's most recent run, in handler order
    pub fn runtime_errors(&self) -> Vec<ScriptError> {
        self.handlers
            .iter()
            .flat_map(TupleHandler::runtime_errors)
            .collect()
    }

    /// Evaluate a one-off script in this actor's context
    pub fn eval_one(&self, script: &dyn Script) -> Result<Value, ScriptError> {
        let mut ctx = ExecutionContext::new(self.name.borrow().clone());
        let result = script.eval(&mut ctx);
        self.flush(ctx.outbox);
        result
    }

    fn directory(&self) -> Option<Rc<dyn ActorDirectory>> {
        self.directory.borrow().as_ref().and_then(Weak::upgrade)
    }

    fn flush(&self, outbox: Vec<Tuple>) {
        if outbox.is_empty() {
            return;
        }
        match self.directory() {
            Some(directory) => {
                for tuple in &outbox {
                    directory.send(tuple);
                }
            }
            None => debug!(
                "{} dropped {} outgoing tuples: not registered",
                self.name.borrow(),
                outbox.len()
            ),
        }
    }
}

impl Actor for ScriptedActor {
    fn accept(&self, tuple: &Tuple) -> bool {
        let mut ctx = ExecutionContext::new(self.name.borrow().clone());

        let ran = self
            .handlers
            .iter()
            .any(|handler| handler.run(tuple, &mut ctx));

        if ran {
            self.flush(ctx.outbox);
        }
        ran
    }

    fn actor_name(&self) -> String {
        self.name.borrow().clone()
    }
}

impl fmt::Debug for ScriptedActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedActor")
            .field("name", &*self.name.borrow())
            .field("handlers", &self.handlers)
            .finish()
    }
}
