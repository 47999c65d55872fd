//! Hydra demo: ping/pong between the main thread and a pump thread

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tuple_actors::{Actor, NativeActor};
use tuple_config::TupleSpaceConfig;
use tuple_hydra::Hydra;
use tuple_router::{Promise, Queueing, SystemTimers, TupleRouter};
use tuple_types::{keys, Tuple, TupleRoutingCriteria, Value};
use uuid::Uuid;

const PING: &str = "Ping";
const PONG: &str = "Pong";
const PINGER: &str = "Pinger";
const RESPONDER: &str = "Responder";

#[derive(Parser, Debug)]
#[command(name = "hydra")]
#[command(about = "Exchange pings with a background router thread")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configuration
    #[arg(short, long)]
    log_level: Option<String>,

    /// Number of pings to send
    #[arg(short, long, default_value_t = 3)]
    pings: u32,

    /// Node ID of the main thread's router (random when omitted)
    #[arg(long)]
    node_id: Option<String>,

    /// Extra tuple to route after the pings, as a JSON object; repeatable
    #[arg(long = "tuple", value_name = "JSON")]
    tuples: Vec<String>,
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).context("Invalid log level")?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Parse `--tuple` arguments, stamping the sender when they leave it out
fn parse_tuples(inputs: &[String], my_id: &str) -> Result<Vec<Tuple>> {
    inputs
        .iter()
        .map(|input| {
            let mut tuple = Tuple::from_json_str(input)
                .with_context(|| format!("Invalid --tuple {}", input))?;
            if tuple.source_actor().is_empty() {
                tuple.set_source_actor(PINGER);
            }
            if tuple.source_id().is_empty() {
                tuple.set_source_id(my_id);
            }
            Ok(tuple)
        })
        .collect()
}

/// Responder living on the pump thread: answers each ping with a pong
fn responder(router: &Rc<TupleRouter>) -> Vec<Rc<dyn Actor>> {
    let weak = Rc::downgrade(router);
    let pong: Rc<dyn Actor> = Rc::new(NativeActor::new(RESPONDER, move |tuple: &Tuple| {
        if tuple.tuple_type() != PING {
            return false;
        }
        let Some(router) = weak.upgrade() else {
            return false;
        };

        let reply = Tuple::of_type(PONG)
            .with(keys::SOURCE_ACTOR, RESPONDER)
            .with(keys::SOURCE_ID, router.my_id())
            .with(keys::DESTINATION_ACTOR, tuple.source_actor())
            .with(keys::DESTINATION_ID, tuple.source_id())
            .with("seq", tuple.get("seq").clone());
        router.route(&reply).is_ok()
    }));
    router.register_actor(&pong);
    vec![pong]
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TupleSpaceConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(node_id) = args.node_id {
        config.router.node_id = Some(node_id);
    }
    let my_id = config
        .router
        .node_id
        .get_or_insert_with(|| format!("client-{}", Uuid::new_v4()))
        .clone();

    let extra = parse_tuples(&args.tuples, &my_id)?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_logging(level, config.logging.json)?;

    info!("Hydra demo starting as {}", my_id);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let (to_hydra, from_main) = Queueing::pair("main", &config.hydra.router_name);
    let mut hydra = Hydra::spawn(&config, from_main, responder)?;

    let router = Rc::new(TupleRouter::from_config(
        &config,
        Rc::new(SystemTimers),
    ));
    let route = Rc::new(to_hydra);
    router.add_route(route.clone(), true);

    // Ask the pump thread for anything addressed to this node
    router.send_add_routing_criteria_request(
        &TupleRoutingCriteria::new().with_destination_id(my_id.clone()),
    )?;

    let pending: Rc<RefCell<Option<Promise>>> = Rc::new(RefCell::new(None));
    let slot = pending.clone();
    let pinger: Rc<dyn Actor> = Rc::new(NativeActor::new(PINGER, move |tuple: &Tuple| {
        if tuple.tuple_type() != PONG {
            return false;
        }
        match slot.borrow_mut().take() {
            Some(promise) => {
                promise.set_with_value(true, tuple.get("seq").clone());
                true
            }
            None => {
                debug!("Late pong {}, dropped", tuple.get("seq"));
                false
            }
        }
    }));
    router.register_actor(&pinger);

    let mut unanswered = 0;
    for seq in 0..args.pings {
        let promise = router.promise();
        let future = promise.future();
        *pending.borrow_mut() = Some(promise);

        let ping = Tuple::of_type(PING)
            .with(keys::SOURCE_ACTOR, PINGER)
            .with(keys::SOURCE_ID, my_id.as_str())
            .with(keys::DESTINATION_ACTOR, RESPONDER)
            .with(keys::DESTINATION_ID, config.hydra.node_id.as_str())
            .with("seq", seq);

        let started = Instant::now();
        router.route(&ping)?;
        let (answered, value) = future.get_value();

        if answered && value == Value::from(seq) {
            info!("Pong {} in {:?}", seq, started.elapsed());
        } else {
            warn!("Ping {} unanswered", seq);
            pending.borrow_mut().take();
            unanswered += 1;
        }
    }

    for tuple in &extra {
        match router.route(tuple) {
            Ok(handled) => info!("Routed {} (handled locally: {})", tuple.brief(), handled),
            Err(e) => warn!("Failed to route {}: {}", tuple.brief(), e),
        }
    }

    hydra.stop()?;

    if unanswered > 0 {
        bail!("{} of {} pings unanswered", unanswered, args.pings);
    }
    info!("All {} pings answered", args.pings);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tuples_stamps_missing_sender() {
        let inputs = vec![
            r#"{"type":"Note","text":"hi"}"#.to_string(),
            r#"{"type":"Note","sourceActor":"Scribe","sourceID":"elsewhere"}"#.to_string(),
        ];
        let tuples = parse_tuples(&inputs, "client-1").unwrap();

        assert_eq!(tuples[0].source_actor(), PINGER);
        assert_eq!(tuples[0].source_id(), "client-1");
        assert_eq!(tuples[0].get("text"), &Value::from("hi"));
        assert_eq!(tuples[1].source_actor(), "Scribe");
        assert_eq!(tuples[1].source_id(), "elsewhere");
    }

    #[test]
    fn test_parse_tuples_rejects_non_objects() {
        assert!(parse_tuples(&["[1,2]".to_string()], "client-1").is_err());
        assert!(parse_tuples(&["{".to_string()], "client-1").is_err());
    }
}
