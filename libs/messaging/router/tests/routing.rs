//! Multi-node routing scenarios
//!
//! Routers linked by in-process queue routes, exercising the subscription
//! handshake, reply round trips across threads and relaying through a
//! middle node.

use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use tuple_actors::{Actor, ExecutionContext, NativeActor, ScriptError, ScriptedActor, TupleHandler};
use tuple_router::test_utils::{FailingRoute, RecordingActor};
use tuple_router::{Delivery, Queueing, TupleRoute, TupleRouter};
use tuple_types::{keys, types, Tuple, TupleRoutingCriteria, Value};

fn node(id: &str) -> Rc<TupleRouter> {
    let router = Rc::new(TupleRouter::new(id));
    router.set_my_id(id);
    router
}

fn recording(router: &TupleRouter, name: &str) -> Rc<RecordingActor> {
    let actor = Rc::new(RecordingActor::new(name));
    let as_dyn: Rc<dyn Actor> = actor.clone();
    router.register_actor(&as_dyn);
    actor
}

#[test]
fn test_queue_round_trip_preserves_every_field() {
    let a = node("node-a");
    let b = node("node-b");
    let (to_b, to_a) = Queueing::pair("a->b", "b->a");
    let (to_b, to_a) = (Rc::new(to_b), Rc::new(to_a));
    a.add_route(to_b.clone(), true);
    b.add_route(to_a.clone(), true);
    let sink = recording(&b, "Sink");

    let tuple = Tuple::of_type("Report")
        .with(keys::SOURCE_ACTOR, "Probe")
        .with(keys::SOURCE_ID, "node-a")
        .with(keys::DESTINATION_ACTOR, "Sink")
        .with(keys::DESTINATION_ID, "node-b")
        .with("readings", vec![Value::from(1.5), Value::from("high")])
        .with("blob", Value::binary(vec![0u8, 1, 2, 255]));

    assert_eq!(a.route(&tuple), Ok(false));
    b.run();

    assert_eq!(sink.last(), Some(tuple));
}

#[test]
fn test_subscription_handshake_gates_parent_sends() {
    let child = node("child");
    let parent = node("parent");
    let (up, down) = Queueing::pair("child->parent", "parent->child");
    let (up, down) = (Rc::new(up), Rc::new(down));
    child.add_route(up.clone(), true);
    parent.add_route(down.clone(), false);
    let chat = recording(&child, "Chat");

    let criteria = TupleRoutingCriteria::new().with_destination_actor("Chat");
    let say = Tuple::of_type("Say").with(keys::DESTINATION_ACTOR, "Chat");
    assert!(!down.can_route(&say));

    assert_eq!(
        child.send_add_routing_criteria_request(&criteria),
        Ok(Delivery::Sent)
    );
    parent.run();
    assert!(down.can_route(&say));

    parent.route(&say).unwrap();
    child.run();
    assert_eq!(chat.count(), 1);

    child.send_remove_routing_criteria_request(&criteria).unwrap();
    parent.run();
    assert!(!down.can_route(&say));

    parent.route(&say).unwrap();
    child.run();
    assert_eq!(chat.count(), 1);
}

#[test]
fn test_middle_node_relays_subscriptions_and_traffic() {
    let root = node("root");
    let middle = node("middle");
    let leaf = node("leaf");

    let (middle_up, root_down) = Queueing::pair("middle->root", "root->middle");
    let (leaf_up, middle_down) = Queueing::pair("leaf->middle", "middle->leaf");
    let (middle_up, root_down) = (Rc::new(middle_up), Rc::new(root_down));
    let (leaf_up, middle_down) = (Rc::new(leaf_up), Rc::new(middle_down));
    root.add_route(root_down.clone(), false);
    middle.add_route(middle_up.clone(), true);
    middle.add_route(middle_down.clone(), false);
    leaf.add_route(leaf_up.clone(), true);
    let chat = recording(&leaf, "Chat");

    let criteria = TupleRoutingCriteria::new().with_destination_actor("Chat");
    leaf.send_add_routing_criteria_request(&criteria).unwrap();
    middle.run();
    root.run();
    assert!(root_down.can_route(&Tuple::of_type("Say").with(keys::DESTINATION_ACTOR, "Chat")));

    root.route(&Tuple::of_type("Say").with(keys::DESTINATION_ACTOR, "Chat"))
        .unwrap();
    middle.run();
    leaf.run();
    assert_eq!(chat.count(), 1);
}

#[test]
fn test_authenticate_never_crosses_a_relay() {
    let server = node("server");
    let relay = node("relay");
    let (relay_up, server_down) = Queueing::pair("relay->server", "server->relay");
    let (relay_up, server_down) = (Rc::new(relay_up), Rc::new(server_down));
    let client_side = Rc::new(FailingRoute::new("client"));
    server.add_route(server_down.clone(), false);
    relay.add_route(relay_up.clone(), true);
    relay.add_route(client_side.clone(), false);
    let server_auth = recording(&server, "Auth");
    let relay_auth = recording(&relay, "Auth");

    client_side.push_incoming(Tuple::of_type(types::AUTHENTICATE).with(keys::SEALING_KEY, "k"));
    relay.run();
    server.run();

    assert_eq!(relay_auth.count(), 1);
    assert_eq!(server_auth.count(), 0);

    // Not even a direct send can carry it over a queue
    assert!(relay_up
        .send_tuple(&Tuple::of_type(types::AUTHENTICATE), true)
        .is_err());
}

#[test]
fn test_ping_is_accepted_exactly_once() {
    let router = node("node-a");
    let hits = Rc::new(RefCell::new(0));
    let counter = hits.clone();
    let pong: Rc<dyn Actor> = Rc::new(NativeActor::new("Pong", move |tuple: &Tuple| {
        if tuple.tuple_type() != "Ping" {
            return false;
        }
        *counter.borrow_mut() += 1;
        true
    }));
    router.register_actor(&pong);
    let bystander = recording(&router, "Other");

    let ping = Tuple::of_type("Ping")
        .with(keys::DESTINATION_ACTOR, "Pong")
        .with(keys::DESTINATION_ID, "node-a");
    assert_eq!(router.route(&ping), Ok(true));
    assert_eq!(*hits.borrow(), 1);
    assert_eq!(bystander.count(), 0);
}

#[test]
fn test_reply_across_threads_resolves_promise() {
    let (to_server, to_client) = Queueing::pair("client->server", "server->client");
    let stopper = to_client.stopper();

    let server = thread::spawn(move || {
        let router = node("server");
        let route = Rc::new(to_client);
        router.add_route(route.clone(), true);

        let weak = Rc::downgrade(&router);
        let pong: Rc<dyn Actor> = Rc::new(NativeActor::new("Pong", move |tuple: &Tuple| {
            if tuple.tuple_type() != "Ping" {
                return false;
            }
            let reply = Tuple::of_type("Pong")
                .with(keys::DESTINATION_ACTOR, tuple.source_actor())
                .with(keys::DESTINATION_ID, tuple.source_id())
                .with("n", tuple.get("n").clone());
            weak.upgrade().is_some_and(|router| router.route(&reply).is_ok())
        }));
        router.register_actor(&pong);

        loop {
            route.wait_incoming();
            if route.is_stopped() {
                break;
            }
            router.run();
        }
    });

    let client = node("client");
    let route = Rc::new(to_server);
    client.add_route(route.clone(), true);

    let promise = client.promise();
    let resolver = promise.clone();
    let waiter: Rc<dyn Actor> = Rc::new(NativeActor::new("Client", move |tuple: &Tuple| {
        if tuple.tuple_type() != "Pong" {
            return false;
        }
        resolver.set_with_value(true, tuple.get("n").clone());
        true
    }));
    client.register_actor(&waiter);

    let ping = Tuple::of_type("Ping")
        .with(keys::SOURCE_ACTOR, "Client")
        .with(keys::SOURCE_ID, "client")
        .with(keys::DESTINATION_ACTOR, "Pong")
        .with(keys::DESTINATION_ID, "server")
        .with("n", 42);
    assert_eq!(client.route(&ping), Ok(false));

    let (ok, value) = promise.future().get_value();
    stopper.stop();
    server.join().unwrap();

    assert!(ok);
    assert_eq!(value, Value::from(42));
}

#[test]
fn test_scripted_actor_subscribes_and_replies_through_router() {
    let router = node("node-a");
    let upstream = Rc::new(FailingRoute::new("upstream"));
    router.add_route(upstream.clone(), true);

    let greeter = Rc::new(ScriptedActor::new(
        "Greeter",
        vec![TupleHandler::new(
            "Hello",
            |ctx: &mut ExecutionContext| -> Result<Value, ScriptError> {
                let who = ctx.received()?.source_id().to_string();
                ctx.send(Tuple::of_type("Welcome").with(keys::DESTINATION_ID, who));
                Ok(Value::Null)
            },
        )],
    ));
    greeter.register(router.clone());

    // One subscription for the actor's name, one for its handler type
    let subscriptions = upstream.sent();
    assert_eq!(subscriptions.len(), 2);
    assert!(subscriptions.iter().all(Tuple::is_control));

    upstream.push_incoming(Tuple::of_type("Hello").with(keys::SOURCE_ID, "node-b"));
    router.run();

    let welcome = upstream.sent().pop().unwrap();
    assert_eq!(welcome.tuple_type(), "Welcome");
    assert_eq!(welcome.source_actor(), "Greeter");
    assert_eq!(welcome.destination_id(), "node-b");
}
