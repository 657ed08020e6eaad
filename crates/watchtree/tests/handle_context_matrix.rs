//! Live handles: context-scoped events, lazy resolution, orphan-proofing.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use watchtree::{Node, Resolved, Store};

fn test_store() -> Store {
    Store::from_value(json!({
        "stuff": {
            "northwind": "costa",
            "info": [1, 2, 3],
        },
        "name": "dave",
    }))
}

fn handle(store: &Store, path: &str) -> watchtree::NodeHandle {
    let Resolved::Proxy(handle) = store.get(path) else {
        panic!("expected a handle at {path}");
    };
    handle
}

#[test]
fn handle_on_scopes_the_event_to_its_context() {
    let store = test_store();
    let stuff = handle(&store, "stuff");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    stuff.on("change", move |args| {
        sink.borrow_mut().push(args[0].as_str().unwrap().to_string());
    });
    store.set("stuff.northwind", "eggs").unwrap();
    assert_eq!(*seen.borrow(), vec!["UPDATE"]);
}

#[test]
fn handle_on_with_subkey_scopes_below_the_context() {
    let store = test_store();
    let stuff = handle(&store, "stuff");
    let seen = Rc::new(RefCell::new(0u32));
    let count = seen.clone();
    stuff.on("change:northwind", move |_| *count.borrow_mut() += 1);
    store.set("stuff.northwind", "eggs").unwrap();
    store.set("name", "other").unwrap();
    assert_eq!(*seen.borrow(), 1);
}

#[test]
fn writes_through_a_handle_run_the_pipeline() {
    let store = test_store();
    let stuff = handle(&store, "stuff");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    stuff.on("change", move |args| {
        sink.borrow_mut().push(args[0].as_str().unwrap().to_string());
    });
    stuff.set("name", "Harry").unwrap();
    // A created field is its container's update.
    assert_eq!(*seen.borrow(), vec!["UPDATE"]);
    assert_eq!(store.get("stuff.name").node(), Node::from("Harry"));
}

#[test]
fn get_on_a_sub_object() {
    let store = test_store();
    store.set("test.testing", json!({"name": "bobbert"})).unwrap();
    let testing = handle(&store, "test.testing");
    assert_eq!(testing.get("name").node(), Node::from("bobbert"));
}

#[test]
fn handle_sees_its_own_removal() {
    let store = test_store();
    store.set("test.testing", json!({"name": "bobbert"})).unwrap();
    let testing = handle(&store, "test.testing");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    testing.on("change", move |args| {
        sink.borrow_mut().push(args[0].as_str().unwrap().to_string());
    });
    store.set("test", json!({})).unwrap();
    assert_eq!(*seen.borrow(), vec!["REMOVE"]);
}

#[test]
fn set_through_a_handle_reports_old_and_new() {
    let store = test_store();
    store.set("test.testing", json!({"name": "bobbert"})).unwrap();
    let testing = handle(&store, "test.testing");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    testing.on("change", move |args| {
        sink.borrow_mut().push((
            args[0].as_str().unwrap().to_string(),
            args[1].child("name"),
            args[2].child("name"),
        ));
    });
    testing.set("name", "Jane").unwrap();
    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].0, "UPDATE");
    assert_eq!(seen[0].1, Node::from("Jane"));
    assert_eq!(seen[0].2, Node::from("bobbert"));
}

#[test]
fn context_reports_the_bound_path() {
    let store = test_store();
    store.set("test.testing.1", json!({"name": "bobbert"})).unwrap();
    let testing = handle(&store, "test.testing.1");
    assert_eq!(testing.context(), "test.testing.1");
}

#[test]
fn replaced_subtree_resolves_to_the_replacement() {
    let store = test_store();
    store.set("test", json!({"data": {"name": "abc"}})).unwrap();
    let data = handle(&store, "test.data");
    store.set("test", json!({"data": {"name": "def"}})).unwrap();
    assert_eq!(data.get("name").node(), Node::from("def"));
    assert_eq!(data.field("name").node(), Node::from("def"));
}

#[test]
fn vanished_subtree_resolves_to_undefined() {
    let store = test_store();
    store.set("test", json!({"data": {"name": "abc"}})).unwrap();
    let data = handle(&store, "test.data");
    store.set("test", json!({})).unwrap();
    assert!(data.get("name").node().is_undefined());
    assert!(data.node().is_undefined());
}

#[test]
fn orphaned_handle_writes_land_at_the_live_path() {
    let store = test_store();
    store.set("test", json!({"data": {"name": "abc"}})).unwrap();
    let data = handle(&store, "test.data");
    store.set("test", json!({"data": {"name": "def"}})).unwrap();
    data.set("name", "huh").unwrap();
    assert_eq!(store.get("test.data.name").node(), Node::from("huh"));
}

#[test]
fn orphaned_handle_writes_recreate_missing_ancestors() {
    let store = test_store();
    store.set("test", json!({"data": {"name": "abc"}})).unwrap();
    let data = handle(&store, "test.data");
    store.set("test", json!({})).unwrap();
    data.set("name", "hmm").unwrap();
    assert_eq!(store.get("test.data.name").node(), Node::from("hmm"));
}

#[test]
fn update_payloads_are_live_handles_for_composites() {
    let store = test_store();
    store.set("test.testing", json!({"name": "bobbert"})).unwrap();
    let testing = handle(&store, "test.testing");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    testing.on("update", move |args| {
        let proxy = args[0].proxy().expect("composite payload is a handle");
        sink.borrow_mut().push(proxy.context().to_string());
    });
    store.set("test.testing", json!({"name": "ziggy"})).unwrap();
    assert_eq!(*seen.borrow(), vec!["test.testing"]);
}

#[test]
fn handles_are_identity_stable_per_node() {
    let store = test_store();
    let first = handle(&store, "stuff");
    let second = handle(&store, "stuff");
    assert!(first.same_handle(&second));

    // A wholesale replacement is a different node, so a fresh handle.
    store.set("stuff", json!({"northwind": "costa"})).unwrap();
    let third = handle(&store, "stuff");
    assert!(!first.same_handle(&third));
}

#[test]
fn handle_enumeration_tracks_the_live_node() {
    let store = test_store();
    let stuff = handle(&store, "stuff");
    assert_eq!(stuff.keys(), vec!["northwind", "info"]);
    store.set("stuff.cheese", "yes").unwrap();
    assert_eq!(stuff.keys(), vec!["northwind", "info", "cheese"]);
    assert_eq!(
        stuff.to_value(),
        json!({"northwind": "costa", "info": [1, 2, 3], "cheese": "yes"})
    );
}

#[test]
fn handle_remove_deletes_below_the_context() {
    let store = test_store();
    let stuff = handle(&store, "stuff");
    stuff.remove("northwind").unwrap();
    assert!(store.get("stuff.northwind").node().is_undefined());
}

#[test]
fn handle_trigger_is_scoped_to_the_context() {
    let store = test_store();
    let stuff = handle(&store, "stuff");
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    store.on("poke:stuff", move |args| {
        sink.borrow_mut().push(args[0].node());
    });
    stuff.trigger("poke", &[Resolved::Value(Node::from(1))]);
    assert_eq!(*seen.borrow(), vec![Node::from(1)]);
}

#[test]
fn root_handle_binds_global_event_names() {
    let store = test_store();
    let root = store.root();
    let seen = Rc::new(RefCell::new(0u32));
    let count = seen.clone();
    root.on("change", move |_| *count.borrow_mut() += 1);
    store.set("name", "Bob").unwrap();
    assert_eq!(*seen.borrow(), 1);
}

#[test]
fn handles_survive_their_store() {
    let orphan = {
        let store = test_store();
        handle(&store, "stuff")
    };
    assert!(orphan.node().is_undefined());
    assert!(orphan.get("northwind").node().is_undefined());
    orphan.set("northwind", "x").unwrap();
    assert_eq!(orphan.context(), "stuff");
}
