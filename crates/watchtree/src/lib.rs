//! watchtree — a reactive tree store.
//!
//! Callers hold a nested tree of plain values; the store tracks every
//! write made through it, classifies the structural difference against the
//! last committed snapshot (CREATE / UPDATE / REMOVE / NONE per path), and
//! fans typed notifications out to exact-path listeners, wildcard
//! listeners, a global catch-all, and external subscribers — including
//! other stores, namespaced.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use watchtree::{Node, Store};
//!
//! let store = Store::from_value(serde_json::json!({"name": "dave"}));
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! store.on("update:name", move |args| {
//!     log.borrow_mut().push(args[0].node());
//! });
//! store.set("name", "bert").unwrap();
//! assert_eq!(*seen.borrow(), vec![Node::from("bert")]);
//! assert_eq!(store.get("name").node(), Node::from("bert"));
//! ```

mod change;
mod diff;
mod events;
mod handle;
mod path;
mod store;

pub use change::{classify_leaf, wildcard_namespace, Change};
pub use events::{ListenerId, Resolved, Subscriber};
pub use handle::NodeHandle;
pub use path::{split_segments, Path};
pub use store::Store;

pub use watchtree_node::{
    deep_clone, deep_equal, Callable, CircularReferenceError, CompositeWeak, Fields, Items, Node,
};
