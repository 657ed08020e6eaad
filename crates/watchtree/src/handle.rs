//! Path-bound live handles into the store.
//!
//! A handle carries only its dotted context and a weak back-reference to
//! the store; every access re-resolves against the live tree, so a handle
//! taken before a wholesale ancestor replacement keeps observing whatever
//! is at its path now — including `Undefined` once the path is gone.

use std::fmt;
use std::rc::{Rc, Weak};

use watchtree_node::{CircularReferenceError, Node};

use crate::events::{ListenerId, Resolved};
use crate::store::{Store, StoreInner};

#[derive(Clone)]
pub struct NodeHandle {
    pub(crate) inner: Rc<HandleInner>,
}

pub(crate) struct HandleInner {
    pub(crate) store: Weak<StoreInner>,
    pub(crate) context: String,
}

/// Rewrite an event name into a handle's scope: `change` listens at the
/// handle's own path, `change:name` at the `name` field below it. A root
/// handle's names pass through unchanged and bind the global keys.
fn scoped_event(context: &str, event: &str) -> String {
    if context.is_empty() {
        return event.to_string();
    }
    match event.split_once(':') {
        Some((kind, sub)) => format!("{kind}:{context}.{sub}"),
        None => format!("{event}:{context}"),
    }
}

impl NodeHandle {
    pub(crate) fn new(store: Weak<StoreInner>, context: String) -> NodeHandle {
        NodeHandle {
            inner: Rc::new(HandleInner { store, context }),
        }
    }

    fn store(&self) -> Option<Store> {
        self.inner.store.upgrade().map(|inner| Store { inner })
    }

    fn scope(&self, subpath: &str) -> String {
        let context = &self.inner.context;
        if context.is_empty() {
            subpath.to_string()
        } else if subpath.is_empty() {
            context.clone()
        } else {
            format!("{context}.{subpath}")
        }
    }

    /// The dotted path this handle is bound to.
    pub fn context(&self) -> &str {
        &self.inner.context
    }

    /// Current live value at the bound path.
    pub fn node(&self) -> Node {
        match self.store() {
            Some(store) => store.resolve_context(&self.inner.context),
            None => Node::Undefined,
        }
    }

    pub fn get(&self, subpath: &str) -> Resolved {
        self.get_or(subpath, Node::Undefined)
    }

    pub fn get_or(&self, subpath: &str, fallback: Node) -> Resolved {
        match self.store() {
            Some(store) => store.get_or(self.scope(subpath).as_str(), fallback),
            None => Resolved::Value(fallback),
        }
    }

    /// Transparent field read: resolves one field below the handle and
    /// emits a single `read` event for the full field path.
    pub fn field(&self, name: &str) -> Resolved {
        match self.store() {
            Some(store) => store.field_read(&self.scope(name)),
            None => Resolved::Value(Node::Undefined),
        }
    }

    pub fn set(&self, subpath: &str, value: impl Into<Node>) -> Result<(), CircularReferenceError> {
        match self.store() {
            Some(store) => store.set(self.scope(subpath).as_str(), value),
            None => Ok(()),
        }
    }

    pub fn remove(&self, subpath: &str) -> Result<(), CircularReferenceError> {
        match self.store() {
            Some(store) => store.remove(self.scope(subpath).as_str()),
            None => Ok(()),
        }
    }

    pub fn on(&self, event: &str, callback: impl Fn(&[Resolved]) + 'static) -> ListenerId {
        match self.store() {
            Some(store) => store.on(&scoped_event(&self.inner.context, event), callback),
            None => 0,
        }
    }

    pub fn off(&self, event: &str) {
        if let Some(store) = self.store() {
            store.off(&scoped_event(&self.inner.context, event));
        }
    }

    pub fn trigger(&self, event: &str, args: &[Resolved]) {
        if let Some(store) = self.store() {
            store.trigger(&scoped_event(&self.inner.context, event), args);
        }
    }

    /// Keys of the live value at the bound path.
    pub fn keys(&self) -> Vec<String> {
        self.node().keys()
    }

    pub fn to_value(&self) -> serde_json::Value {
        self.node().to_value()
    }

    /// Whether two handles are the same issued record. Handles for the
    /// same underlying composite are deduplicated by the store, so this
    /// holds across repeated reads of one node.
    pub fn same_handle(&self, other: &NodeHandle) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeHandle({:?})", self.inner.context)
    }
}
