//! Listener registry and event payloads.
//!
//! The registry is exact-match: wildcard delivery works because the
//! classifier fires each event under both its namespace and its wildcard
//! namespace. Listeners are kept per event name in registration order;
//! external subscribers are kept in subscription order alongside their
//! namespace prefix.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use watchtree_node::Node;

use crate::handle::NodeHandle;

/// Identifies one listener registration within a store. Ids start at 1.
pub type ListenerId = u64;

pub(crate) type ListenerFn = Rc<dyn Fn(&[Resolved])>;

/// A value as seen through the store: either a raw node, or a live handle
/// when the value is a composite that listeners should observe through the
/// store rather than via a detached copy.
#[derive(Clone)]
pub enum Resolved {
    Value(Node),
    Proxy(NodeHandle),
}

impl Resolved {
    /// The current value: raw nodes as-is, handles re-resolved live.
    pub fn node(&self) -> Node {
        match self {
            Resolved::Value(node) => node.clone(),
            Resolved::Proxy(handle) => handle.node(),
        }
    }

    pub fn proxy(&self) -> Option<&NodeHandle> {
        match self {
            Resolved::Proxy(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Resolved::Value(Node::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn is_undefined(&self) -> bool {
        self.node().is_undefined()
    }

    /// Child of the carried value, resolving handles live.
    pub fn child(&self, key: &str) -> Node {
        self.node().child(key)
    }
}

impl From<Node> for Resolved {
    fn from(node: Node) -> Resolved {
        Resolved::Value(node)
    }
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(node) => write!(f, "Value({node:?})"),
            Resolved::Proxy(handle) => write!(f, "Proxy({:?})", handle.context()),
        }
    }
}

/// The capability an external subscriber must expose: receiving relayed
/// events. `Store` implements this itself, so stores can subscribe to each
/// other under a namespace.
pub trait Subscriber {
    fn trigger(&self, event: &str, args: &[Resolved]);
}

pub(crate) struct EventRegistry {
    listeners: IndexMap<String, Vec<(ListenerId, ListenerFn)>>,
    next_listener_id: ListenerId,
    subscribers: Vec<(Rc<dyn Subscriber>, String)>,
}

impl EventRegistry {
    pub(crate) fn new() -> EventRegistry {
        EventRegistry {
            listeners: IndexMap::new(),
            next_listener_id: 1,
            subscribers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, event: &str, callback: ListenerFn) -> ListenerId {
        let id = self.next_listener_id;
        self.next_listener_id = self.next_listener_id.saturating_add(1);
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    pub(crate) fn remove_all(&mut self, event: &str) {
        self.listeners.shift_remove(event);
    }

    pub(crate) fn remove(&mut self, event: &str, id: ListenerId) -> bool {
        let Some(entries) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            self.listeners.shift_remove(event);
        }
        removed
    }

    /// Snapshot of the callbacks for one event, so dispatch never holds a
    /// registry borrow while a listener runs (listeners may re-enter).
    pub(crate) fn callbacks(&self, event: &str) -> Vec<ListenerFn> {
        self.listeners
            .get(event)
            .map(|entries| entries.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }

    pub(crate) fn subscribe(&mut self, subscriber: Rc<dyn Subscriber>, namespace: &str) {
        self.subscribers.push((subscriber, namespace.to_string()));
    }

    pub(crate) fn unsubscribe(&mut self, subscriber: &Rc<dyn Subscriber>, namespace: &str) {
        self.subscribers
            .retain(|(sub, ns)| !(ns == namespace && Rc::ptr_eq(sub, subscriber)));
    }

    pub(crate) fn subscribers(&self) -> Vec<(Rc<dyn Subscriber>, String)> {
        self.subscribers.clone()
    }
}
