//! The store facade: path-addressed reads and writes over a live tree,
//! a committed baseline for diffing, and event dispatch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use watchtree_node::{deep_clone, CircularReferenceError, CompositeWeak, Node};

use crate::change::Change;
use crate::events::{EventRegistry, ListenerId, Resolved, Subscriber};
use crate::handle::{HandleInner, NodeHandle};
use crate::path::{split_segments, Path};

/// A reactive tree store.
///
/// The caller and the store jointly hold the live tree (a `Store` clone is
/// a second handle onto the same store). Every `set`/`remove` applies the
/// write, classifies the change against the committed baseline, fires the
/// resulting events synchronously, and commits the baseline when anything
/// actually changed. All of that completes before the call returns;
/// listeners may re-enter `set`, and nested cascades resolve LIFO.
#[derive(Clone)]
pub struct Store {
    pub(crate) inner: Rc<StoreInner>,
}

pub(crate) struct StoreInner {
    live: RefCell<Node>,
    baseline: RefCell<Node>,
    registry: RefCell<EventRegistry>,
    handles: RefCell<HashMap<usize, (CompositeWeak, Weak<HandleInner>)>>,
}

impl Store {
    /// Create a store over a caller-supplied tree. The baseline is a deep
    /// copy taken up front, so shared or cyclic input fails here before the
    /// store exists.
    pub fn new(data: Node) -> Result<Store, CircularReferenceError> {
        let baseline = deep_clone(&data)?;
        Ok(Store {
            inner: Rc::new(StoreInner {
                live: RefCell::new(data),
                baseline: RefCell::new(baseline),
                registry: RefCell::new(EventRegistry::new()),
                handles: RefCell::new(HashMap::new()),
            }),
        })
    }

    /// Create a store from JSON. JSON values are always trees, so this
    /// cannot fail.
    pub fn from_value(value: serde_json::Value) -> Store {
        Store {
            inner: Rc::new(StoreInner {
                live: RefCell::new(Node::from(value.clone())),
                baseline: RefCell::new(Node::from(value)),
                registry: RefCell::new(EventRegistry::new()),
                handles: RefCell::new(HashMap::new()),
            }),
        }
    }

    pub fn empty() -> Store {
        Store::from_value(serde_json::Value::Object(serde_json::Map::new()))
    }

    fn live_root(&self) -> Node {
        self.inner.live.borrow().clone()
    }

    /// Handle for the root of the live tree.
    pub fn root(&self) -> NodeHandle {
        let root = self.live_root();
        self.handle_for("", &root)
    }

    /// Read a path. Composites resolve to a live handle, leaves to their
    /// value, anything unresolvable to `Undefined`. Each composite descent
    /// step emits a `read` event for the path walked so far.
    pub fn get<P: Into<Path>>(&self, path: P) -> Resolved {
        self.get_or(path, Node::Undefined)
    }

    /// Read a path with a fallback for unresolvable locations.
    pub fn get_or<P: Into<Path>>(&self, path: P, fallback: Node) -> Resolved {
        let path = path.into();
        let keys = path.segments();
        let root = self.live_root();
        if keys.is_empty() {
            return Resolved::Proxy(self.handle_for("", &root));
        }
        let mut cursor = root;
        let mut context = String::new();
        for key in keys {
            if !cursor.is_composite() {
                cursor = Node::Undefined;
                break;
            }
            if !context.is_empty() {
                context.push('.');
            }
            context.push_str(key);
            let child = cursor.child(key);
            self.trigger("read", &[Resolved::Value(Node::from(context.as_str()))]);
            cursor = child;
        }
        if cursor.is_undefined() {
            return Resolved::Value(fallback);
        }
        if cursor.is_composite() {
            return Resolved::Proxy(self.handle_for(&context, &cursor));
        }
        Resolved::Value(cursor)
    }

    /// Write a value at a path. The value is deep-copied first (so the
    /// store never aliases caller-owned composites, and cyclic input fails
    /// before any mutation), missing intermediate levels are created as
    /// maps, and the classify/commit/notify pipeline runs from the
    /// shallowest newly-grafted segment — freshly created ancestors
    /// classify CREATE rather than UPDATE.
    pub fn set<P: Into<Path>, V: Into<Node>>(
        &self,
        path: P,
        value: V,
    ) -> Result<(), CircularReferenceError> {
        let path = path.into();
        let keys = path.segments();
        if keys.is_empty() {
            return Ok(());
        }
        let incoming = deep_clone(&value.into())?;
        let mut cursor = self.live_root();
        if !cursor.is_composite() {
            return Ok(());
        }
        let last = keys.len() - 1;
        let mut graft: Option<usize> = None;
        for (index, key) in keys[..last].iter().enumerate() {
            let child = cursor.child(key);
            if child.is_composite() {
                cursor = child;
                continue;
            }
            let fresh = Node::empty_object();
            cursor.set_child(key, fresh.clone());
            cursor = fresh;
            if graft.is_none() {
                graft = Some(index);
            }
        }
        cursor.set_child(&keys[last], incoming);
        let end = graft.unwrap_or(last);
        self.apply_changes(&keys[..=end])
    }

    /// Delete a path. The deleted location classifies REMOVE (its old value
    /// is the event payload) and its parent coerces to UPDATE.
    pub fn remove<P: Into<Path>>(&self, path: P) -> Result<(), CircularReferenceError> {
        let path = path.into();
        let keys = path.segments();
        if keys.is_empty() {
            return Ok(());
        }
        let parent = self.resolve_segments(&keys[..keys.len() - 1]);
        if !parent.is_composite() {
            return Ok(());
        }
        parent.remove_child(&keys[keys.len() - 1]);
        self.apply_changes(keys)
    }

    /// Register a listener under an exact event key. Returns the id to
    /// remove just this registration via [`Store::off_listener`].
    pub fn on(&self, event: &str, callback: impl Fn(&[Resolved]) + 'static) -> ListenerId {
        self.inner
            .registry
            .borrow_mut()
            .add(event, Rc::new(callback))
    }

    /// Remove every listener registered under an event key.
    pub fn off(&self, event: &str) -> &Store {
        self.inner.registry.borrow_mut().remove_all(event);
        self
    }

    /// Remove one listener registration.
    pub fn off_listener(&self, event: &str, id: ListenerId) -> bool {
        self.inner.registry.borrow_mut().remove(event, id)
    }

    /// Fire an event: exact-key listeners in registration order, then every
    /// subscriber in subscription order (namespaced subscribers receive
    /// `namespace:event`). Internal and caller-emitted events share this
    /// path. Dispatch iterates over snapshots, so listeners may re-enter
    /// the store freely.
    pub fn trigger(&self, event: &str, args: &[Resolved]) {
        let callbacks = self.inner.registry.borrow().callbacks(event);
        for callback in callbacks {
            callback(args);
        }
        let subscribers = self.inner.registry.borrow().subscribers();
        for (subscriber, namespace) in subscribers {
            if namespace.is_empty() {
                subscriber.trigger(event, args);
            } else {
                subscriber.trigger(&format!("{namespace}:{event}"), args);
            }
        }
    }

    /// Relay every event this store fires to an external subscriber,
    /// optionally prefixed with `namespace:`. The same subscriber may be
    /// registered under several namespaces; each registration is
    /// independent.
    pub fn subscribe(&self, subscriber: Rc<dyn Subscriber>, namespace: &str) -> &Store {
        self.inner
            .registry
            .borrow_mut()
            .subscribe(subscriber, namespace);
        self
    }

    /// Remove exactly the (subscriber, namespace) pair.
    pub fn unsubscribe(&self, subscriber: &Rc<dyn Subscriber>, namespace: &str) -> &Store {
        self.inner
            .registry
            .borrow_mut()
            .unsubscribe(subscriber, namespace);
        self
    }

    /// The committed baseline, as JSON.
    pub fn committed_value(&self) -> serde_json::Value {
        self.inner.baseline.borrow().to_value()
    }

    /// The live tree, as JSON.
    pub fn live_value(&self) -> serde_json::Value {
        self.inner.live.borrow().to_value()
    }

    pub(crate) fn resolve_segments(&self, keys: &[String]) -> Node {
        let mut cursor = self.live_root();
        for key in keys {
            cursor = cursor.child(key);
        }
        cursor
    }

    pub(crate) fn resolve_context(&self, context: &str) -> Node {
        self.resolve_segments(&split_segments(context))
    }

    /// Single-field raw read used by handles: resolve, emit one `read`
    /// event for the full path, wrap composites in their live handle.
    pub(crate) fn field_read(&self, context: &str) -> Resolved {
        let node = self.resolve_context(context);
        self.trigger("read", &[Resolved::Value(Node::from(context))]);
        if node.is_composite() {
            return Resolved::Proxy(self.handle_for(context, &node));
        }
        Resolved::Value(node)
    }

    /// Issue the handle for a composite node, deduplicated by node
    /// identity: re-reading the same node yields the previously issued
    /// handle for as long as both the node and some holder of the handle
    /// are alive. Dead entries are pruned on the way through.
    pub(crate) fn handle_for(&self, context: &str, node: &Node) -> NodeHandle {
        let Some(guard) = node.composite_weak() else {
            return NodeHandle::new(Rc::downgrade(&self.inner), context.to_string());
        };
        let key = guard.id();
        let mut handles = self.inner.handles.borrow_mut();
        if let Some((node_guard, weak_handle)) = handles.get(&key) {
            if node_guard.is_alive() {
                if let Some(inner) = weak_handle.upgrade() {
                    return NodeHandle { inner };
                }
            }
        }
        handles.retain(|_, entry| entry.0.is_alive() && entry.1.strong_count() > 0);
        let handle = NodeHandle::new(Rc::downgrade(&self.inner), context.to_string());
        handles.insert(key, (guard, Rc::downgrade(&handle.inner)));
        handle
    }

    /// Run the diff pipeline for a written path: classify (firing events
    /// at every visited level), and when the root classification is not
    /// NONE, commit the baseline and fire `updated`.
    pub(crate) fn apply_changes(&self, keys: &[String]) -> Result<(), CircularReferenceError> {
        if keys.is_empty() {
            return Ok(());
        }
        let original = self.inner.baseline.borrow().clone();
        let updated = self.live_root();
        let change = self.detect_changes(keys, original.clone(), updated.clone(), "");
        if change != Change::None {
            commit(&original, &updated, keys)?;
            self.trigger("updated", &[]);
        }
        Ok(())
    }
}

/// Sync the baseline to the live tree along a classified path. Descends
/// while the baseline still has a composite to descend into; at the final
/// segment, or at the first gap, the live subtree is deep-copied across in
/// one piece (no redundant copies of unchanged ancestors). Copying an
/// absent live value deletes the baseline key.
fn commit(original: &Node, updated: &Node, keys: &[String]) -> Result<(), CircularReferenceError> {
    let next = &keys[0];
    let original_child = original.child(next);
    if keys.len() == 1 || !original_child.is_composite() {
        original.set_child(next, deep_clone(&updated.child(next))?);
        return Ok(());
    }
    commit(&original_child, &updated.child(next), &keys[1..])
}

impl Subscriber for Store {
    fn trigger(&self, event: &str, args: &[Resolved]) {
        Store::trigger(self, event, args);
    }
}
