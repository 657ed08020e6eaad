//! Shared mutable value tree for the watchtree store.
//!
//! [`Node`] is the dynamic value universe the store works over: JSON-like
//! primitives plus `Undefined`, composites with reference semantics, and
//! opaque callables. Composites are `Rc<RefCell<..>>` cells, so cloning a
//! `Node` is shallow — two clones of an object alias the same underlying
//! fields, and composite identity (pointer identity) is meaningful. Deep
//! copying is the job of [`deep_clone`], which is also where cyclic or
//! shared structure is rejected.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::{Number, Value};

mod clone;
mod equal;

pub use clone::{deep_clone, CircularReferenceError};
pub use equal::deep_equal;

/// Ordered string-keyed fields of an object node.
pub type Fields = IndexMap<String, Node>;

/// Items of an array node.
pub type Items = Vec<Node>;

/// An opaque stored function. Compared by identity, never traversed.
pub type Callable = Rc<dyn Fn(&[Node]) -> Node>;

/// A value in the tree.
///
/// `Undefined` is distinct from `Null`: absent keys read as `Undefined`,
/// and writing `Undefined` into a parent deletes the key.
#[derive(Clone)]
pub enum Node {
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Rc<RefCell<Items>>),
    Object(Rc<RefCell<Fields>>),
    Callable(Callable),
}

/// Weak reference to a composite node, used to key caches by node identity
/// without keeping the node alive.
#[derive(Clone)]
pub enum CompositeWeak {
    Array(Weak<RefCell<Items>>),
    Object(Weak<RefCell<Fields>>),
}

impl CompositeWeak {
    /// Stable identity of the referenced allocation.
    pub fn id(&self) -> usize {
        match self {
            CompositeWeak::Array(w) => w.as_ptr() as usize,
            CompositeWeak::Object(w) => w.as_ptr() as usize,
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            CompositeWeak::Array(w) => w.strong_count() > 0,
            CompositeWeak::Object(w) => w.strong_count() > 0,
        }
    }
}

impl Node {
    pub fn object(fields: Fields) -> Node {
        Node::Object(Rc::new(RefCell::new(fields)))
    }

    pub fn empty_object() -> Node {
        Node::object(Fields::new())
    }

    pub fn array(items: Items) -> Node {
        Node::Array(Rc::new(RefCell::new(items)))
    }

    pub fn callable(f: impl Fn(&[Node]) -> Node + 'static) -> Node {
        Node::Callable(Rc::new(f))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Node::Undefined)
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, Node::Array(_) | Node::Object(_))
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Node::Callable(_))
    }

    /// Pointer identity of a composite node, `None` for leaves.
    pub fn composite_id(&self) -> Option<usize> {
        match self {
            Node::Array(items) => Some(Rc::as_ptr(items) as usize),
            Node::Object(fields) => Some(Rc::as_ptr(fields) as usize),
            _ => None,
        }
    }

    pub fn composite_weak(&self) -> Option<CompositeWeak> {
        match self {
            Node::Array(items) => Some(CompositeWeak::Array(Rc::downgrade(items))),
            Node::Object(fields) => Some(CompositeWeak::Object(Rc::downgrade(fields))),
            _ => None,
        }
    }

    /// Child lookup by string key. Arrays are addressed by decimal index
    /// strings; anything unresolvable reads as `Undefined`.
    ///
    /// ```
    /// use watchtree_node::Node;
    /// let node = Node::from(serde_json::json!({"info": [1, 2, 3]}));
    /// assert_eq!(node.child("info").child("1"), Node::from(2));
    /// assert!(node.child("missing").is_undefined());
    /// ```
    pub fn child(&self, key: &str) -> Node {
        match self {
            Node::Object(fields) => fields
                .borrow()
                .get(key)
                .cloned()
                .unwrap_or(Node::Undefined),
            Node::Array(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.borrow().get(i).cloned())
                .unwrap_or(Node::Undefined),
            _ => Node::Undefined,
        }
    }

    /// Keys of a composite: object field names in insertion order, or array
    /// index strings. Leaves have no keys.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Node::Object(fields) => fields.borrow().keys().cloned().collect(),
            Node::Array(items) => (0..items.borrow().len()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Object(fields) => fields.borrow().len(),
            Node::Array(items) => items.borrow().len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write a child in place. Writing `Undefined` into an object removes
    /// the key; array writes pad intermediate slots with `Undefined`. Writes
    /// to leaves, or with non-numeric keys on arrays, are dropped.
    pub fn set_child(&self, key: &str, value: Node) {
        match self {
            Node::Object(fields) => {
                if value.is_undefined() {
                    fields.borrow_mut().shift_remove(key);
                } else {
                    fields.borrow_mut().insert(key.to_string(), value);
                }
            }
            Node::Array(items) => {
                if let Ok(index) = key.parse::<usize>() {
                    let mut items = items.borrow_mut();
                    if index >= items.len() {
                        items.resize(index + 1, Node::Undefined);
                    }
                    items[index] = value;
                }
            }
            _ => {}
        }
    }

    /// Remove a child. Object keys are deleted; array slots become
    /// `Undefined` holes so sibling indices keep their meaning.
    pub fn remove_child(&self, key: &str) -> bool {
        match self {
            Node::Object(fields) => fields.borrow_mut().shift_remove(key).is_some(),
            Node::Array(items) => match key.parse::<usize>() {
                Ok(index) => {
                    let mut items = items.borrow_mut();
                    if index < items.len() {
                        items[index] = Node::Undefined;
                        true
                    } else {
                        false
                    }
                }
                Err(_) => false,
            },
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Node::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Node::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Serialize to JSON. Undefined object fields and stored callables are
    /// dropped from objects; in arrays they become `null`, mirroring JSON
    /// semantics for non-data slots.
    pub fn to_value(&self) -> Value {
        match self {
            Node::Undefined | Node::Null | Node::Callable(_) => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Number(n) => Value::Number(n.clone()),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(items) => {
                Value::Array(items.borrow().iter().map(Node::to_value).collect())
            }
            Node::Object(fields) => {
                let mut map = serde_json::Map::new();
                for (key, value) in fields.borrow().iter() {
                    if value.is_undefined() || value.is_callable() {
                        continue;
                    }
                    map.insert(key.clone(), value.to_value());
                }
                Value::Object(map)
            }
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Node {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => Node::Number(n),
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::array(items.into_iter().map(Node::from).collect()),
            Value::Object(map) => {
                let mut fields = Fields::new();
                for (key, value) in map {
                    fields.insert(key, Node::from(value));
                }
                Node::object(fields)
            }
        }
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Node {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Node {
        Node::String(s)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Node {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Node {
        Node::Number(Number::from(n))
    }
}

impl From<i32> for Node {
    fn from(n: i32) -> Node {
        Node::Number(Number::from(n))
    }
}

impl From<u64> for Node {
    fn from(n: u64) -> Node {
        Node::Number(Number::from(n))
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Node {
        Number::from_f64(n).map(Node::Number).unwrap_or(Node::Null)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        deep_equal(self, other)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Undefined => write!(f, "Undefined"),
            Node::Null => write!(f, "Null"),
            Node::Bool(b) => write!(f, "Bool({b})"),
            Node::Number(n) => write!(f, "Number({n})"),
            Node::String(s) => write!(f, "String({s:?})"),
            Node::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            Node::Object(fields) => f
                .debug_map()
                .entries(fields.borrow().iter().map(|(k, v)| (k.clone(), v)))
                .finish(),
            Node::Callable(c) => write!(f, "Callable({:p})", Rc::as_ptr(c)),
        }
    }
}
