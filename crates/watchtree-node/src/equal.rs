use std::rc::Rc;

use crate::Node;

/// Structural equality over value trees.
///
/// Objects compare by key set and per-key value regardless of insertion
/// order, arrays element-wise, callables by identity. `Undefined` equals
/// only itself; mixed kinds are never equal.
///
/// ```
/// use watchtree_node::{deep_equal, Node};
/// let a = Node::from(serde_json::json!({"a": 1, "b": [2]}));
/// let b = Node::from(serde_json::json!({"b": [2], "a": 1}));
/// assert!(deep_equal(&a, &b));
/// ```
pub fn deep_equal(a: &Node, b: &Node) -> bool {
    match (a, b) {
        (Node::Undefined, Node::Undefined) => true,
        (Node::Null, Node::Null) => true,
        (Node::Bool(a), Node::Bool(b)) => a == b,
        (Node::Number(a), Node::Number(b)) => a == b,
        (Node::String(a), Node::String(b)) => a == b,
        (Node::Callable(a), Node::Callable(b)) => Rc::ptr_eq(a, b),
        (Node::Array(a), Node::Array(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let a = a.borrow();
            let b = b.borrow();
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| deep_equal(x, y))
        }
        (Node::Object(a), Node::Object(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let a = a.borrow();
            let b = b.borrow();
            if a.len() != b.len() {
                return false;
            }
            a.iter().all(|(key, value)| match b.get(key) {
                Some(other) => deep_equal(value, other),
                None => false,
            })
        }
        _ => false,
    }
}
