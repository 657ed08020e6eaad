use std::collections::HashSet;
use std::rc::Rc;

use thiserror::Error;

use crate::{Fields, Items, Node};

/// A composite was reached twice within one copy traversal: the value graph
/// is shared or cyclic and cannot be snapshotted as a tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("circular reference encountered while copying a value tree")]
pub struct CircularReferenceError;

/// Creates a fully independent deep copy of a value tree.
///
/// Composites are copied into fresh allocations; primitives and callables
/// pass through unchanged (callables keep their identity). The identity set
/// spans the whole call, so both true cycles and DAG-style sharing fail.
///
/// ```
/// use watchtree_node::{deep_clone, Node};
/// let original = Node::from(serde_json::json!({"foo": [1, 2, 3]}));
/// let copied = deep_clone(&original).unwrap();
/// assert_eq!(original, copied);
/// assert_ne!(original.composite_id(), copied.composite_id());
/// ```
pub fn deep_clone(node: &Node) -> Result<Node, CircularReferenceError> {
    let mut seen = HashSet::new();
    clone_into(node, &mut seen)
}

fn clone_into(node: &Node, seen: &mut HashSet<usize>) -> Result<Node, CircularReferenceError> {
    match node {
        Node::Array(items) => {
            if !seen.insert(Rc::as_ptr(items) as usize) {
                return Err(CircularReferenceError);
            }
            let copied = items
                .borrow()
                .iter()
                .map(|item| clone_into(item, seen))
                .collect::<Result<Items, _>>()?;
            Ok(Node::array(copied))
        }
        Node::Object(fields) => {
            if !seen.insert(Rc::as_ptr(fields) as usize) {
                return Err(CircularReferenceError);
            }
            let mut copied = Fields::new();
            for (key, value) in fields.borrow().iter() {
                copied.insert(key.clone(), clone_into(value, seen)?);
            }
            Ok(Node::object(copied))
        }
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn copies_primitives_through() {
        assert_eq!(deep_clone(&Node::Null).unwrap(), Node::Null);
        assert_eq!(deep_clone(&Node::from(42)).unwrap(), Node::from(42));
        assert_eq!(deep_clone(&Node::Undefined).unwrap(), Node::Undefined);
    }

    #[test]
    fn copies_are_independent() {
        let original = Node::from(json!({"stuff": {"info": [1, 2, 3]}}));
        let copied = deep_clone(&original).unwrap();
        copied.child("stuff").child("info").set_child("0", Node::from(9));
        assert_eq!(original.child("stuff").child("info").child("0"), Node::from(1));
    }

    #[test]
    fn callables_keep_identity() {
        let f = Node::callable(|_| Node::Null);
        let holder = Node::from(json!({}));
        holder.set_child("f", f.clone());
        let copied = deep_clone(&holder).unwrap();
        assert_eq!(copied.child("f"), f);
    }

    #[test]
    fn rejects_self_reference() {
        let node = Node::from(json!({"name": "dave"}));
        node.set_child("me", node.clone());
        assert_eq!(deep_clone(&node), Err(CircularReferenceError));
    }

    #[test]
    fn rejects_deep_cycle() {
        let a = Node::from(json!({}));
        let b = Node::from(json!({}));
        a.set_child("b", b.clone());
        b.set_child("a", a.clone());
        assert_eq!(deep_clone(&a), Err(CircularReferenceError));
    }

    #[test]
    fn rejects_shared_composite() {
        let shared = Node::from(json!([1]));
        let node = Node::from(json!({}));
        node.set_child("x", shared.clone());
        node.set_child("y", shared);
        assert_eq!(deep_clone(&node), Err(CircularReferenceError));
    }
}
