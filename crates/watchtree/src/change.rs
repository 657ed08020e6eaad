//! Change classification primitives.

use std::fmt;

use watchtree_node::Node;

/// The classification a diff pass assigns to one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Create,
    Update,
    Remove,
    None,
}

impl Change {
    /// The uppercase form delivered in event payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Change::Create => "CREATE",
            Change::Update => "UPDATE",
            Change::Remove => "REMOVE",
            Change::None => "NONE",
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a leaf pair. Absence reads as `Undefined` on the way in, so a
/// both-absent pair means the location was fully detached.
pub fn classify_leaf(original: &Node, updated: &Node) -> Change {
    if updated.is_undefined() && original.is_undefined() {
        return Change::Remove;
    }
    if original.is_undefined() {
        return Change::Create;
    }
    if updated.is_undefined() {
        return Change::Remove;
    }
    if original == updated {
        return Change::None;
    }
    Change::Update
}

/// Namespace with the final segment replaced by `*`, used for
/// any-direct-child subscriptions. A root-level namespace wildcards to `*`.
pub fn wildcard_namespace(namespace: &str) -> String {
    match namespace.rfind('.') {
        Some(dot) => format!("{}*", &namespace[..=dot]),
        None => "*".to_string(),
    }
}
