//! Recursive change classification.
//!
//! One pass walks the written path from the root, comparing the committed
//! baseline against the live tree level by level and firing events on the
//! way back up (deepest paths first). At the terminal key the walk fans out
//! over the union of both sides' field names, so replacing a composite
//! classifies every appearing/disappearing/changed field individually.

use watchtree_node::Node;

use crate::change::{classify_leaf, wildcard_namespace, Change};
use crate::events::Resolved;
use crate::store::Store;

impl Store {
    /// Classify one level. `original`/`updated` are the parents at this
    /// level; the head of `keys` selects the child pair to classify,
    /// absence reading as `Undefined`. Returns this level's classification
    /// to the caller, which coerces a deeper CREATE/REMOVE to UPDATE: a
    /// child's creation or removal is this node's update.
    pub(crate) fn detect_changes(
        &self,
        keys: &[String],
        original: Node,
        updated: Node,
        namespace: &str,
    ) -> Change {
        let next = &keys[0];
        let namespace = if namespace.is_empty() {
            next.clone()
        } else {
            format!("{namespace}.{next}")
        };
        let original = original.child(next);
        let updated = updated.child(next);

        let mut change = Change::Update;
        if keys.len() > 1 {
            change = self.detect_changes(&keys[1..], original.clone(), updated.clone(), &namespace);
            if matches!(change, Change::Create | Change::Remove) {
                change = Change::Update;
            }
        } else if original.is_composite() || updated.is_composite() {
            // Terminal composite: classify the union of both sides' fields,
            // new side's keys first, then the old side's unseen ones.
            let mut fields = updated.keys();
            for key in original.keys() {
                if !fields.contains(&key) {
                    fields.push(key);
                }
            }
            let results: Vec<Change> = fields
                .iter()
                .map(|field| {
                    self.detect_changes(
                        std::slice::from_ref(field),
                        original.clone(),
                        updated.clone(),
                        &namespace,
                    )
                })
                .collect();
            if updated.is_undefined() && original.is_undefined() {
                change = Change::Remove;
            }
            if original.is_undefined() {
                change = Change::Create;
            }
            if updated.is_undefined() {
                change = Change::Remove;
            }
            if results.is_empty() {
                change = Change::None;
            } else if results.iter().all(|result| *result == Change::None) {
                change = Change::None;
            }
        } else {
            change = classify_leaf(&original, &updated);
        }

        self.announce(&namespace, change, &original, &updated);
        change
    }

    /// Fire the event set for one classified path, in fixed order: the
    /// classification's own event on the exact and wildcard namespaces
    /// (`unchanged` has no wildcard form), then `change:` on both when
    /// something changed, then the global catch-all — the only event that
    /// fires unconditionally at every visited path.
    fn announce(&self, namespace: &str, change: Change, original: &Node, updated: &Node) {
        let wildcard = wildcard_namespace(namespace);
        let payload = if updated.is_composite() {
            Resolved::Proxy(self.handle_for(namespace, updated))
        } else {
            Resolved::Value(updated.clone())
        };
        match change {
            Change::Create => {
                self.trigger(&format!("create:{namespace}"), &[payload.clone()]);
                self.trigger(&format!("create:{wildcard}"), &[payload]);
            }
            Change::Update => {
                let args = [payload, Resolved::Value(original.clone())];
                self.trigger(&format!("update:{namespace}"), &args);
                self.trigger(&format!("update:{wildcard}"), &args);
            }
            Change::Remove => {
                let args = [Resolved::Value(original.clone())];
                self.trigger(&format!("remove:{namespace}"), &args);
                self.trigger(&format!("remove:{wildcard}"), &args);
            }
            Change::None => {
                self.trigger(&format!("unchanged:{namespace}"), &[payload]);
            }
        }
        if change != Change::None {
            let args = [
                Resolved::Value(Node::from(change.as_str())),
                Resolved::Value(updated.clone()),
                Resolved::Value(original.clone()),
            ];
            self.trigger(&format!("change:{namespace}"), &args);
            self.trigger(&format!("change:{wildcard}"), &args);
        }
        self.trigger(
            "change",
            &[
                Resolved::Value(Node::from(change.as_str())),
                Resolved::Value(Node::from(namespace)),
                Resolved::Value(updated.clone()),
                Resolved::Value(original.clone()),
            ],
        );
    }
}
