//! Drag-and-drop reordering of recipes and groups
//!
//! A drop names the dragged node (the drag payload carries its iid as plain
//! text) and what it landed on: either the body of a group, or a specific
//! recipe or group row. Landing on a row inserts the dragged node directly
//! before that row, in the row's own group.

use tracing::debug;

use crate::project::{Position, Project};
use crate::registry::Iid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Dropped inside a group's body; the node becomes its last child
    GroupContent(Iid),
    /// Dropped onto a recipe or group row
    Node(Iid),
}

impl DropTarget {
    pub fn iid(self) -> Iid {
        match self {
            DropTarget::GroupContent(iid) | DropTarget::Node(iid) => iid,
        }
    }
}

pub fn parse_drag_payload(text: &str) -> Option<Iid> {
    text.parse().ok()
}

/// Move `dragged` according to `target`. Returns whether the tree changed.
pub fn drag_and_drop(project: &mut Project, dragged: Iid, target: DropTarget) -> bool {
    let target_iid = target.iid();
    if project.resolve(dragged).is_none() || project.resolve(target_iid).is_none() {
        debug!(%dragged, %target_iid, "drop references an unknown node");
        return false;
    }
    if dragged == target_iid {
        return false;
    }

    let (parent, position) = match target {
        DropTarget::GroupContent(group) => (group, Position::End),
        DropTarget::Node(sibling) => match project.parent_of(sibling) {
            Some(parent) if project.group(parent).is_some() => (parent, Position::Before(sibling)),
            // the root group has no row to insert before
            _ => (sibling, Position::End),
        },
    };

    match project.move_node(dragged, parent, position) {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, %dragged, ?target, "drop rejected");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::assert_consistent;

    fn project() -> (Project, Iid, Iid, Iid, Iid) {
        let mut project = Project::new();
        let root = project.root_iid();
        let a = project.add_recipe(root, "a", 0).unwrap();
        let g = project.add_group(root, "g").unwrap();
        let h = project.add_group(g, "h").unwrap();
        let b = project.add_recipe(h, "b", 0).unwrap();
        (project, a, g, h, b)
    }

    #[test]
    fn payload_is_a_plain_iid() {
        let (project, a, ..) = project();
        assert_eq!(parse_drag_payload(&a.to_string()), Some(a));
        assert_eq!(parse_drag_payload(""), None);
        assert!(project.resolve(parse_drag_payload("0").unwrap()).is_none());
    }

    #[test]
    fn dropping_into_group_body_appends() {
        let (mut project, a, g, h, _) = project();
        assert!(drag_and_drop(&mut project, a, DropTarget::GroupContent(g)));
        assert_eq!(project.group(g).unwrap().elements(), &[h, a]);
        assert_consistent(&project);
    }

    #[test]
    fn dropping_onto_a_row_inserts_before_it() {
        let (mut project, a, g, h, b) = project();
        assert!(drag_and_drop(&mut project, a, DropTarget::Node(b)));
        assert_eq!(project.group(h).unwrap().elements(), &[a, b]);
        assert_eq!(project.parent_of(a), Some(h));

        assert!(drag_and_drop(&mut project, b, DropTarget::Node(g)));
        assert_eq!(project.root_group().elements(), &[b, g]);
        assert_consistent(&project);
    }

    #[test]
    fn dropping_onto_root_row_appends_to_root() {
        let (mut project, a, g, _, b) = project();
        let root = project.root_iid();
        assert!(drag_and_drop(&mut project, b, DropTarget::Node(root)));
        assert_eq!(project.root_group().elements(), &[a, g, b]);
    }

    #[test]
    fn invalid_drops_leave_the_tree_alone() {
        let (mut project, a, g, h, b) = project();
        let root = project.root_iid();
        let before: Vec<_> = project.walk().map(|v| (v.depth, v.iid)).collect();

        assert!(!drag_and_drop(&mut project, g, DropTarget::GroupContent(h)));
        assert!(!drag_and_drop(&mut project, g, DropTarget::Node(b)));
        assert!(!drag_and_drop(&mut project, g, DropTarget::Node(g)));
        assert!(!drag_and_drop(&mut project, a, DropTarget::GroupContent(b)));
        assert!(!drag_and_drop(&mut project, root, DropTarget::GroupContent(g)));
        assert!(!drag_and_drop(&mut project, a, DropTarget::Node(parse_drag_payload("9999").unwrap())));

        let product = project.add_product("plate", 1.0);
        assert!(!drag_and_drop(&mut project, product, DropTarget::GroupContent(g)));
        assert!(!drag_and_drop(&mut project, a, DropTarget::Node(product)));

        let after: Vec<_> = project.walk().map(|v| (v.depth, v.iid)).collect();
        assert_eq!(before, after);
        assert_consistent(&project);
    }
}
