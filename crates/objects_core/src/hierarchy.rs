//! Parent/child links between objects of the same type.
//!
//! Links live in the [`ObjectDescriptor`](crate::ObjectDescriptor) of both
//! sides. Only [`World::set_parent`] and [`World::clear_parent`] write them,
//! which keeps them symmetric.

use std::collections::HashSet;

use tracing::warn;

use crate::handle::Handle;
use crate::world::World;

impl World {
    /// The live parent of `object`.
    #[must_use]
    pub fn parent(&self, object: Handle) -> Option<Handle> {
        let parent = self.descriptor(object)?.parent();
        parent.is_valid(self).then_some(parent)
    }

    #[must_use]
    pub fn children(&self, object: Handle) -> &[Handle] {
        self.descriptor(object)
            .map(|d| d.children())
            .unwrap_or_default()
    }

    /// Make `parent` the parent of `child`.
    ///
    /// Refused without any change if either handle is dead, the types differ,
    /// or the link would create a cycle. Any previous parent is unlinked.
    pub fn set_parent(&mut self, child: Handle, parent: Handle) -> bool {
        let (Some(child_type), Some(parent_type)) = (self.object_type(child), self.object_type(parent))
        else {
            return false;
        };
        if child_type != parent_type {
            warn!(%child, %parent, "refused to parent objects of different types");
            return false;
        }
        if child == parent || self.is_descendant(child, parent) {
            warn!(%child, %parent, "refused to create a hierarchy cycle");
            return false;
        }

        let previous = self.parent(child);
        if previous == Some(parent) {
            return true;
        }
        if let Some(previous) = previous {
            if let Some(descriptor) = self.descriptor_mut(previous) {
                descriptor.remove_child(child);
            }
        }
        if let Some(descriptor) = self.descriptor_mut(child) {
            descriptor.set_parent(parent);
        }
        if let Some(descriptor) = self.descriptor_mut(parent) {
            descriptor.push_child(child);
        }
        true
    }

    /// Detach `child` from its parent. `false` if it had none.
    pub fn clear_parent(&mut self, child: Handle) -> bool {
        let Some(descriptor) = self.descriptor_mut(child) else {
            return false;
        };
        let previous = descriptor.parent();
        descriptor.set_parent(Handle::null());
        if !previous.is_valid(self) {
            return false;
        }
        if let Some(parent) = self.descriptor_mut(previous) {
            parent.remove_child(child);
        }
        true
    }

    /// Same as `set_parent(child, parent)`.
    pub fn add_child(&mut self, parent: Handle, child: Handle) -> bool {
        self.set_parent(child, parent)
    }

    /// Detach `child` if `parent` is its parent.
    pub fn remove_child(&mut self, parent: Handle, child: Handle) -> bool {
        self.parent(child) == Some(parent) && self.clear_parent(child)
    }

    /// Returns `true` if `candidate` is somewhere below `object`.
    #[must_use]
    pub fn is_descendant(&self, object: Handle, candidate: Handle) -> bool {
        let mut current = self.parent(candidate);
        // A corrupted chain cannot be longer than the number of objects.
        let mut budget = self.total_objects();
        while let Some(ancestor) = current {
            if ancestor == object {
                return true;
            }
            if budget == 0 {
                break;
            }
            budget -= 1;
            current = self.parent(ancestor);
        }
        false
    }

    /// `root` followed by every live descendant, pre-order.
    #[must_use]
    pub fn subtree(&self, root: Handle) -> Vec<Handle> {
        let mut out = Vec::new();
        if !root.is_valid(self) {
            return out;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(object) = stack.pop() {
            if !visited.insert(object) {
                continue;
            }
            out.push(object);
            stack.extend(
                self.children(object)
                    .iter()
                    .rev()
                    .copied()
                    .filter(|child| child.is_valid(self)),
            );
        }
        out
    }

    /// Visit `root` and every descendant, pre-order. The walk is collected
    /// first, so the visitor may restructure the hierarchy.
    pub fn for_self_and_each_child(&mut self, root: Handle, mut visitor: impl FnMut(&mut World, Handle)) {
        for object in self.subtree(root) {
            if object.is_valid(self) {
                visitor(self, object);
            }
        }
    }
}
