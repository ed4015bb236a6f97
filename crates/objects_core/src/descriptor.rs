//! Per-object metadata and name disambiguation.

use objects_store::TypeHash;

use crate::handle::Handle;

/// The metadata record attached to every object.
///
/// Link fields are only mutated through the hierarchy operations on
/// [`World`](crate::World), which keep parent and children symmetric.
#[derive(Debug, Clone)]
pub struct ObjectDescriptor {
    name: String,
    object_type: TypeHash,
    parent: Handle,
    children: Vec<Handle>,
    component_names: Vec<String>,
}

impl ObjectDescriptor {
    pub(crate) fn new(name: String, object_type: TypeHash) -> Self {
        Self {
            name,
            object_type,
            parent: Handle::null(),
            children: Vec::new(),
            component_names: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    #[must_use]
    pub fn object_type(&self) -> TypeHash {
        self.object_type
    }

    /// The stored parent link; null when the object is a root.
    #[must_use]
    pub fn parent(&self) -> Handle {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Handle) {
        self.parent = parent;
    }

    #[must_use]
    pub fn children(&self) -> &[Handle] {
        &self.children
    }

    #[must_use]
    pub fn has_child(&self, child: Handle) -> bool {
        self.children.contains(&child)
    }

    /// Appends `child` unless already present.
    pub(crate) fn push_child(&mut self, child: Handle) {
        if !self.has_child(child) {
            self.children.push(child);
        }
    }

    pub(crate) fn remove_child(&mut self, child: Handle) -> bool {
        match self.children.iter().position(|&c| c == child) {
            Some(pos) => {
                self.children.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Names of the registered components currently attached.
    #[must_use]
    pub fn component_names(&self) -> &[String] {
        &self.component_names
    }

    pub(crate) fn set_component_names(&mut self, names: Vec<String>) {
        self.component_names = names;
    }
}

/// Splits a trailing `(N)` suffix off a name.
fn split_suffix(name: &str) -> (&str, Option<u64>) {
    let Some(body) = name.strip_suffix(')') else {
        return (name, None);
    };
    let Some(open) = body.rfind('(') else {
        return (name, None);
    };
    let digits = &body[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return (name, None);
    }
    match digits.parse() {
        Ok(n) => (&name[..open], Some(n)),
        Err(_) => (name, None),
    }
}

/// Returns `requested` if it is free, otherwise the first free
/// `base(N)` with `N` counting up from the requested suffix (or 1).
///
/// A suffix that cannot be incremented becomes part of the base.
pub(crate) fn disambiguate(requested: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(requested) {
        return requested.to_string();
    }
    let (mut base, suffix) = split_suffix(requested);
    let mut next = suffix.map_or(Some(1), |n| n.checked_add(1));
    loop {
        let Some(index) = next else {
            base = requested;
            next = Some(1);
            continue;
        };
        let candidate = format!("{base}({index})");
        if !taken(&candidate) {
            return candidate;
        }
        next = index.checked_add(1);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn taken(names: &[&str]) -> impl Fn(&str) -> bool {
        let set: HashSet<String> = names.iter().map(|s| s.to_string()).collect();
        move |name: &str| set.contains(name)
    }

    #[test]
    fn test_free_name_is_kept() {
        assert_eq!(disambiguate("Root", taken(&[])), "Root");
    }

    #[test]
    fn test_collision_appends_suffix() {
        assert_eq!(disambiguate("Root", taken(&["Root"])), "Root(1)");
        assert_eq!(disambiguate("Root", taken(&["Root", "Root(1)"])), "Root(2)");
    }

    #[test]
    fn test_existing_suffix_is_incremented() {
        assert_eq!(disambiguate("Root(1)", taken(&["Root(1)"])), "Root(2)");
        assert_eq!(
            disambiguate("Root(4)", taken(&["Root(4)", "Root(5)"])),
            "Root(6)"
        );
    }

    #[test]
    fn test_overflowing_suffix_starts_over() {
        let max = format!("A({})", u64::MAX);
        assert_eq!(disambiguate(&max, taken(&[&max])), format!("{max}(1)"));

        let near = format!("A({})", u64::MAX - 1);
        let last = format!("A({})", u64::MAX);
        assert_eq!(
            disambiguate(&near, taken(&[&near, &last])),
            format!("{near}(1)")
        );
    }

    #[test]
    fn test_non_numeric_parentheses_are_part_of_the_base() {
        assert_eq!(disambiguate("Lamp (red)", taken(&["Lamp (red)"])), "Lamp (red)(1)");
        assert_eq!(disambiguate("odd)", taken(&["odd)"])), "odd)(1)");
        assert_eq!(disambiguate("()", taken(&["()"])), "()(1)");
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("A(12)"), ("A", Some(12)));
        assert_eq!(split_suffix("A"), ("A", None));
        assert_eq!(split_suffix("A(x)"), ("A(x)", None));
    }

    #[test]
    fn test_children_are_unique() {
        let mut descriptor = ObjectDescriptor::new("A".into(), TypeHash::from_name("T"));
        let child = Handle::new(objects_store::Entity::from_parts(1, 0));
        descriptor.push_child(child);
        descriptor.push_child(child);
        assert_eq!(descriptor.children(), &[child]);
        assert!(descriptor.remove_child(child));
        assert!(!descriptor.remove_child(child));
    }
}
