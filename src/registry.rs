//! Instance identifier registry
//!
//! A flat table of node records keyed by iid. Every record carries the iid of
//! its current parent, so resolving a node and its parent is a single lookup
//! no matter how deeply the node is nested.

use std::collections::HashMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Instance identifier of a project node.
///
/// Issued once from a monotonically increasing counter and never reused,
/// even after the node is removed. Zero is never issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iid(u32);

impl Iid {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Iid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Iid {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Iid)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    parent: Option<Iid>,
    node: T,
}

#[derive(Debug, Clone)]
pub struct Registry<T> {
    next: u32,
    slots: HashMap<Iid, Slot<T>>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            next: 1,
            slots: HashMap::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `node` under a fresh iid.
    pub fn register(&mut self, node: T, parent: Option<Iid>) -> Iid {
        let iid = Iid(self.next);
        self.next += 1;
        self.slots.insert(iid, Slot { parent, node });
        iid
    }

    /// Returns the node and the iid of its parent, if it has one.
    pub fn resolve(&self, iid: Iid) -> Option<(&T, Option<Iid>)> {
        self.slots.get(&iid).map(|slot| (&slot.node, slot.parent))
    }

    pub fn get(&self, iid: Iid) -> Option<&T> {
        self.slots.get(&iid).map(|slot| &slot.node)
    }

    pub fn get_mut(&mut self, iid: Iid) -> Option<&mut T> {
        self.slots.get_mut(&iid).map(|slot| &mut slot.node)
    }

    pub fn parent_of(&self, iid: Iid) -> Option<Iid> {
        self.slots.get(&iid).and_then(|slot| slot.parent)
    }

    pub fn set_parent(&mut self, iid: Iid, parent: Option<Iid>) -> bool {
        match self.slots.get_mut(&iid) {
            Some(slot) => {
                slot.parent = parent;
                true
            }
            None => false,
        }
    }

    /// Forget a node. Its iid stays retired.
    pub fn unregister(&mut self, iid: Iid) -> Option<T> {
        self.slots.remove(&iid).map(|slot| slot.node)
    }

    pub fn contains(&self, iid: Iid) -> bool {
        self.slots.contains_key(&iid)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iids(&self) -> impl Iterator<Item = Iid> + '_ {
        self.slots.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iids_are_never_reused() {
        let mut registry = Registry::new();
        let a = registry.register("a", None);
        let b = registry.register("b", Some(a));
        assert_eq!(registry.unregister(b), Some("b"));
        let c = registry.register("c", Some(a));
        assert_ne!(b, c);
        assert!(registry.resolve(b).is_none());
        assert_eq!(registry.resolve(c), Some((&"c", Some(a))));
    }

    #[test]
    fn parent_can_be_repointed() {
        let mut registry = Registry::new();
        let a = registry.register(1, None);
        let b = registry.register(2, None);
        let c = registry.register(3, Some(a));
        assert!(registry.set_parent(c, Some(b)));
        assert_eq!(registry.parent_of(c), Some(b));
        assert!(!registry.set_parent(Iid(999), None));
    }

    #[test]
    fn iid_parses_plain_text() {
        assert_eq!(" 42 ".parse::<Iid>(), Ok(Iid(42)));
        assert!("abc".parse::<Iid>().is_err());
    }
}
