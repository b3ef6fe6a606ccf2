//! Topic trie holding one optional value per topic.
//!
//! ```text
//!   Root
//!   ├── a
//!   │   ├── b (value=1)
//!   │   │   └── c (value=2)
//!   │   └── x
//!   │       └── z (value=3)
//!   └── y (value=4)
//! ```
//!
//! Children are kept in a `BTreeMap`, so iteration is always in ascending
//! level order. A node with neither a value nor children only exists while
//! `remove` is unwinding; it is detached from its parent before `remove`
//! returns.
//!
//! | Method     | Complexity | Description                  |
//! |------------|------------|------------------------------|
//! | `insert()` | O(k)       | k = topic depth levels       |
//! | `remove()` | O(k)       | prunes emptied ancestors     |
//! | `get()`    | O(k)       | exact lookup                 |

use std::collections::BTreeMap;

pub type RetainTree<V> = Node<V>;

pub struct Node<V> {
    value: Option<V>,
    branches: BTreeMap<String, Node<V>>,
}

impl<V> Default for Node<V> {
    #[inline]
    fn default() -> Node<V> {
        Self { value: None, branches: BTreeMap::default() }
    }
}

impl<V> Node<V> {
    /// Sets the value at `path`, creating the missing levels. Returns the replaced value.
    #[inline]
    pub fn insert<'a, P>(&mut self, path: P, value: V) -> Option<V>
    where
        P: IntoIterator<Item = &'a str>,
    {
        let mut node = self;
        for level in path {
            node = node.branches.entry(String::from(level)).or_default();
        }
        node.value.replace(value)
    }

    /// Clears the value at `path` and detaches every ancestor left empty.
    #[inline]
    pub fn remove<'a, P>(&mut self, path: P) -> Option<V>
    where
        P: IntoIterator<Item = &'a str>,
    {
        let path = path.into_iter().collect::<Vec<_>>();
        self._remove(&path)
    }

    #[inline]
    fn _remove(&mut self, path: &[&str]) -> Option<V> {
        if path.is_empty() {
            self.value.take()
        } else {
            let level = path[0];
            if let Some(x) = self.branches.get_mut(level) {
                let res = x._remove(&path[1..]);
                if x.is_empty() {
                    self.branches.remove(level);
                }
                res
            } else {
                None
            }
        }
    }

    #[inline]
    pub fn get<'a, P>(&self, path: P) -> Option<&Node<V>>
    where
        P: IntoIterator<Item = &'a str>,
    {
        let mut node = self;
        for level in path {
            node = node.branches.get(level)?;
        }
        Some(node)
    }

    #[inline]
    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    /// Children in ascending level order.
    #[inline]
    pub fn children(&self) -> impl Iterator<Item = (&str, &Node<V>)> {
        self.branches.iter().map(|(l, n)| (l.as_str(), n))
    }

    #[inline]
    pub fn has_children(&self) -> bool {
        !self.branches.is_empty()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.value.is_none() && self.branches.is_empty()
    }

    #[inline]
    pub fn nodes_size(&self) -> usize {
        let len: usize = self.branches.values().map(|n| n.nodes_size()).sum();
        self.branches.len() + len
    }
}
