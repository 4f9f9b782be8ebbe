use core::fmt;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use log::debug;

use crate::traversal::{Order, Traverse};

struct Node<K> {
    key: K,
    parent: Option<NonNull<Node<K>>>,
    left: Option<NonNull<Node<K>>>,
    right: Option<NonNull<Node<K>>>,
}

impl<K> fmt::Debug for Node<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("Node");
        f.field("key", &self.key);

        let mut dbg_opt_node = |name: &str, node: &Option<NonNull<Node<K>>>| match node {
            Some(node) => {
                let node = unsafe { node.as_ref() };
                f.field(name, &Some(&node.key));
            }
            None => {
                f.field(name, &None::<K>);
            }
        };

        dbg_opt_node("parent", &self.parent);
        dbg_opt_node("left", &self.left);
        dbg_opt_node("right", &self.right);

        f.finish()
    }
}

/// An unbalanced binary search tree based set.
///
/// Shares the traversal contract of [`RedBlackTree`] but does nothing to keep
/// itself shallow: inserting sorted keys degrades it into a linked list.
///
/// [`RedBlackTree`]: crate::RedBlackTree
pub struct BinarySearchTree<K> {
    // INVARIANTS:
    //  * if `len > 0` then root is valid pointer to `Node`
    root: NonNull<Node<K>>,
    len: usize,
    marker: PhantomData<Box<Node<K>>>,
}

impl<K> Drop for BinarySearchTree<K> {
    fn drop(&mut self) {
        if self.is_empty() {
            return;
        }

        // TODO: handle panics in `K::drop`

        unsafe fn inner<K>(node: NonNull<Node<K>>) {
            if let Some(l) = unsafe { (*node.as_ptr()).left } {
                unsafe { inner(l) };
            }
            if let Some(r) = unsafe { (*node.as_ptr()).right } {
                unsafe { inner(r) };
            }
            let _ = unsafe { Box::from_raw(node.as_ptr()) };
        }

        self.len = 0;
        unsafe { inner(self.root) }
    }
}

impl<K> fmt::Debug for BinarySearchTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct TreeDebug<'a, K> {
            root: NonNull<Node<K>>,
            marker: PhantomData<&'a Node<K>>,
        }

        impl<K> fmt::Debug for TreeDebug<'_, K>
        where
            K: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();

                let mut func = |node: NonNull<Node<K>>| {
                    let node = unsafe { node.as_ref() };
                    f.entry(&node);
                };

                unsafe { BinarySearchTree::walk(self.root, Order::In, &mut func) };

                f.finish()
            }
        }

        let mut f = f.debug_struct("BinarySearchTree");
        f.field("len", &self.len);

        match self.len {
            0 => {
                f.field("root", &None::<K>);
                let nodes: &[K] = &[];
                f.field("nodes", &nodes);
            }
            _ => {
                f.field("root", &Some(unsafe { self.root.as_ref() }));
                f.field(
                    "nodes",
                    &TreeDebug {
                        root: self.root,
                        marker: PhantomData,
                    },
                );
            }
        }

        f.finish()
    }
}

impl<K> Default for BinarySearchTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Traverse for BinarySearchTree<K> {
    type Key = K;

    fn for_each_key<'a, F>(&'a self, order: Order, mut f: F)
    where
        F: FnMut(&'a K),
    {
        if self.is_empty() {
            return;
        }

        let mut f = |node: NonNull<Node<K>>| f(unsafe { &(*node.as_ptr()).key });
        unsafe { Self::walk(self.root, order, &mut f) }
    }
}

impl<K> BinarySearchTree<K> {
    pub fn new() -> Self {
        Self {
            root: NonNull::dangling(),
            len: 0,
            marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    unsafe fn walk<F>(node: NonNull<Node<K>>, order: Order, f: &mut F)
    where
        F: FnMut(NonNull<Node<K>>),
    {
        if order == Order::Pre {
            f(node);
        }
        if let Some(l) = unsafe { (*node.as_ptr()).left } {
            unsafe { Self::walk(l, order, f) };
        }
        if order == Order::In {
            f(node);
        }
        if let Some(r) = unsafe { (*node.as_ptr()).right } {
            unsafe { Self::walk(r, order, f) };
        }
        if order == Order::Post {
            f(node);
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Option<NonNull<Node<K>>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if self.is_empty() {
            return None;
        }

        let mut x = self.root;
        loop {
            match key.cmp(unsafe { (*x.as_ptr()).key.borrow() }) {
                Ordering::Less => match unsafe { &(*x.as_ptr()).left } {
                    Some(left) => {
                        x = *left;
                    }
                    None => break,
                },
                Ordering::Equal => return Some(x),
                Ordering::Greater => match unsafe { &(*x.as_ptr()).right } {
                    Some(right) => {
                        x = *right;
                    }
                    None => break,
                },
            }
        }

        None
    }

    pub fn min(&self) -> Option<&K> {
        if self.is_empty() {
            return None;
        }
        let min = unsafe { self.min_of(self.root) };
        Some(unsafe { &(*min.as_ptr()).key })
    }

    unsafe fn min_of(&self, root: NonNull<Node<K>>) -> NonNull<Node<K>> {
        let mut x = root;
        while let Some(left) = unsafe { (*x.as_ptr()).left } {
            x = left;
        }

        x
    }

    pub fn max(&self) -> Option<&K> {
        if self.is_empty() {
            return None;
        }
        let mut x = self.root;
        while let Some(right) = unsafe { (*x.as_ptr()).right } {
            x = right;
        }
        Some(unsafe { &(*x.as_ptr()).key })
    }

    /// Number of nodes on the longest root-to-leaf path, 0 for an empty tree.
    pub fn height(&self) -> usize {
        unsafe fn inner<K>(node: Option<NonNull<Node<K>>>) -> usize {
            match node {
                Some(node) => unsafe {
                    let node = node.as_ptr();
                    1 + inner((*node).left).max(inner((*node).right))
                },
                None => 0,
            }
        }

        if self.is_empty() {
            return 0;
        }
        unsafe { inner(Some(self.root)) }
    }

    /// Keys `k` with `lower <= k <= upper`, in preorder.
    pub fn search_range<Q>(&self, lower: &Q, upper: &Q) -> Vec<&K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        unsafe fn inner<'a, K, Q>(
            node: Option<NonNull<Node<K>>>,
            lower: &Q,
            upper: &Q,
            keys: &mut Vec<&'a K>,
        ) where
            K: Borrow<Q> + 'a,
            Q: Ord + ?Sized,
        {
            let Some(node) = node else {
                return;
            };
            let node: &'a Node<K> = unsafe { &*node.as_ptr() };
            let key: &Q = node.key.borrow();
            if lower <= key && key <= upper {
                keys.push(&node.key);
            }
            if key > lower {
                unsafe { inner(node.left, lower, upper, keys) };
            }
            if key < upper {
                unsafe { inner(node.right, lower, upper, keys) };
            }
        }

        let mut keys = Vec::new();
        if !self.is_empty() {
            unsafe { inner(Some(self.root), lower, upper, &mut keys) };
        }
        keys
    }

    /// Inserts `key`, returning `false` if it was already present. A
    /// duplicate leaves the tree untouched.
    pub fn insert(&mut self, key: K) -> bool
    where
        K: Ord,
    {
        // Move left/right down the tree until we find empty slot
        let mut parent = None;
        let mut maybe_node = if self.is_empty() {
            None
        } else {
            Some(self.root)
        };
        while let Some(node) = maybe_node {
            parent = maybe_node;
            let node = node.as_ptr();
            unsafe {
                match key.cmp(&(*node).key) {
                    Ordering::Less => maybe_node = (*node).left,
                    Ordering::Equal => {
                        debug!("ignoring duplicate key in binary search tree");
                        return false;
                    }
                    Ordering::Greater => maybe_node = (*node).right,
                }
            }
        }

        // new_node is a leaf, it cannot have left or right subtrees
        let new_node = Box::new(Node {
            key,
            parent,
            left: None,
            right: None,
        });
        let new_node = unsafe { NonNull::new_unchecked(Box::into_raw(new_node)) };
        // update parent to point to the new node
        match parent {
            Some(parent) => {
                let parent = parent.as_ptr();
                unsafe {
                    if (*new_node.as_ptr()).key < (*parent).key {
                        (*parent).left = Some(new_node);
                    } else {
                        (*parent).right = Some(new_node);
                    }
                }
            }
            None => {
                self.root = new_node;
            }
        }

        self.len += 1;
        true
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_raw(key).map(|node| self.remove_core(node))
    }

    fn remove_core(&mut self, node: NonNull<Node<K>>) -> K {
        //       ┌────────── 34 ─────────┐
        //       │                       │
        // ┌──── 2 ────┐                 58 ────┐
        // │           │                        │
        // 1      ┌─── 9 ────┐              ┌── 77 ──┐
        //        │          │              │        │
        //     ┌─ 6       ┌─ 20 ─┐      ┌─ 71 ─┐     82
        //     │          │      │      │      │
        //     5         12 ─┐   24    67      75
        //                   │
        //                   13

        let node_ptr = node.as_ptr();
        match unsafe { ((*node_ptr).left, (*node_ptr).right) } {
            (None, v @ Some(_)) | (v @ Some(_), None) | (None, v @ None) => unsafe {
                // `node` has at most one child, splice that child (or nothing)
                // into its place. For example remove 1, 6, 12, 58 from tree above
                self.replace_subtree(node, v)
            },
            (Some(_), Some(right)) => unsafe {
                // Replace `node` with its successor, the minimum of the right
                // subtree. Two cases:
                //  a) `min` is the right child of `node`: just hoist it and
                //     reattach `node.left`, for example remove 20, 75, 77
                //  b) otherwise first splice `min` out by its own right child
                //     (`min` has no left child), then hoist it,
                //     for example remove 9, min will be 12
                let min = self.min_of(right);

                if !ptr::eq(min.as_ptr(), right.as_ptr()) {
                    // b)
                    self.replace_subtree(min, (*min.as_ptr()).right);
                    (*min.as_ptr()).right = (*node_ptr).right;
                    if let Some(new_right) = (*min.as_ptr()).right {
                        (*new_right.as_ptr()).parent = Some(min);
                    }
                }
                self.replace_subtree(node, Some(min));
                (*min.as_ptr()).left = (*node_ptr).left;
                if let Some(new_left) = (*min.as_ptr()).left {
                    (*new_left.as_ptr()).parent = Some(min);
                }
            },
        }

        let node = unsafe { Box::from_raw(node_ptr) };
        self.len -= 1;
        node.key
    }

    /// Replaces subtree `old` with subtree `new`
    unsafe fn replace_subtree(&mut self, old: NonNull<Node<K>>, new: Option<NonNull<Node<K>>>) {
        // a) make the parent of `old` point to `new`; a parentless `old` was
        //    the root, so `new` becomes the root
        // b) make `new` point to the parent of `old`

        unsafe {
            // a)
            match (*old.as_ptr()).parent {
                Some(parent) => {
                    let parent = parent.as_ptr();
                    match (*parent).left {
                        Some(l) if ptr::eq(old.as_ptr(), l.as_ptr()) => (*parent).left = new,
                        _ => (*parent).right = new,
                    }
                }
                None => {
                    self.root = match new {
                        Some(new) => new,
                        None => NonNull::dangling(),
                    }
                }
            }

            // b)
            if let Some(new) = new {
                (*new.as_ptr()).parent = (*old.as_ptr()).parent;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RedBlackTree;

    fn sample() -> BinarySearchTree<i32> {
        let mut tree = BinarySearchTree::new();
        for key in [12, 5, 9, 2, 18, 15, 13, 17, 19] {
            assert!(tree.insert(key));
        }
        tree
    }

    #[test]
    fn test() {
        let mut tree = BinarySearchTree::new();
        assert!(tree.is_empty());
        tree.insert(12);
        assert_eq!(tree.len(), 1);
        tree.insert(5);
        tree.insert(9);
        tree.insert(2);
        tree.insert(18);
        assert_eq!(tree.len(), 5);

        println!("{tree:#?}")
    }

    #[test]
    fn agrees_with_red_black_tree() {
        let ascending: Vec<i32> = (0..500).collect();
        let descending: Vec<i32> = (0..500).rev().collect();
        let zig_zag: Vec<i32> = (0..250).flat_map(|i| [i, 499 - i]).collect();

        for keys in [ascending, descending, zig_zag] {
            let mut bst = BinarySearchTree::new();
            let mut rbt = RedBlackTree::new();
            for key in &keys {
                assert!(bst.insert(*key));
                assert_eq!(rbt.insert(*key), Ok(true));
            }
            assert_eq!(rbt.inorder(), bst.inorder());
            assert!(rbt.validate().is_ok());
            // every run degenerates into a single path without rebalancing
            assert_eq!(bst.height(), 500);
            assert!(rbt.height() <= 18);
        }
    }

    #[test]
    fn traversals() {
        let tree = BinarySearchTree::<i32>::new();
        assert!(tree.inorder().is_empty());

        let tree = sample();
        assert_eq!(tree.inorder(), [&2, &5, &9, &12, &13, &15, &17, &18, &19]);
        assert_eq!(tree.preorder(), [&12, &5, &2, &9, &18, &15, &13, &17, &19]);
        assert_eq!(tree.postorder(), [&2, &9, &5, &13, &17, &15, &19, &18, &12]);
        // nothing leaks from one call into the next
        assert_eq!(tree.preorder().len(), tree.len());
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut tree = sample();
        assert!(!tree.insert(15));
        assert_eq!(tree.len(), 9);
        assert_eq!(tree.preorder(), [&12, &5, &2, &9, &18, &15, &13, &17, &19]);
    }

    #[test]
    fn contains() {
        let mut tree = BinarySearchTree::new();
        assert!(!tree.contains(&4));
        tree.insert(4);
        assert!(tree.contains(&4));

        let tree = sample();
        for it in [2, 5, 9, 18, 12, 15, 13, 17, 19] {
            assert!(tree.contains(&it));
        }
        assert!(!tree.contains(&14));
    }

    #[test]
    fn min_max_height() {
        let empty = BinarySearchTree::<i32>::new();
        assert_eq!(empty.min(), None);
        assert_eq!(empty.max(), None);
        assert_eq!(empty.height(), 0);

        let tree = sample();
        assert_eq!(tree.min(), Some(&2));
        assert_eq!(tree.max(), Some(&19));
        assert_eq!(tree.height(), 4);

        let mut list = BinarySearchTree::new();
        for key in 0..10 {
            list.insert(key);
        }
        assert_eq!(list.height(), 10);
    }

    #[test]
    fn search_range() {
        let tree = sample();
        assert_eq!(tree.search_range(&5, &15), [&12, &5, &9, &15, &13]);
        assert_eq!(tree.search_range(&20, &30), Vec::<&i32>::new());
        assert_eq!(tree.search_range(&19, &19), [&19]);
    }

    #[test]
    fn remove() {
        let mut tree = sample();
        assert_eq!(tree.remove(&4), None);

        for it in [2, 5, 9, 18, 12, 15, 13, 17, 19] {
            assert_eq!(tree.remove(&it), Some(it));
            assert!(!tree.contains(&it));
        }
        assert!(tree.is_empty());
    }

    mod proptests {
        use std::collections::BTreeSet;

        use proptest::prelude::*;
        use rand::seq::SliceRandom;
        use rand::SeedableRng;
        use rand_chacha::ChaCha8Rng;

        use super::*;

        #[cfg(not(miri))]
        const TREE_SIZE: usize = 1000;
        #[cfg(miri)]
        const TREE_SIZE: usize = 50;

        #[cfg(not(miri))]
        const PROPTEST_CASES: u32 = 1000;
        #[cfg(miri)]
        const PROPTEST_CASES: u32 = 10;

        proptest!(
            #![proptest_config(ProptestConfig::with_cases(PROPTEST_CASES))]

            #[test]
            fn insert_contains(
                inserts in proptest::collection::vec(0..10000i32, 0..TREE_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10)
            ) {
                let reference = BTreeSet::from_iter(inserts.iter().copied());
                let mut bst = BinarySearchTree::new();
                for v in &inserts {
                    bst.insert(*v);
                }
                prop_assert_eq!(bst.len(), reference.len());

                for key in inserts.iter().chain(access.iter()) {
                    prop_assert_eq!(reference.contains(key), bst.contains(key));
                }
            }

            #[test]
            fn order(
                inserts in proptest::collection::vec(0..10000i32, 0..TREE_SIZE),
            ) {
                let mut bst = BinarySearchTree::new();
                for v in &inserts {
                    bst.insert(*v);
                }

                let reference = BTreeSet::from_iter(inserts.into_iter());
                let expected: Vec<_> = reference.iter().collect();
                prop_assert_eq!(bst.inorder(), expected);
            }

            #[test]
            fn agrees_with_red_black_tree(
                inserts in proptest::collection::vec(0..10000i32, 0..TREE_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10),
            ) {
                let mut bst = BinarySearchTree::new();
                let mut rbt = RedBlackTree::new();
                for v in &inserts {
                    prop_assert_eq!(rbt.insert(*v), Ok(bst.insert(*v)));
                }
                prop_assert_eq!(rbt.len(), bst.len());
                prop_assert_eq!(rbt.inorder(), bst.inorder());

                for key in inserts.iter().chain(access.iter()) {
                    prop_assert_eq!(rbt.contains(key), bst.contains(key));
                }
            }

            #[test]
            fn remove(
                inserts in proptest::collection::hash_set(0..10000i32, 0..TREE_SIZE),
                access in proptest::collection::vec(0..10000i32, 0..10),
                seed in any::<u64>(),
            ) {
                let mut reference = BTreeSet::from_iter(inserts.iter().copied());
                let mut bst = BinarySearchTree::new();
                for v in &inserts {
                    bst.insert(*v);
                }

                let mut inserts: Vec<_> = inserts.into_iter().collect();
                inserts.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));
                for key in inserts.iter().chain(access.iter()) {
                    prop_assert_eq!(reference.take(key), bst.remove(key));
                }
                prop_assert!(bst.is_empty());
            }
        );
    }
}
