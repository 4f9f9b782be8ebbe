use core::fmt;
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::ptr::{self, NonNull};

use log::{debug, trace};

use crate::error::{Result, TreeError};
use crate::traversal::{Order, Traverse};

mod render;
mod validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

impl Color {
    /// Returns `true` if the color is [`Red`].
    ///
    /// [`Red`]: Color::Red
    #[must_use]
    pub fn is_red(&self) -> bool {
        matches!(self, Self::Red)
    }

    /// Returns `true` if the color is [`Black`].
    ///
    /// [`Black`]: Color::Black
    #[must_use]
    pub fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Red => "red",
            Self::Black => "black",
        })
    }
}

/// Side of its parent a child hangs from.
///
/// Rotation and fix-up are written once against a `Dir` and cover both
/// mirror images of every case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dir {
    Left,
    Right,
}

impl Dir {
    #[inline]
    fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

struct Node<K> {
    // key is uninit only for the sentinel, otherwise it must always be valid
    key: MaybeUninit<K>,
    color: Color,
    // non-owning, only ever followed upwards by rotation and fix-up
    parent: Option<RawNode<K>>,
    left: RawNode<K>,
    right: RawNode<K>,
}

/// Wrapper around `NonNull<Node<K>>` to provide convenient methods in order
/// to make the algorithms of RedBlackTree much more readable.
#[repr(transparent)]
struct RawNode<K> {
    ptr: NonNull<Node<K>>,
}

impl<K> Clone for RawNode<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for RawNode<K> {}

impl<K> RawNode<K> {
    fn dangling() -> Self {
        Self {
            ptr: NonNull::dangling(),
        }
    }

    /// Allocates the valueless black node that stands in for every missing
    /// child. Its own links are never followed.
    fn sentinel() -> Self {
        Self::from_node(Node {
            key: MaybeUninit::uninit(),
            color: Color::Black,
            parent: None,
            left: Self::dangling(),
            right: Self::dangling(),
        })
    }

    fn from_node(node: Node<K>) -> Self {
        Self {
            ptr: unsafe { NonNull::new_unchecked(Box::into_raw(Box::new(node))) },
        }
    }

    #[inline]
    fn as_ptr(&self) -> *mut Node<K> {
        self.ptr.as_ptr()
    }

    #[inline]
    fn is(&self, other: RawNode<K>) -> bool {
        ptr::eq(self.as_ptr(), other.as_ptr())
    }

    #[inline]
    unsafe fn key<'a>(&self) -> &'a K {
        unsafe { (*self.as_ptr()).key.assume_init_ref() }
    }

    #[inline]
    unsafe fn parent(&self) -> Option<RawNode<K>> {
        unsafe { (*self.as_ptr()).parent }
    }

    #[inline]
    unsafe fn set_parent(&mut self, new_parent: Option<RawNode<K>>) {
        unsafe {
            (*self.as_ptr()).parent = new_parent;
        }
    }

    #[inline]
    unsafe fn left(&self) -> RawNode<K> {
        unsafe { (*self.as_ptr()).left }
    }

    #[inline]
    unsafe fn right(&self) -> RawNode<K> {
        unsafe { (*self.as_ptr()).right }
    }

    #[inline]
    unsafe fn child(&self, dir: Dir) -> RawNode<K> {
        match dir {
            Dir::Left => unsafe { self.left() },
            Dir::Right => unsafe { self.right() },
        }
    }

    #[inline]
    unsafe fn set_child(&mut self, dir: Dir, new_child: RawNode<K>) {
        let ptr = self.as_ptr();
        unsafe {
            match dir {
                Dir::Left => (*ptr).left = new_child,
                Dir::Right => (*ptr).right = new_child,
            }
        }
    }

    #[inline]
    unsafe fn color(&self) -> Color {
        unsafe { (*self.as_ptr()).color }
    }

    #[inline]
    unsafe fn set_color(&mut self, new_color: Color) {
        unsafe { (*self.as_ptr()).color = new_color }
    }

    #[inline]
    unsafe fn pos(&self) -> NodePos<K> {
        match unsafe { self.parent() } {
            Some(parent) => {
                let side = if unsafe { parent.left() }.is(*self) {
                    Dir::Left
                } else {
                    debug_assert!(
                        unsafe { parent.right() }.is(*self),
                        "parent does not list the node as a child"
                    );
                    Dir::Right
                };
                NodePos::Child { parent, side }
            }
            None => NodePos::Root,
        }
    }
}

enum NodePos<K> {
    Root,
    Child { parent: RawNode<K>, side: Dir },
}

/// A red-black tree based set.
///
/// Insertion keeps the tree balanced so that its height never exceeds
/// `2 * log2(n + 1)`. Keys are never removed once inserted.
pub struct RedBlackTree<K> {
    // INVARIANTS:
    //  * `root` is the sentinel iff `len == 0`
    //  * every missing child link points at `sentinel`
    //  * `sentinel` is black and nothing ever writes to it after `new`
    root: RawNode<K>,
    sentinel: RawNode<K>,
    len: usize,
    marker: PhantomData<Box<Node<K>>>,
}

// The tree owns its nodes exactly like a `Box` would.
unsafe impl<K: Send> Send for RedBlackTree<K> {}
unsafe impl<K: Sync> Sync for RedBlackTree<K> {}

impl<K> Drop for RedBlackTree<K> {
    fn drop(&mut self) {
        // TODO: handle panics in `K::drop`

        unsafe fn inner<K>(node: RawNode<K>, sentinel: RawNode<K>) {
            if node.is(sentinel) {
                return;
            }
            unsafe {
                inner(node.left(), sentinel);
                inner(node.right(), sentinel);
                let mut node: Box<Node<K>> = Box::from_raw(node.as_ptr());
                node.key.assume_init_drop();
            }
        }

        let root = mem::replace(&mut self.root, self.sentinel);
        self.len = 0;
        unsafe { inner(root, self.sentinel) };
        // the sentinel's key was never initialized, so only the allocation goes
        let _: Box<Node<K>> = unsafe { Box::from_raw(self.sentinel.as_ptr()) };
    }
}

impl<K> fmt::Debug for RedBlackTree<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct NodeDebug<'a, K> {
            tree: &'a RedBlackTree<K>,
            node: RawNode<K>,
        }

        impl<K> fmt::Debug for NodeDebug<'_, K>
        where
            K: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let key_of = |node: Option<RawNode<K>>| {
                    node.filter(|node| !self.tree.is_sentinel(*node))
                        .map(|node| unsafe { node.key() })
                };

                let node = self.node;
                unsafe {
                    f.debug_struct("Node")
                        .field("key", node.key())
                        .field("color", &node.color())
                        .field("parent", &key_of(node.parent()))
                        .field("left", &key_of(Some(node.left())))
                        .field("right", &key_of(Some(node.right())))
                        .finish()
                }
            }
        }

        struct TreeDebug<'a, K> {
            tree: &'a RedBlackTree<K>,
        }

        impl<K> fmt::Debug for TreeDebug<'_, K>
        where
            K: fmt::Debug,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let mut f = f.debug_list();

                let tree = self.tree;
                let mut func = |node: RawNode<K>| {
                    f.entry(&NodeDebug { tree, node });
                };

                unsafe { tree.walk(tree.root, Order::In, &mut func) };
                f.finish()
            }
        }

        let mut f = f.debug_struct("RedBlackTree");
        f.field("len", &self.len);

        match self.len {
            0 => {
                f.field("root", &None::<K>);
                let nodes: &[K] = &[];
                f.field("nodes", &nodes);
            }
            _ => {
                f.field(
                    "root",
                    &Some(NodeDebug {
                        tree: self,
                        node: self.root,
                    }),
                );
                f.field("nodes", &TreeDebug { tree: self });
            }
        }

        f.finish()
    }
}

impl<K> Default for RedBlackTree<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Traverse for RedBlackTree<K> {
    type Key = K;

    fn for_each_key<'a, F>(&'a self, order: Order, mut f: F)
    where
        F: FnMut(&'a K),
    {
        let mut f = |node: RawNode<K>| f(unsafe { node.key() });
        unsafe { self.walk(self.root, order, &mut f) }
    }
}

impl<K> RedBlackTree<K> {
    pub fn new() -> Self {
        let sentinel = RawNode::sentinel();
        Self {
            root: sentinel,
            sentinel,
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

    #[inline]
    fn is_sentinel(&self, node: RawNode<K>) -> bool {
        node.is(self.sentinel)
    }

    unsafe fn walk<F>(&self, node: RawNode<K>, order: Order, f: &mut F)
    where
        F: FnMut(RawNode<K>),
    {
        if self.is_sentinel(node) {
            return;
        }

        if order == Order::Pre {
            f(node);
        }
        unsafe { self.walk(node.left(), order, f) };
        if order == Order::In {
            f(node);
        }
        unsafe { self.walk(node.right(), order, f) };
        if order == Order::Post {
            f(node);
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        self.get_raw(key).is_some()
    }

    fn get_raw<Q>(&self, key: &Q) -> Option<RawNode<K>>
    where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        let mut x = self.root;
        while !self.is_sentinel(x) {
            x = match key.partial_cmp(unsafe { x.key() }.borrow()) {
                Some(Ordering::Less) => unsafe { x.left() },
                Some(Ordering::Equal) => return Some(x),
                Some(Ordering::Greater) => unsafe { x.right() },
                None => return None,
            };
        }

        None
    }

    /// Color of the node holding `key`.
    pub fn color_of<Q>(&self, key: &Q) -> Option<Color>
    where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        self.get_raw(key).map(|node| unsafe { node.color() })
    }

    pub fn min(&self) -> Option<&K> {
        if self.is_empty() {
            return None;
        }
        let min = unsafe { self.outermost(self.root, Dir::Left) };
        Some(unsafe { min.key() })
    }

    pub fn max(&self) -> Option<&K> {
        if self.is_empty() {
            return None;
        }
        let max = unsafe { self.outermost(self.root, Dir::Right) };
        Some(unsafe { max.key() })
    }

    unsafe fn outermost(&self, root: RawNode<K>, dir: Dir) -> RawNode<K> {
        let mut x = root;
        loop {
            let next = unsafe { x.child(dir) };
            if self.is_sentinel(next) {
                return x;
            }
            x = next;
        }
    }

    /// Number of nodes on the longest root-to-leaf path, 0 for an empty tree.
    pub fn height(&self) -> usize {
        unsafe { self.height_of(self.root) }
    }

    unsafe fn height_of(&self, node: RawNode<K>) -> usize {
        if self.is_sentinel(node) {
            return 0;
        }
        unsafe { 1 + self.height_of(node.left()).max(self.height_of(node.right())) }
    }

    /// Lengths of the leftmost and rightmost spines below the root, each
    /// counting the root itself.
    ///
    /// This only looks at the two outer paths. It says something about the
    /// shape of the tree but nothing about whether it is balanced; use
    /// [`black_height`](Self::black_height) for that.
    pub fn heights(&self) -> Option<(usize, usize)> {
        if self.is_empty() {
            return None;
        }
        Some(unsafe { self.spine_heights(self.root) })
    }

    /// Same as [`heights`](Self::heights) but starting at the node holding `key`.
    pub fn heights_at<Q>(&self, key: &Q) -> Option<(usize, usize)>
    where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        self.get_raw(key)
            .map(|node| unsafe { self.spine_heights(node) })
    }

    unsafe fn spine_heights(&self, node: RawNode<K>) -> (usize, usize) {
        let spine = |dir: Dir| {
            let mut steps = 0;
            let mut x = node;
            loop {
                let next = unsafe { x.child(dir) };
                if self.is_sentinel(next) {
                    return steps;
                }
                x = next;
                steps += 1;
            }
        };

        (spine(Dir::Left) + 1, spine(Dir::Right) + 1)
    }

    /// Keys `k` with `lower <= k <= upper`, in preorder.
    pub fn search_range<Q>(&self, lower: &Q, upper: &Q) -> Vec<&K>
    where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        let mut keys = Vec::new();
        unsafe { self.search_range_core(self.root, lower, upper, &mut keys) };
        keys
    }

    unsafe fn search_range_core<'a, Q>(
        &'a self,
        node: RawNode<K>,
        lower: &Q,
        upper: &Q,
        keys: &mut Vec<&'a K>,
    ) where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        if self.is_sentinel(node) {
            return;
        }

        let key: &'a K = unsafe { node.key() };
        let k: &Q = key.borrow();
        if lower <= k && k <= upper {
            keys.push(key);
        }
        if k > lower {
            unsafe { self.search_range_core(node.left(), lower, upper, keys) };
        }
        if k < upper {
            unsafe { self.search_range_core(node.right(), lower, upper, keys) };
        }
    }

    /// Rotates the subtree rooted at `node` towards `dir`, promoting the
    /// child on the opposite side into `node`'s place.
    ///
    /// Does nothing if `node` is the sentinel or has no child to promote.
    fn rotate(&mut self, mut node: RawNode<K>, dir: Dir) {
        //    p                       p
        //    |                       |
        // +-node-+               +-pivot-+
        // |      |      -->      |       |
        // a  +-pivot-+       +-node-+    c
        //    |       |       |      |
        //    b       c       a      b
        // drawn for `dir == Left`, `Right` is the mirror image,
        // a, b, c can be any subtrees
        if self.is_sentinel(node) {
            return;
        }

        unsafe {
            let mut pivot = node.child(dir.opposite());
            if self.is_sentinel(pivot) {
                return;
            }
            trace!("rotate {dir:?}");

            // attach b to node
            let mut inner = pivot.child(dir);
            node.set_child(dir.opposite(), inner);
            if !self.is_sentinel(inner) {
                inner.set_parent(Some(node));
            }

            // attach pivot to node's parent
            pivot.set_parent(node.parent());
            match node.pos() {
                NodePos::Root => self.root = pivot,
                NodePos::Child { mut parent, side } => parent.set_child(side, pivot),
            }

            // attach node to pivot
            pivot.set_child(dir, node);
            node.set_parent(Some(pivot));
        }
    }

    /// Inserts `key` and rebalances the tree.
    ///
    /// Returns `Ok(false)` without touching the tree if the key is already
    /// present. Keys that cannot be ordered (such as `f64::NAN`) are
    /// rejected with [`TreeError::InvalidArgument`], also without touching
    /// the tree.
    pub fn insert(&mut self, key: K) -> Result<bool>
    where
        K: PartialOrd,
    {
        if key.partial_cmp(&key).is_none() {
            debug!("rejecting a key that is not comparable with itself");
            return Err(TreeError::InvalidArgument(
                "key is not comparable with itself",
            ));
        }

        // Move left/right down the tree until we find empty slot
        let mut parent = None;
        let mut side = Dir::Left;
        let mut x = self.root;
        while !self.is_sentinel(x) {
            parent = Some(x);
            side = match key.partial_cmp(unsafe { x.key() }) {
                Some(Ordering::Less) => Dir::Left,
                Some(Ordering::Greater) => Dir::Right,
                Some(Ordering::Equal) => {
                    debug!("ignoring duplicate key in red-black tree");
                    return Ok(false);
                }
                None => {
                    debug!("rejecting a key that is not comparable with a stored key");
                    return Err(TreeError::InvalidArgument(
                        "key is not comparable with a stored key",
                    ));
                }
            };
            x = unsafe { x.child(side) };
        }

        // new node is a red leaf
        let new_node = RawNode::from_node(Node {
            key: MaybeUninit::new(key),
            color: Color::Red,
            parent,
            left: self.sentinel,
            right: self.sentinel,
        });
        match parent {
            Some(mut parent) => unsafe { parent.set_child(side, new_node) },
            None => self.root = new_node,
        }

        self.len += 1;
        self.insert_fixup(new_node);
        Ok(true)
    }

    fn insert_fixup(&mut self, new_node: RawNode<K>) {
        let mut node = new_node;
        unsafe {
            while let NodePos::Child {
                mut parent,
                side: node_side,
            } = node.pos()
            {
                if parent.color().is_black() {
                    break;
                }
                debug_assert!(node.color().is_red());
                // Red parent with a red child is the only violation at this
                // point. A red parent is never the root, so the grand parent
                // exists and is black.
                let NodePos::Child {
                    parent: mut grand_parent,
                    side,
                } = parent.pos()
                else {
                    unreachable!("red node cannot be the root");
                };
                debug_assert!(grand_parent.color().is_black());
                let mut uncle = grand_parent.child(side.opposite());

                if uncle.color().is_red() {
                    //     +--- gp:b ---+               +--- gp:r ---+
                    //     |            |               |            |
                    //  + p:r +      + u:r +   -->   + p:b +      + u:b +
                    //  |     |      |     |         |     |      |     |
                    // n:r    a      b     c        n:r    a      b     c
                    //
                    // Black heights below gp are unchanged. gp may now be a
                    // red child of a red parent, so continue from there.
                    trace!("insert fixup: red uncle, recolor and move up");
                    parent.set_color(Color::Black);
                    uncle.set_color(Color::Black);
                    grand_parent.set_color(Color::Red);
                    node = grand_parent;
                } else {
                    //         +--- gp:b ---+                  +--- p:b ---+
                    //         |            |                  |           |
                    //   +--- p:r ---+     u:b     -->        n:r     +-- gp:r --+
                    //   |           |                                |          |
                    //  n:r          a                                a         u:b
                    //
                    // drawn for `side == Left`. If n hangs on the inner side
                    // it is first rotated to the outer side.
                    if node_side != side {
                        trace!("insert fixup: black uncle, inner child");
                        self.rotate(parent, side);
                        parent = node;
                    }

                    trace!("insert fixup: black uncle, outer child");
                    parent.set_color(Color::Black);
                    grand_parent.set_color(Color::Red);
                    self.rotate(grand_parent, side.opposite());
                    // parent is black now and took gp's place, nothing above changed
                    break;
                }
            }

            self.root.set_color(Color::Black);
        }
    }

    /// Deletion is not supported by this tree. The call always fails with
    /// [`TreeError::NotImplemented`] and leaves the tree as it was.
    pub fn remove<Q>(&mut self, _key: &Q) -> Result<K>
    where
        K: Borrow<Q>,
        Q: PartialOrd + ?Sized,
    {
        Err(TreeError::NotImplemented("removing keys from a red-black tree"))
    }
}
