//! Depth-first traversal contract shared by both trees.

/// Position at which a node is visited relative to its two subtrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Node, then left subtree, then right subtree.
    Pre,
    /// Left subtree, node, right subtree. Yields keys in ascending order.
    In,
    /// Left subtree, right subtree, then the node.
    Post,
}

/// A tree whose keys can be walked depth first.
///
/// Every call to one of the collecting methods starts from a new, empty
/// `Vec`; nothing is carried over between calls.
pub trait Traverse {
    type Key;

    /// Calls `f` with every key in the tree, visiting nodes in `order`.
    fn for_each_key<'a, F>(&'a self, order: Order, f: F)
    where
        F: FnMut(&'a Self::Key);

    fn collect_keys(&self, order: Order) -> Vec<&Self::Key> {
        let mut keys = Vec::new();
        self.for_each_key(order, |key| keys.push(key));
        keys
    }

    fn inorder(&self) -> Vec<&Self::Key> {
        self.collect_keys(Order::In)
    }

    fn preorder(&self) -> Vec<&Self::Key> {
        self.collect_keys(Order::Pre)
    }

    fn postorder(&self) -> Vec<&Self::Key> {
        self.collect_keys(Order::Post)
    }
}
