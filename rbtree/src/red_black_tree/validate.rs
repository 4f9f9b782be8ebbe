//! Read-only structural checks of a [`RedBlackTree`].

use log::warn;

use super::{Dir, RawNode, RedBlackTree};
use crate::error::{Result, TreeError, Violation};

impl<K> RedBlackTree<K> {
    /// Number of black nodes on every path from the root down to the
    /// sentinel, counting the root but not the sentinel. An empty tree has
    /// black-height 0.
    ///
    /// Every path ending in the sentinel is compared, not only the outer
    /// spines. If two sibling subtrees disagree the call fails with
    /// [`Violation::BlackHeight`]; nothing panics.
    pub fn black_height(&self) -> Result<usize> {
        unsafe { self.black_height_of(self.root) }.map_err(report)
    }

    unsafe fn black_height_of(&self, node: RawNode<K>) -> std::result::Result<usize, Violation> {
        if self.is_sentinel(node) {
            return Ok(0);
        }

        let left = unsafe { self.black_height_of(node.left()) }?;
        let right = unsafe { self.black_height_of(node.right()) }?;
        if left != right {
            return Err(Violation::BlackHeight { left, right });
        }

        Ok(left + usize::from(unsafe { node.color() }.is_black()))
    }

    /// Checks every invariant the tree maintains and returns its
    /// black-height:
    ///
    ///  * the root is black
    ///  * no red node has a red child
    ///  * keys are strictly ascending in order
    ///  * each child's parent link points back at its parent
    ///  * all sentinel-terminated paths have the same black-height
    ///  * `len` matches the number of reachable nodes
    pub fn validate(&self) -> Result<usize>
    where
        K: PartialOrd,
    {
        self.validate_core().map_err(report)
    }

    fn validate_core(&self) -> std::result::Result<usize, Violation>
    where
        K: PartialOrd,
    {
        unsafe {
            if self.root.color().is_red() {
                return Err(Violation::RedRoot);
            }
            if self.root.parent().is_some() {
                return Err(Violation::ParentLink);
            }
        }

        let mut prev = None;
        let mut found = 0;
        let black_height = unsafe { self.check_subtree(self.root, &mut prev, &mut found) }?;
        if found != self.len {
            return Err(Violation::Len {
                expected: self.len,
                found,
            });
        }

        Ok(black_height)
    }

    unsafe fn check_subtree<'a>(
        &'a self,
        node: RawNode<K>,
        prev: &mut Option<&'a K>,
        found: &mut usize,
    ) -> std::result::Result<usize, Violation>
    where
        K: PartialOrd,
    {
        if self.is_sentinel(node) {
            return Ok(0);
        }

        unsafe {
            for dir in [Dir::Left, Dir::Right] {
                let child = node.child(dir);
                if self.is_sentinel(child) {
                    continue;
                }
                if !child.parent().is_some_and(|parent| parent.is(node)) {
                    return Err(Violation::ParentLink);
                }
                if node.color().is_red() && child.color().is_red() {
                    return Err(Violation::RedRed);
                }
            }

            let left = self.check_subtree(node.left(), prev, found)?;

            let key: &'a K = node.key();
            if prev.replace(key).is_some_and(|prev| !(prev < key)) {
                return Err(Violation::Order);
            }
            *found += 1;

            let right = self.check_subtree(node.right(), prev, found)?;
            if left != right {
                return Err(Violation::BlackHeight { left, right });
            }

            Ok(left + usize::from(node.color().is_black()))
        }
    }
}

fn report(violation: Violation) -> TreeError {
    warn!("red-black tree failed validation: {violation}");
    TreeError::from(violation)
}
