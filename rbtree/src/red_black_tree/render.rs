use core::fmt::{self, Write};
use std::mem;

use super::{RawNode, RedBlackTree};

/// Spaces of indentation per level of depth.
const INDENT: usize = 4;

/// Sideways drawing of the tree, one node per line: the right subtree above
/// the node, the left subtree below, each line indented by its depth.
///
/// ```text
///         > 5 [red]
///     > 4 [black]
/// > 3 [black]
///     > 2 [black]
///         > 1 [red]
/// ```
///
/// Two trees with the same shape, keys and colors render to the same string.
impl<K> fmt::Display for RedBlackTree<K>
where
    K: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        unsafe { self.render_core(self.root, 0, &mut first, f) }
    }
}

impl<K> RedBlackTree<K> {
    /// Same as `to_string()`, see the [`Display`](fmt::Display) impl for the format.
    pub fn render(&self) -> String
    where
        K: fmt::Display,
    {
        self.to_string()
    }

    unsafe fn render_core(
        &self,
        node: RawNode<K>,
        depth: usize,
        first: &mut bool,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result
    where
        K: fmt::Display,
    {
        if self.is_sentinel(node) {
            return Ok(());
        }

        unsafe {
            self.render_core(node.right(), depth + 1, first, f)?;
            if !mem::take(first) {
                f.write_char('\n')?;
            }
            write!(
                f,
                "{:indent$}> {} [{}]",
                "",
                node.key(),
                node.color(),
                indent = INDENT * depth
            )?;
            self.render_core(node.left(), depth + 1, first, f)
        }
    }
}
