//! Ordered key containers: a red-black tree that rebalances on insertion and
//! the plain binary search tree it is compared against.
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod binary_search_tree;
pub mod error;
pub mod red_black_tree;
pub mod traversal;

pub use binary_search_tree::BinarySearchTree;
pub use error::{Result, TreeError, Violation};
pub use red_black_tree::{Color, RedBlackTree};
pub use traversal::{Order, Traverse};

#[cfg(test)]
pub(crate) fn init_test_logging() {
    use simplelog::{Config, LevelFilter, TestLogger};

    // Only the first call installs the logger, later ones get an error back.
    let _ = TestLogger::init(LevelFilter::Debug, Config::default());
}
