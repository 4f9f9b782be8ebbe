//! Errors reported by the trees in this crate.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TreeError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The key cannot be ordered against itself or against a stored key
    /// (for example a floating point `NaN`). The tree is left untouched.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// A structural check found the tree in a state that breaks one of the
    /// red-black rules.
    #[error("invariant violation: {0}")]
    InvariantViolation(#[from] Violation),

    /// The requested operation exists in the API but has no implementation.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

/// The specific rule a [`TreeError::InvariantViolation`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("root is red")]
    RedRoot,

    #[error("red node has a red child")]
    RedRed,

    /// Two sibling subtrees report different black-heights.
    #[error("black-height mismatch: left subtree has {left}, right subtree has {right}")]
    BlackHeight { left: usize, right: usize },

    #[error("keys are not in strictly ascending order")]
    Order,

    /// A node's parent does not list it as a child, or the root has a parent.
    #[error("parent link does not match the child link")]
    ParentLink,

    #[error("tree reports {expected} keys but {found} nodes are reachable")]
    Len { expected: usize, found: usize },
}
