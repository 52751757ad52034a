//! Basic markdown syntax: the block constructs every chat message relies on.
pub mod block;
