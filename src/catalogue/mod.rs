//! Directory catalogue walkers (`spec.md` §4.6, §4.7): turn a framed
//! directory block into a [`Node`](crate::node::Node) subtree.
pub mod new;
pub mod old;
