//! Workspace placeholder crate.
//!
//! Exposes the workspace's feature flags: `source` (default) pulls in the
//! full media source node (`core-source` plus its `bridge-media` capability
//! traits), while `bridges-only` builds just the capability traits for hosts
//! that implement the platform side without the node logic.
