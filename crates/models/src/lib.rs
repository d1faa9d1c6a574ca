//! Domain model of the version tree: app → environment → component → version.
//!
//! - `key`: typed addresses of tree nodes and their encoding into flat backend keys
//! - `tree`: JSON-facing views of (parts of) the tree

pub mod errors;
pub mod key;
pub mod tree;

pub use errors::ModelError;
pub use key::{AppKey, ComponentKey, EnvKey, APPS_SET};
pub use tree::{AppTree, ComponentVersions, EnvironmentTree};
