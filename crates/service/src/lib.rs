//! Service layer: the version tree on top of a flat key-value backend.
//! - `storage`: the backend abstraction (`KvBackend`) and its Redis / in-memory implementations.
//! - `versions`: tree reads and writes composed from backend primitives.

pub mod errors;
pub mod storage;
pub mod versions;

pub use versions::VersionService;
