//! Custom request extractors.

mod uuid_path;

pub use uuid_path::UuidPath;
