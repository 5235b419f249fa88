//! Shared types and wire format for corefetch.
//!
//! The package index describes hardware cores and the build tools they depend
//! on. This crate owns its JSON model, the checksum and key types derived from
//! it, and the host-triple buckets used to pick tool artifacts.

pub mod checksum;
pub mod host;
pub mod index;
pub mod version;

// Re-exports
pub use checksum::Checksum;
pub use host::{HostBucket, current_host_triple, host_matches};
pub use index::{
    CoreDescriptor, CoreKey, Package, PackageIndex, ToolDescriptor, ToolKey, ToolRef, ToolSystem,
    filename_from_url,
};
pub use version::VersionOrdering;
