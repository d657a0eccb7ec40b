//! # Types
//!
//! Data model shared by the dump inspector, the artifact resolver and the
//! launch adapter.
//!
//! Everything here is produced once (from the dump, or by a resolution) and is
//! read-only afterwards.

pub mod artifact;
pub mod runtime;
pub mod target;
pub mod version;

// Re-export all public types
pub use artifact::{ArtifactDescriptor, ArtifactKind, ArtifactStatus, ResolutionResult};
pub use runtime::RuntimeInstance;
pub use target::{Architecture, TargetDescriptor, TargetPlatform};
pub use version::RuntimeVersion;
