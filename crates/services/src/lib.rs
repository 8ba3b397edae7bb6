pub mod artifact_store;
pub mod filename;

pub use artifact_store::ArtifactStore;
pub use filename::sanitize;
