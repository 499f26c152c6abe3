// crates/gatework-core/src/artifact.rs
// ============================================================================
// Module: Artifact Store (trait seam)
// Description: The backend-agnostic interface the Executor writes emitted
//              artifacts through.
// Purpose: Let `gatework-store` supply the concrete namespaced filesystem
//          writer without `gatework-core` depending on the filesystem.
// Dependencies: crate::error, crate::model
// ============================================================================

//! ## Overview
//! [`ArtifactStore`] is implemented by `gatework-store`'s `FsArtifactStore`.
//! It enforces the namespace and collision invariants from §3: paths are
//! always run-relative, never absolute or parent-traversing, and writing
//! the same path twice with different content is rejected. Every write
//! computes a SHA-256 digest so gates and the run manifest can verify
//! content without re-reading it.

use crate::error::ArtifactStoreError;
use crate::identifiers::RunId;
use crate::identifiers::StepId;
use crate::model::ArtifactDescriptor;

/// A namespaced, content-addressed artifact writer/reader for one run.
pub trait ArtifactStore {
    /// Writes `bytes` under `run_id`'s namespace at `path`, produced by
    /// `produced_by`.
    ///
    /// # Errors
    /// Returns [`ArtifactStoreError::InvalidPath`] if `path` is absolute
    /// or escapes the run namespace, [`ArtifactStoreError::Collision`] if
    /// `path` was already written with different bytes, or
    /// [`ArtifactStoreError::Io`] on an underlying I/O failure.
    fn write(
        &self,
        run_id: &RunId,
        path: &str,
        produced_by: &StepId,
        bytes: &[u8],
    ) -> Result<ArtifactDescriptor, ArtifactStoreError>;

    /// Reads the bytes previously written at `path` within `run_id`'s
    /// namespace.
    ///
    /// # Errors
    /// Returns [`ArtifactStoreError::NotCatalogued`] if `path` was never
    /// written in this run, or [`ArtifactStoreError::Io`] on an underlying
    /// I/O failure.
    fn read(&self, run_id: &RunId, path: &str) -> Result<Vec<u8>, ArtifactStoreError>;

    /// Whether `path` has been catalogued (written) within `run_id`'s
    /// namespace.
    fn exists(&self, run_id: &RunId, path: &str) -> bool;

    /// The descriptor recorded for `path`, if it has been written.
    fn descriptor(&self, run_id: &RunId, path: &str) -> Option<ArtifactDescriptor>;
}
