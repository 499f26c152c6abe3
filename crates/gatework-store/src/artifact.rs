// crates/gatework-store/src/artifact.rs
// ============================================================================
// Module: Filesystem Artifact Store
// Description: Namespaced, content-addressed artifact writer/reader backed
//              by the local filesystem.
// Purpose: Implement gatework_core::artifact::ArtifactStore under
//          `artifacts/<run_id>/`, enforcing path and collision invariants.
// Dependencies: gatework-core, sha2, std::fs
// ============================================================================

//! ## Overview
//! Every write is catalogued in memory (path, digest, size, producer) so
//! [`FsArtifactStore::exists`]/[`FsArtifactStore::read`] only ever answer
//! for artifacts written by this process during this run; a stray file
//! left on disk from a prior run is never accidentally readable.
//! Rewriting the same path with identical bytes is a no-op; rewriting it
//! with different bytes is a [`ArtifactStoreError::Collision`].

use std::collections::BTreeMap;
use std::fs;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::PoisonError;

use gatework_core::artifact::ArtifactStore;
use gatework_core::error::ArtifactStoreError;
use gatework_core::identifiers::RunId;
use gatework_core::identifiers::StepId;
use gatework_core::model::ArtifactDescriptor;
use gatework_core::summary::RunSummary;
use sha2::Digest;
use sha2::Sha256;

/// A namespaced filesystem-backed [`ArtifactStore`], rooted at
/// `<root>/artifacts/<run_id>/`.
pub struct FsArtifactStore {
    root: PathBuf,
    catalogue: Mutex<BTreeMap<RunId, BTreeMap<String, ArtifactDescriptor>>>,
}

impl FsArtifactStore {
    /// Creates a store rooted at `root`. Nothing is written to disk until
    /// the first [`ArtifactStore::write`] call.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), catalogue: Mutex::new(BTreeMap::new()) }
    }

    fn run_dir(&self, run_id: &RunId) -> PathBuf {
        self.root.join("artifacts").join(run_id.as_str())
    }

    /// Writes `run_id`'s completed [`RunSummary`] to `manifest.json` under
    /// the run's artifact root, per the external interface contract. The
    /// manifest itself is not produced by any step and is not added to the
    /// artifacts index.
    ///
    /// # Errors
    /// Returns [`ArtifactStoreError::Io`] if the manifest cannot be
    /// written.
    pub fn write_manifest(
        &self,
        run_id: &RunId,
        summary: &RunSummary,
    ) -> Result<(), ArtifactStoreError> {
        let path = self.run_dir(run_id).join("manifest.json");
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| ArtifactStoreError::Io {
                path: "manifest.json".to_owned(),
                message: err.to_string(),
            })?;
        }
        let bytes = serde_json::to_vec_pretty(summary).map_err(|err| ArtifactStoreError::Io {
            path: "manifest.json".to_owned(),
            message: err.to_string(),
        })?;
        fs::write(&path, bytes).map_err(|err| ArtifactStoreError::Io {
            path: "manifest.json".to_owned(),
            message: err.to_string(),
        })
    }
}

impl ArtifactStore for FsArtifactStore {
    fn write(
        &self,
        run_id: &RunId,
        path: &str,
        produced_by: &StepId,
        bytes: &[u8],
    ) -> Result<ArtifactDescriptor, ArtifactStoreError> {
        validate_relative_path(path)?;
        let digest = digest_hex(bytes);

        let mut catalogue = self.catalogue.lock().unwrap_or_else(PoisonError::into_inner);
        let run_entry = catalogue.entry(run_id.clone()).or_default();
        if let Some(existing) = run_entry.get(path) {
            return if existing.digest == digest {
                Ok(existing.clone())
            } else {
                Err(ArtifactStoreError::Collision(path.to_owned()))
            };
        }

        let full_path = self.run_dir(run_id).join(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|err| ArtifactStoreError::Io {
                path: path.to_owned(),
                message: err.to_string(),
            })?;
        }
        fs::write(&full_path, bytes).map_err(|err| ArtifactStoreError::Io {
            path: path.to_owned(),
            message: err.to_string(),
        })?;

        let descriptor = ArtifactDescriptor {
            path: path.to_owned(),
            digest,
            size_bytes: bytes.len() as u64,
            produced_by: produced_by.clone(),
            mime_hint: guess_mime(path),
        };
        run_entry.insert(path.to_owned(), descriptor.clone());
        Ok(descriptor)
    }

    fn read(&self, run_id: &RunId, path: &str) -> Result<Vec<u8>, ArtifactStoreError> {
        let catalogued = {
            let catalogue = self.catalogue.lock().unwrap_or_else(PoisonError::into_inner);
            catalogue.get(run_id).is_some_and(|entries| entries.contains_key(path))
        };
        if !catalogued {
            return Err(ArtifactStoreError::NotCatalogued(path.to_owned()));
        }
        let full_path = self.run_dir(run_id).join(path);
        fs::read(&full_path)
            .map_err(|err| ArtifactStoreError::Io { path: path.to_owned(), message: err.to_string() })
    }

    fn exists(&self, run_id: &RunId, path: &str) -> bool {
        self.catalogue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(run_id)
            .is_some_and(|entries| entries.contains_key(path))
    }

    fn descriptor(&self, run_id: &RunId, path: &str) -> Option<ArtifactDescriptor> {
        self.catalogue.lock().unwrap_or_else(PoisonError::into_inner).get(run_id)?.get(path).cloned()
    }
}

fn validate_relative_path(path: &str) -> Result<(), ArtifactStoreError> {
    if path.is_empty() {
        return Err(ArtifactStoreError::InvalidPath(path.to_owned()));
    }
    let candidate = Path::new(path);
    if candidate.is_absolute() {
        return Err(ArtifactStoreError::InvalidPath(path.to_owned()));
    }
    for component in candidate.components() {
        if !matches!(component, Component::Normal(_)) {
            return Err(ArtifactStoreError::InvalidPath(path.to_owned()));
        }
    }
    Ok(())
}

fn digest_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher.finalize().iter().map(|byte| format!("{byte:02x}")).collect()
}

fn guess_mime(path: &str) -> Option<String> {
    let extension = Path::new(path).extension()?.to_str()?;
    let mime = match extension {
        "json" => "application/json",
        "yaml" | "yml" => "application/yaml",
        "diff" | "patch" => "text/x-diff",
        "md" => "text/markdown",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime.to_owned())
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::FsArtifactStore;
    use gatework_core::artifact::ArtifactStore;
    use gatework_core::error::ArtifactStoreError;
    use gatework_core::identifiers::RunId;
    use gatework_core::identifiers::StepId;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let run_id = RunId::generate();
        let step_id = StepId::parse("1.000").expect("valid");

        let descriptor =
            store.write(&run_id, "diagnostics.json", &step_id, b"{\"ok\":true}").expect("writes");
        assert_eq!(descriptor.size_bytes, 12);
        assert!(store.exists(&run_id, "diagnostics.json"));
        assert_eq!(store.read(&run_id, "diagnostics.json").expect("reads"), b"{\"ok\":true}");
    }

    #[test]
    fn rewriting_same_path_with_different_bytes_is_a_collision() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let run_id = RunId::generate();
        let step_id = StepId::parse("1.000").expect("valid");

        store.write(&run_id, "a.txt", &step_id, b"one").expect("writes");
        let result = store.write(&run_id, "a.txt", &step_id, b"two");
        assert!(matches!(result, Err(ArtifactStoreError::Collision(_))));
    }

    #[test]
    fn rewriting_same_path_with_identical_bytes_is_a_no_op() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let run_id = RunId::generate();
        let step_id = StepId::parse("1.000").expect("valid");

        let first = store.write(&run_id, "a.txt", &step_id, b"same").expect("writes");
        let second = store.write(&run_id, "a.txt", &step_id, b"same").expect("writes");
        assert_eq!(first.digest, second.digest);
    }

    #[test]
    fn absolute_and_traversing_paths_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let run_id = RunId::generate();
        let step_id = StepId::parse("1.000").expect("valid");

        assert!(store.write(&run_id, "/etc/passwd", &step_id, b"x").is_err());
        assert!(store.write(&run_id, "../escape.txt", &step_id, b"x").is_err());
    }

    #[test]
    fn read_of_non_catalogued_path_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FsArtifactStore::new(dir.path());
        let run_id = RunId::generate();
        assert!(store.read(&run_id, "never-written.json").is_err());
    }
}
