//! Extension artifact registry
//!
//! An extension is submitted as five files (the `.hsx` script, its JavaScript,
//! an HTML page, a test and a success page). Every file is scanned first; the
//! files are stored only when all of them pass, but the submission itself is
//! always recorded, with status `success` or `failed`.
//!
//! Where artifacts live and how they are scanned is behind the
//! [`ArtifactRegistry`] and [`ArtifactScanner`] traits. [`LocalRegistry`]
//! keeps everything in a directory; [`AllowAll`] accepts every file.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::hsx::error::RegistryError;

const INDEX_FILE: &str = "records.json";
const ANONYMOUS: &str = "Anonymous";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Hsx,
    Js,
    Html,
    Test,
    Success,
}

impl ArtifactKind {
    /// Every kind a submission must provide, in scan order.
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Hsx,
        ArtifactKind::Js,
        ArtifactKind::Html,
        ArtifactKind::Test,
        ArtifactKind::Success,
    ];

    /// Storage folder, also the field name used by submissions.
    pub fn folder(&self) -> &'static str {
        match self {
            ArtifactKind::Hsx => "hsx",
            ArtifactKind::Js => "js",
            ArtifactKind::Html => "html",
            ArtifactKind::Test => "test",
            ArtifactKind::Success => "success",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub status: ArtifactStatus,
    /// Seconds since the Unix epoch.
    pub created_at: u64,
    /// Stored location of each file, relative to the registry. Empty for
    /// failed submissions. Keyed by kind folder name.
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

/// Files offered for one extension.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub author: Option<String>,
    pub files: BTreeMap<ArtifactKind, PathBuf>,
}

impl Submission {
    pub fn new(author: Option<String>) -> Self {
        Self {
            author,
            files: BTreeMap::new(),
        }
    }

    pub fn file(mut self, kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        self.files.insert(kind, path.into());
        self
    }

    /// Extension name: the `.hsx` file name without its extension.
    pub fn name(&self) -> Option<String> {
        let path = self.files.get(&ArtifactKind::Hsx)?;
        let file_name = path.file_name()?.to_string_lossy();
        Some(
            file_name
                .strip_suffix(".hsx")
                .unwrap_or(&file_name)
                .to_string(),
        )
    }

    pub fn author(&self) -> &str {
        self.author
            .as_deref()
            .filter(|author| !author.is_empty())
            .unwrap_or(ANONYMOUS)
    }

    /// Every required file, in scan order. Fails on the first missing kind.
    pub fn required_files(&self) -> Result<Vec<(ArtifactKind, &Path)>, RegistryError> {
        ArtifactKind::ALL
            .iter()
            .map(|kind| {
                self.files
                    .get(kind)
                    .map(|path| (*kind, path.as_path()))
                    .ok_or_else(|| RegistryError::MissingFile(kind.folder().to_string()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe,
}

pub trait ArtifactScanner {
    fn scan(&self, kind: ArtifactKind, path: &Path) -> Result<Verdict, RegistryError>;
}

/// Scanner that trusts every file.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl ArtifactScanner for AllowAll {
    fn scan(&self, _kind: ArtifactKind, _path: &Path) -> Result<Verdict, RegistryError> {
        Ok(Verdict::Safe)
    }
}

pub trait ArtifactRegistry {
    /// Record a submission. Files are copied into the registry only when
    /// `status` is [`ArtifactStatus::Success`].
    fn store(
        &mut self,
        submission: &Submission,
        status: ArtifactStatus,
    ) -> Result<ArtifactRecord, RegistryError>;

    /// Successful submissions, newest first.
    fn list_approved(&self) -> Result<Vec<ArtifactRecord>, RegistryError>;
}

/// Scan then store a submission.
pub fn submit<R, S>(
    registry: &mut R,
    scanner: &S,
    submission: &Submission,
) -> Result<ArtifactRecord, RegistryError>
where
    R: ArtifactRegistry + ?Sized,
    S: ArtifactScanner + ?Sized,
{
    let mut status = ArtifactStatus::Success;
    for (kind, path) in submission.required_files()? {
        if scanner.scan(kind, path)? == Verdict::Unsafe {
            tracing::warn!("Malicious content blocked: {} file {}", kind, path.display());
            status = ArtifactStatus::Failed;
            break;
        }
    }
    registry.store(submission, status)
}

/// Registry kept in a local directory: files under `<root>/<kind>/<name>`,
/// records in `<root>/records.json`.
#[derive(Debug, Clone)]
pub struct LocalRegistry {
    root: PathBuf,
}

impl LocalRegistry {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute location of a stored file.
    pub fn resolve(&self, stored: &str) -> PathBuf {
        self.root.join(stored)
    }

    pub fn records(&self) -> Result<Vec<ArtifactRecord>, RegistryError> {
        let path = self.root.join(INDEX_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).map_err(|source| RegistryError::Io { path, source })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_records(&self, records: &[ArtifactRecord]) -> Result<(), RegistryError> {
        let path = self.root.join(INDEX_FILE);
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(&path, raw).map_err(|source| RegistryError::Io { path, source })
    }

    fn copy_in(&self, kind: ArtifactKind, source: &Path) -> Result<String, RegistryError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| RegistryError::MissingFile(kind.folder().to_string()))?
            .to_string_lossy()
            .into_owned();
        let folder = self.root.join(kind.folder());
        fs::create_dir_all(&folder).map_err(|e| RegistryError::Io {
            path: folder.clone(),
            source: e,
        })?;
        let destination = folder.join(&file_name);
        fs::copy(source, &destination).map_err(|e| RegistryError::Io {
            path: source.to_path_buf(),
            source: e,
        })?;
        Ok(format!("{}/{}", kind.folder(), file_name))
    }
}

impl ArtifactRegistry for LocalRegistry {
    fn store(
        &mut self,
        submission: &Submission,
        status: ArtifactStatus,
    ) -> Result<ArtifactRecord, RegistryError> {
        let required = submission.required_files()?;
        fs::create_dir_all(&self.root).map_err(|source| RegistryError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut files = BTreeMap::new();
        if status == ArtifactStatus::Success {
            for (kind, path) in required {
                files.insert(kind.folder().to_string(), self.copy_in(kind, path)?);
            }
        }

        let mut records = self.records()?;
        let record = ArtifactRecord {
            id: records.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            name: submission.name().unwrap_or_default(),
            author: submission.author().to_string(),
            status,
            created_at: now(),
            files,
        };
        records.push(record.clone());
        self.write_records(&records)?;

        tracing::info!(
            id = record.id,
            status = ?record.status,
            "Recorded extension {}",
            record.name
        );
        Ok(record)
    }

    fn list_approved(&self) -> Result<Vec<ArtifactRecord>, RegistryError> {
        let mut approved: Vec<ArtifactRecord> = self
            .records()?
            .into_iter()
            .filter(|r| r.status == ArtifactStatus::Success)
            .collect();
        approved.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(approved)
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn submission(dir: &TempDir, name: &str) -> Submission {
        let mut submission = Submission::new(Some("ann".into()));
        for kind in ArtifactKind::ALL {
            let file = match kind {
                ArtifactKind::Hsx => format!("{}.hsx", name),
                other => format!("{}.{}", name, other.folder()),
            };
            let path = dir.path().join(file);
            fs::write(&path, format!("{} {}", name, kind)).unwrap();
            submission = submission.file(kind, path);
        }
        submission
    }

    struct RejectKind(ArtifactKind);

    impl ArtifactScanner for RejectKind {
        fn scan(&self, kind: ArtifactKind, _path: &Path) -> Result<Verdict, RegistryError> {
            Ok(if kind == self.0 {
                Verdict::Unsafe
            } else {
                Verdict::Safe
            })
        }
    }

    #[test]
    fn safe_submission_is_stored_and_listed() {
        let inputs = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let mut registry = LocalRegistry::new(store.path());

        let record = submit(&mut registry, &AllowAll, &submission(&inputs, "clock")).unwrap();

        assert_eq!(record.name, "clock");
        assert_eq!(record.status, ArtifactStatus::Success);
        assert_eq!(record.files["hsx"], "hsx/clock.hsx");
        assert!(registry.resolve("js/clock.js").exists());
        assert_eq!(registry.list_approved().unwrap(), vec![record]);
    }

    #[test]
    fn unsafe_file_blocks_storage_but_is_recorded() {
        let inputs = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let mut registry = LocalRegistry::new(store.path());

        let record = submit(
            &mut registry,
            &RejectKind(ArtifactKind::Html),
            &submission(&inputs, "evil"),
        )
        .unwrap();

        assert_eq!(record.status, ArtifactStatus::Failed);
        assert!(record.files.is_empty());
        assert!(!store.path().join("hsx").exists());
        assert_eq!(registry.records().unwrap().len(), 1);
        assert!(registry.list_approved().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_rejected_before_scanning() {
        let store = tempfile::tempdir().unwrap();
        let mut registry = LocalRegistry::new(store.path());
        let partial = Submission::new(None).file(ArtifactKind::Hsx, "only.hsx");

        let err = submit(&mut registry, &AllowAll, &partial).unwrap_err();
        assert!(matches!(err, RegistryError::MissingFile(kind) if kind == "js"));
        assert!(registry.records().unwrap().is_empty());
    }

    #[test]
    fn newest_submission_is_listed_first() {
        let inputs = tempfile::tempdir().unwrap();
        let store = tempfile::tempdir().unwrap();
        let mut registry = LocalRegistry::new(store.path());

        submit(&mut registry, &AllowAll, &submission(&inputs, "first")).unwrap();
        submit(&mut registry, &AllowAll, &submission(&inputs, "second")).unwrap();

        let names: Vec<_> = registry
            .list_approved()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    #[test]
    fn blank_author_is_anonymous() {
        assert_eq!(Submission::new(Some(String::new())).author(), "Anonymous");
        assert_eq!(Submission::new(None).author(), "Anonymous");
    }
}
