//! A file-backed store of deployment records, one JSON document per version tag

use std::{
    fs::{self, File, OpenOptions},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, warn};

use crate::{
    constants::{LOCK_FILE_EXTENSION, TMP_FILE_EXTENSION},
    errors::ScriptError,
    types::{DeploymentRecord, VersionTag},
};

/// A directory holding one [`DeploymentRecord`] per [`VersionTag`]
#[derive(Clone, Debug)]
pub struct CacheStore {
    /// The directory the cache artifacts live in
    dir: PathBuf,
}

impl CacheStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The path of the cache artifact for the given version
    pub fn path_of(&self, tag: VersionTag) -> PathBuf {
        self.dir.join(tag.cache_file_name())
    }

    /// Whether a cache artifact exists for the given version
    pub fn exists(&self, tag: VersionTag) -> bool {
        self.path_of(tag).is_file()
    }

    /// Read the record for the given version.
    ///
    /// A missing artifact is a [`ScriptError::MissingPrerequisite`], an unreadable
    /// or malformed one a [`ScriptError::CacheParse`].
    pub fn read(&self, tag: VersionTag) -> Result<DeploymentRecord, ScriptError> {
        let path = self.path_of(tag);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ScriptError::MissingPrerequisite { tag, path })
            }
            Err(e) => {
                return Err(ScriptError::CacheParse {
                    path,
                    reason: e.to_string(),
                })
            }
        };

        serde_json::from_str(&contents).map_err(|e| ScriptError::CacheParse {
            path,
            reason: e.to_string(),
        })
    }

    /// Take the exclusive lock on the given version's artifact.
    ///
    /// A step holds this lock from before its first transaction until its
    /// record is written, so two runs of the same step never overlap.
    pub fn lock(&self, tag: VersionTag) -> Result<CacheLock, ScriptError> {
        fs::create_dir_all(&self.dir).map_err(|e| ScriptError::CacheWrite(e.to_string()))?;
        CacheLock::acquire(tag, self.path_of(tag))
    }

    /// Write the record for the version `lock` guards, replacing any previous
    /// record for that version wholesale
    pub fn write(&self, lock: &CacheLock, record: &DeploymentRecord) -> Result<(), ScriptError> {
        let tag = lock.tag;
        let path = self.path_of(tag);
        if lock.artifact != path {
            return Err(ScriptError::CacheWrite(format!(
                "lock {} does not guard {}",
                lock.path.display(),
                path.display()
            )));
        }

        if path.exists() {
            warn!("overwriting existing {} cache artifact at {}", tag, path.display());
        }

        let contents =
            serde_json::to_string(record).map_err(|e| ScriptError::CacheWrite(e.to_string()))?;
        write_atomic(&path, contents.as_bytes())
            .map_err(|e| ScriptError::CacheWrite(e.to_string()))?;

        debug!("wrote {} cache artifact to {}", tag, path.display());
        Ok(())
    }

    /// Remove the record for the given version, if any
    pub fn remove(&self, tag: VersionTag) -> Result<(), ScriptError> {
        let path = self.path_of(tag);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScriptError::CacheWrite(e.to_string())),
        }
    }
}

/// An exclusive lock on a single cache artifact, released on drop
#[derive(Debug)]
pub struct CacheLock {
    /// The version the lock guards
    tag: VersionTag,
    /// The path of the guarded artifact
    artifact: PathBuf,
    /// The path of the lock file
    path: PathBuf,
}

impl CacheLock {
    /// Take the lock for the artifact at `artifact`, failing if another run
    /// already holds it
    fn acquire(tag: VersionTag, artifact: PathBuf) -> Result<Self, ScriptError> {
        let path = sibling_with_extension(&artifact, LOCK_FILE_EXTENSION);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(Self {
                tag,
                artifact,
                path,
            }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                warn!(
                    "{} is held by another run; if none is active, delete it and retry",
                    path.display()
                );
                Err(ScriptError::CacheLocked(path))
            }
            Err(e) => Err(ScriptError::CacheWrite(e.to_string())),
        }
    }

    /// The version the lock guards
    pub fn tag(&self) -> VersionTag {
        self.tag
    }
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("failed to release cache lock {}: {}", self.path.display(), e);
        }
    }
}

/// Write `contents` to a sibling of `path`, then rename it into place, so a
/// crash never leaves a truncated file behind
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let tmp_path = sibling_with_extension(path, TMP_FILE_EXTENSION);
    let mut tmp_file = File::create(&tmp_path)?;
    tmp_file.write_all(contents)?;
    tmp_file.sync_all()?;
    fs::rename(&tmp_path, path)
}

/// `path` with `ext` appended to its full file name, e.g. `a.json` -> `a.json.lock`
fn sibling_with_extension(path: &Path, ext: &str) -> PathBuf {
    let mut file_name = path.file_name().unwrap_or_default().to_os_string();
    file_name.push(".");
    file_name.push(ext);
    path.with_file_name(file_name)
}
