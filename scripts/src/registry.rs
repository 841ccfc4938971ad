//! The named deployment registry, mapping deployment names to proxy &
//! implementation addresses across script runs

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use tracing::info;

use crate::{cache::write_atomic, errors::ScriptError, types::NamedDeployment};

/// A store of [`NamedDeployment`]s, optionally persisted to a JSON file.
///
/// The registry is passed explicitly into every step that reads or writes it,
/// so callers control its lifecycle (e.g. resetting it between test runs).
#[derive(Clone, Debug, Default)]
pub struct DeploymentRegistry {
    /// The registered deployments, by name
    entries: BTreeMap<String, NamedDeployment>,
    /// The file the registry is persisted to, if any
    path: Option<PathBuf>,
}

impl DeploymentRegistry {
    /// A registry that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the registry persisted at `path`, starting empty if the file does not exist
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ScriptError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                ScriptError::ReadDeployments(format!("{}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(ScriptError::ReadDeployments(format!("{}: {}", path.display(), e)))
            }
        };

        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    /// The file backing this registry, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Register `deployment` under `name`, replacing any previous entry.
    ///
    /// The entry is only visible once it has been persisted.
    pub fn save(&mut self, name: &str, deployment: NamedDeployment) -> Result<(), ScriptError> {
        info!(
            "registering {}: address {:#x}, impl {:#x}",
            name, deployment.address, deployment.implementation
        );

        let mut entries = self.entries.clone();
        entries.insert(name.to_string(), deployment);
        self.persist(&entries)?;

        self.entries = entries;
        Ok(())
    }

    /// Look up the deployment registered under `name`
    pub fn get(&self, name: &str) -> Result<&NamedDeployment, ScriptError> {
        self.entries.get(name).ok_or_else(|| {
            ScriptError::UnknownDeployment(format!(
                "{} (registered: [{}])",
                name,
                self.entries.keys().join(", ")
            ))
        })
    }

    /// The names of all registered deployments
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Forget every registered deployment, including the persisted ones
    pub fn reset(&mut self) -> Result<(), ScriptError> {
        self.entries.clear();
        match &self.path {
            Some(path) => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ScriptError::WriteDeployments(e.to_string())),
            },
            None => Ok(()),
        }
    }

    /// Write `entries` to the registry's backing file, if it has one
    fn persist(&self, entries: &BTreeMap<String, NamedDeployment>) -> Result<(), ScriptError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
        write_atomic(path, contents.as_bytes())
            .map_err(|e| ScriptError::WriteDeployments(format!("{}: {}", path.display(), e)))
    }
}
