//! Infrastructure implementation of the `RegistryStore` port.
//!
//! Layout under the registry directory:
//!
//! ```text
//! fleet.json         index: current selection + ordered names
//! apps/<name>.json   one full record per application
//! ```
//!
//! Every write goes to a temp file in the destination directory (mode 0600)
//! and is renamed over the target, so readers never see a partial file.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use appfleet_common::{Application, ApplicationDefaults, RegistryIndex};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::application::ports::RegistryStore;

const INDEX_FILE: &str = "fleet.json";
const RECORDS_DIR: &str = "apps";

/// JSON-file registry rooted at one directory.
pub struct FileRegistry {
    root: PathBuf,
    defaults: ApplicationDefaults,
    placeholder: String,
}

impl FileRegistry {
    /// `defaults` shape first-touch records; `placeholder` names the single
    /// application of a fresh index.
    #[must_use]
    pub fn new(root: PathBuf, defaults: ApplicationDefaults, placeholder: &str) -> Self {
        Self {
            root,
            defaults,
            placeholder: placeholder.to_string(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(RECORDS_DIR).join(format!("{name}.json"))
    }
}

impl RegistryStore for FileRegistry {
    fn load_index(&self) -> Result<RegistryIndex> {
        let path = self.index_path();
        let mut index = if path.exists() {
            read_json::<RegistryIndex>(&path)?
        } else {
            RegistryIndex::with_placeholder(&self.placeholder)
        };
        index.normalize(&self.placeholder);
        Ok(index)
    }

    fn save_index(&self, index: &RegistryIndex) -> Result<()> {
        write_json_atomic(&self.index_path(), index)
    }

    fn load_application(&self, name: &str) -> Result<Application> {
        let path = self.record_path(name);
        if path.exists() {
            read_json(&path)
        } else {
            tracing::debug!(app = name, "no record on disk, using defaults");
            Ok(Application::with_defaults(name, &self.defaults))
        }
    }

    fn has_application(&self, name: &str) -> bool {
        self.record_path(name).is_file()
    }

    fn save_application(&self, app: &Application) -> Result<()> {
        write_json_atomic(&self.record_path(&app.name), app)
    }

    fn remove_application(&self, name: &str) -> Result<bool> {
        let path = self.record_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing record {}", path.display())),
        }
    }

    fn files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let index = self.index_path();
        if index.is_file() {
            files.push(index);
        }
        let records = self.root.join(RECORDS_DIR);
        if records.is_dir() {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(&records)
                .with_context(|| format!("reading {}", records.display()))?
            {
                let path = entry
                    .with_context(|| format!("reading {}", records.display()))?
                    .path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    entries.push(path);
                }
            }
            entries.sort();
            files.extend(entries);
        }
        Ok(files)
    }

    fn directories(&self) -> Vec<PathBuf> {
        [self.root.clone(), self.root.join(RECORDS_DIR)]
            .into_iter()
            .filter(|dir| dir.is_dir())
            .collect()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("{} has no parent directory", path.display()))?;
    create_private_dir(dir)?;

    let mut content = serde_json::to_vec_pretty(value).context("serializing registry entry")?;
    content.push(b'\n');

    // NamedTempFile is created 0600 on unix.
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    tmp.write_all(&content)
        .with_context(|| format!("writing temp file for {}", path.display()))?;
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing temp file for {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("finalizing {}", path.display()))?;
    Ok(())
}

/// Create `dir` (and missing parents) with mode 0700; an existing directory
/// is left as is.
pub(crate) fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
            .with_context(|| format!("creating directory {}", dir.display()))
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))
    }
}
