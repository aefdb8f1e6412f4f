use std::collections::HashMap;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use super::ResolveError;

/// Extensions of compressed copies that are worth pointing out when a module is missing.
const COMPRESSED_EXTENSIONS: [&str; 2] = ["zst", "gz"];

/// Where container bytes come from.
pub trait ModuleSource {
    /// Read the whole container stored under a module name.
    fn read(&self, name: &str) -> Result<Vec<u8>, ResolveError>;
}

/// Containers stored as plain files under a data root.
///
/// Module names are relative paths; a leading `/` is tolerated.
#[derive(Debug, Clone)]
pub struct FsSource {
    base_path: PathBuf,
}

impl FsSource {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub fn module_path(&self, name: &str) -> PathBuf {
        self.base_path
            .join(name.trim_start_matches(|c: char| c == '/' || c == '\\'))
    }

    fn not_found(&self, name: &str, path: PathBuf) -> ResolveError {
        let hint = COMPRESSED_EXTENSIONS.iter().find_map(|ext| {
            let mut sibling = path.clone().into_os_string();
            sibling.push(".");
            sibling.push(ext);
            let sibling = PathBuf::from(sibling);
            sibling
                .is_file()
                .then(|| format!("{} exists, decompress it first", sibling.display()))
        });
        ResolveError::ModuleNotFound {
            name: name.to_string(),
            path,
            hint,
        }
    }
}

impl ModuleSource for FsSource {
    /// we assume containers are small enough to load whole
    fn read(&self, name: &str) -> Result<Vec<u8>, ResolveError> {
        let path = self.module_path(name);
        if !path.is_file() {
            return Err(self.not_found(name, path));
        }

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(self.not_found(name, path)),
            Err(source) => return Err(ResolveError::Io { path, source }),
        };
        let mut buffer = vec![];
        file.read_to_end(&mut buffer)
            .map_err(|source| ResolveError::Io {
                path: path.clone(),
                source,
            })?;
        log::debug!("read {} ({} bytes)", path.display(), buffer.len());
        Ok(buffer)
    }
}

/// Containers held in memory, keyed by module name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    modules: HashMap<String, Vec<u8>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> &mut Self {
        self.modules.insert(name.into(), data.into());
        self
    }
}

impl ModuleSource for MemorySource {
    fn read(&self, name: &str) -> Result<Vec<u8>, ResolveError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::ModuleNotFound {
                name: name.to_string(),
                path: PathBuf::from(name),
                hint: None,
            })
    }
}
