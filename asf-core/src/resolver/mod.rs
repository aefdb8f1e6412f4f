//! Dependency resolution.
//!
//! A module is decoded, its dependencies are loaded depth-first in table
//! order, and only then is it linked. Every module is linked at most once per
//! resolver; later requests share the cached instance.

mod source;

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

use bytes::Bytes;

pub use source::{FsSource, MemorySource, ModuleSource};

use crate::format::{AsfContainer, FormatError};
use crate::vm::{LinkError, ModuleLinker};

#[derive(thiserror::Error, Debug)]
pub enum ResolveError {
    #[error("module {name:?} not found at {}{}", .path.display(), hint_suffix(.hint))]
    ModuleNotFound {
        name: String,
        path: PathBuf,
        hint: Option<String>,
    },

    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("module {name:?} is not a valid container")]
    Malformed {
        name: String,
        #[source]
        source: FormatError,
    },

    #[error(transparent)]
    Link(#[from] LinkError),

    #[error("dependency cycle: {}", .chain.join(" -> "))]
    DependencyCycle { chain: Vec<String> },
}

fn hint_suffix(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|hint| format!(" ({})", hint))
        .unwrap_or_default()
}

/// A linked module together with the container it came from.
#[derive(Debug)]
pub struct LoadedModule<T> {
    pub name: String,
    /// Dependency table of the container, in table order.
    pub dependencies: Vec<String>,
    /// Same names as `dependencies`, but only filled for the module a caller
    /// asked to collect; empty for modules pulled in as dependencies.
    pub direct_dependencies: Vec<String>,
    pub code: Bytes,
    pub symbols: T,
}

impl<T> LoadedModule<T> {
    /// Re-encode the container this module was loaded from.
    pub fn to_container(&self) -> AsfContainer {
        AsfContainer::new(self.dependencies.clone(), self.code.clone())
    }
}

pub struct ModuleResolver<S, L: ModuleLinker> {
    source: S,
    linker: L,
    modules: HashMap<String, Rc<LoadedModule<L::Symbols>>>,
    // names currently being loaded, outermost first
    loading: Vec<String>,
}

impl<S: ModuleSource, L: ModuleLinker> ModuleResolver<S, L> {
    pub fn new(source: S, linker: L) -> Self {
        Self {
            source,
            linker,
            modules: HashMap::new(),
            loading: Vec::new(),
        }
    }

    pub fn linker(&self) -> &L {
        &self.linker
    }

    /// Modules linked so far.
    pub fn loaded(&self) -> usize {
        self.modules.len()
    }

    pub fn get(&self, name: &str) -> Option<Rc<LoadedModule<L::Symbols>>> {
        self.modules.get(name).cloned()
    }

    /// Load `name` and everything it depends on.
    ///
    /// With `collect_direct`, the returned module lists its own dependency
    /// names in `direct_dependencies`. A module that is already cached comes
    /// back as is. Names collected before a failure are dropped with the
    /// error; use [`resolve_into`](Self::resolve_into) to keep them.
    pub fn resolve(
        &mut self,
        name: &str,
        collect_direct: bool,
    ) -> Result<Rc<LoadedModule<L::Symbols>>, ResolveError> {
        let mut direct = Vec::new();
        self.load(name, collect_direct.then_some(&mut direct))
    }

    /// Like [`resolve`](Self::resolve), appending the direct dependency names
    /// to `direct` before each one is loaded. On failure `direct` keeps the names
    /// pushed so far; the last one is the dependency whose load failed.
    pub fn resolve_into(
        &mut self,
        name: &str,
        direct: &mut Vec<String>,
    ) -> Result<Rc<LoadedModule<L::Symbols>>, ResolveError> {
        self.load(name, Some(direct))
    }

    fn load(
        &mut self,
        name: &str,
        mut direct: Option<&mut Vec<String>>,
    ) -> Result<Rc<LoadedModule<L::Symbols>>, ResolveError> {
        if let Some(module) = self.modules.get(name) {
            log::debug!("{} already loaded", name);
            return Ok(Rc::clone(module));
        }
        if self.loading.iter().any(|loading| loading == name) {
            let mut chain = self.loading.clone();
            chain.push(name.to_string());
            return Err(ResolveError::DependencyCycle { chain });
        }

        let data = self.source.read(name)?;
        let container = AsfContainer::decode(data).map_err(|source| ResolveError::Malformed {
            name: name.to_string(),
            source,
        })?;
        log::info!(
            "loading {} ({} dependencies, {} code bytes)",
            name,
            container.dependencies.len(),
            container.code.len()
        );

        let collect = direct.is_some();
        self.loading.push(name.to_string());
        let result = self.load_dependencies(name, &container.dependencies, direct.as_deref_mut());
        self.loading.pop();
        result?;

        let symbols = self.linker.link(name, &container.code)?;
        let module = Rc::new(LoadedModule {
            name: name.to_string(),
            direct_dependencies: if collect {
                container.dependencies.clone()
            } else {
                Vec::new()
            },
            dependencies: container.dependencies,
            code: container.code,
            symbols,
        });
        self.modules.insert(name.to_string(), Rc::clone(&module));
        Ok(module)
    }

    fn load_dependencies(
        &mut self,
        name: &str,
        dependencies: &[String],
        mut direct: Option<&mut Vec<String>>,
    ) -> Result<(), ResolveError> {
        for dependency in dependencies {
            log::debug!("{} depends on {}", name, dependency);
            if let Some(direct) = direct.as_deref_mut() {
                direct.push(dependency.clone());
            }
            self.load(dependency, None)?;
        }
        Ok(())
    }
}
