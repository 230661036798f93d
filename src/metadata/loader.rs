//! Class loaders and the dependency edges between them.
//!
//! Loaders form a tree through their parent links, with the bootstrap loader at the root. Next
//! to the static parent chain every loader carries an append-only [`DependencyList`] recording
//! the other loaders whose classes it has observed. An edge is recorded the first time a class
//! defined by one loader references a class defined by another, unless the referenced loader is
//! already an ancestor of the referencing one.
//!
//! # Thread Safety
//!
//! Readers of a dependency list never lock: the list is a [`boxcar::Vec`] whose elements, once
//! pushed, are never removed or reordered, so a concurrent reader sees a prefix of what a writer
//! sees. Appends are serialized per list and re-check for duplicates after acquiring the lock.

use std::{fmt, sync::Arc, sync::Mutex};

use tracing::trace;

/// Identifier of a class loader, the index into the [`LoaderRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoaderId(pub u32);

impl LoaderId {
    /// The bootstrap loader, root of every parent chain
    pub const BOOTSTRAP: LoaderId = LoaderId(0);

    /// Returns `true` for the bootstrap loader
    #[must_use]
    pub fn is_bootstrap(&self) -> bool {
        *self == LoaderId::BOOTSTRAP
    }
}

impl fmt::Display for LoaderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_bootstrap() {
            write!(f, "bootstrap")
        } else {
            write!(f, "loader#{}", self.0)
        }
    }
}

/// Append-only list of loaders observed by its owner.
pub struct DependencyList {
    edges: boxcar::Vec<LoaderId>,
    append_lock: Mutex<()>,
}

impl DependencyList {
    /// Creates an empty list
    #[must_use]
    pub fn new() -> Self {
        DependencyList {
            edges: boxcar::Vec::new(),
            append_lock: Mutex::new(()),
        }
    }

    /// Returns `true` if `loader` has been recorded
    #[must_use]
    pub fn contains(&self, loader: LoaderId) -> bool {
        self.edges.iter().any(|(_, edge)| *edge == loader)
    }

    /// Appends `loader` unless present, returns whether it was added
    pub fn add(&self, loader: LoaderId) -> bool {
        if self.contains(loader) {
            return false;
        }

        let _guard = lock!(self.append_lock);
        // Another thread may have appended the same edge between the scan and the lock
        if self.contains(loader) {
            return false;
        }
        self.edges.push(loader);
        true
    }

    /// Snapshot of the recorded edges in insertion order
    #[must_use]
    pub fn edges(&self) -> Vec<LoaderId> {
        self.edges.iter().map(|(_, edge)| *edge).collect()
    }

    /// Number of recorded edges
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.count()
    }

    /// Returns `true` if nothing has been recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

impl Default for DependencyList {
    fn default() -> Self {
        Self::new()
    }
}

/// A class loader known to the runtime.
pub struct ClassLoader {
    /// Name used in diagnostics, e.g. `app`
    pub name: String,
    /// Parent in the delegation chain, `None` only for the bootstrap loader
    pub parent: Option<LoaderId>,
    /// Loaders whose classes this loader has observed
    pub dependencies: DependencyList,
}

/// Reference-counted [`ClassLoader`]
pub type ClassLoaderRc = Arc<ClassLoader>;

/// All loaders of a runtime, indexed by [`LoaderId`].
pub struct LoaderRegistry {
    loaders: boxcar::Vec<ClassLoaderRc>,
}

impl LoaderRegistry {
    /// Creates a registry containing only the bootstrap loader
    #[must_use]
    pub fn new() -> Self {
        let loaders = boxcar::Vec::new();
        loaders.push(Arc::new(ClassLoader {
            name: "bootstrap".to_string(),
            parent: None,
            dependencies: DependencyList::new(),
        }));
        LoaderRegistry { loaders }
    }

    /// Registers a new loader delegating to `parent`.
    ///
    /// ## Arguments
    /// * `name`   - Diagnostic name of the loader
    /// * `parent` - The loader to delegate to, must already be registered
    pub fn create(&self, name: &str, parent: LoaderId) -> LoaderId {
        let index = self.loaders.push(Arc::new(ClassLoader {
            name: name.to_string(),
            parent: Some(parent),
            dependencies: DependencyList::new(),
        }));
        LoaderId(index as u32)
    }

    /// Looks up a loader
    #[must_use]
    pub fn get(&self, id: LoaderId) -> Option<&ClassLoaderRc> {
        self.loaders.get(id.0 as usize)
    }

    /// Diagnostic name of a loader, `<unknown>` for ids not in this registry
    #[must_use]
    pub fn name_of(&self, id: LoaderId) -> &str {
        self.get(id).map_or("<unknown>", |loader| loader.name.as_str())
    }

    /// Number of registered loaders, including the bootstrap loader
    #[must_use]
    pub fn len(&self) -> usize {
        self.loaders.count()
    }

    /// Always `false`, the bootstrap loader is always present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    /// The delegation chain of `id`: the loader itself, then its parents up to the bootstrap
    /// loader.
    #[must_use]
    pub fn chain(&self, id: LoaderId) -> Vec<LoaderId> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(loader) = current {
            if chain.contains(&loader) {
                break;
            }
            chain.push(loader);
            current = self.get(loader).and_then(|entry| entry.parent);
        }
        chain
    }

    /// Returns `true` if `ancestor` is `loader` or one of its parents
    #[must_use]
    pub fn is_ancestor(&self, ancestor: LoaderId, loader: LoaderId) -> bool {
        self.chain(loader).contains(&ancestor)
    }

    /// Records that classes of `from` observed a class defined by `to`.
    ///
    /// Nothing is recorded when either side is the bootstrap loader (it is never unloaded), when
    /// both are the same loader, or when `to` is already on the parent chain of `from`.
    ///
    /// Returns `true` if a new edge was appended.
    pub fn record_dependency(&self, from: LoaderId, to: LoaderId) -> bool {
        if from == to || from.is_bootstrap() || to.is_bootstrap() {
            return false;
        }
        if self.is_ancestor(to, from) {
            return false;
        }
        let Some(loader) = self.get(from) else {
            return false;
        };

        let added = loader.dependencies.add(to);
        if added {
            trace!(from = %from, to = %to, "recorded loader dependency");
        }
        added
    }

    /// Snapshot of the dependency edges of `id`
    #[must_use]
    pub fn dependencies(&self, id: LoaderId) -> Vec<LoaderId> {
        self.get(id)
            .map(|loader| loader.dependencies.edges())
            .unwrap_or_default()
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
