use std::env;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Remapped standard-library source prefix baked into release toolchains.
const RUSTC_SOURCE_PREFIX: &str = "/rustc/";

/// Installed-library path prefixes.
///
/// A frame whose `file` starts with any of these prefixes is library code
/// rather than application code. The process-wide set is resolved once and
/// read-only afterwards; resolution faults shrink the set (capturing more)
/// instead of failing the capture.
#[derive(Debug, Clone, Default)]
pub struct LibraryRoots {
    prefixes: Vec<String>,
}

impl LibraryRoots {
    /// Derive the library roots from the runtime's own installation layout.
    pub fn resolve() -> Self {
        let mut prefixes = vec![RUSTC_SOURCE_PREFIX.to_owned()];

        match cargo_home() {
            Some(cargo) => {
                prefixes.push(join_prefix(&cargo, &["registry", "src"]));
                prefixes.push(join_prefix(&cargo, &["git", "checkouts"]));
            }
            None => warn!("cargo home not found; registry frames will not be filtered"),
        }

        match rustup_home() {
            Some(rustup) => prefixes.push(join_prefix(&rustup, &["toolchains"])),
            None => debug!("rustup home not found; toolchain frames will not be filtered"),
        }

        debug!(roots = prefixes.len(), "resolved library roots");
        Self { prefixes }
    }

    /// Explicit prefix set, for tests and for installation layers that know
    /// their own layout.
    pub fn from_prefixes<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// The process-wide set, resolved on first use and never mutated after.
    pub fn process() -> &'static LibraryRoots {
        static PROCESS_ROOTS: OnceLock<LibraryRoots> = OnceLock::new();
        PROCESS_ROOTS.get_or_init(LibraryRoots::resolve)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Prefix test against the path exactly as the runtime reported it.
    pub fn is_library_path(&self, file: &str) -> bool {
        self.prefixes
            .iter()
            .any(|prefix| file.starts_with(prefix.as_str()))
    }
}

fn cargo_home() -> Option<PathBuf> {
    env::var_os("CARGO_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".cargo")))
}

fn rustup_home() -> Option<PathBuf> {
    env::var_os("RUSTUP_HOME")
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(".rustup")))
}

fn home_dir() -> Option<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    env::var_os(var).map(PathBuf::from)
}

fn join_prefix(base: &Path, parts: &[&str]) -> String {
    let mut path = base.to_path_buf();
    for part in parts {
        path.push(part);
    }
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_hit_is_library() {
        let roots = LibraryRoots::from_prefixes(["/opt/rust/registry/src"]);
        assert!(roots.is_library_path("/opt/rust/registry/src/serde-1.0.0/src/lib.rs"));
        assert!(!roots.is_library_path("/srv/app/src/main.rs"));
    }

    #[test]
    fn empty_set_keeps_everything() {
        let roots = LibraryRoots::from_prefixes(Vec::<String>::new());
        assert!(roots.is_empty());
        assert!(!roots.is_library_path("/rustc/abc123/library/std/src/panic.rs"));
    }

    #[test]
    fn resolve_always_includes_the_rustc_prefix() {
        let roots = LibraryRoots::resolve();
        assert!(roots.prefixes().iter().any(|p| p == RUSTC_SOURCE_PREFIX));
        assert!(roots.is_library_path("/rustc/abc123/library/core/src/option.rs"));
    }

    #[test]
    fn process_set_is_resolved_once() {
        let first: *const LibraryRoots = LibraryRoots::process();
        let second: *const LibraryRoots = LibraryRoots::process();
        assert_eq!(first, second);
    }
}
