//! Handler discovery and the out-of-process wire protocol.
//!
//! A handler is any executable file in a search directory that answers the
//! `list` subcommand with one scheme per line. Everything else the engine
//! needs from a handler — `get`, `set`, `node`, `incoming`, `outgoing` — is
//! invoked as a fresh subprocess per call, per the wire protocol table.

pub(crate) mod invoke;

pub use invoke::{Declared, HandlerOutcome};

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::RegistryError;
use crate::uri::Uri;

/// The default handler search path, relative to the working directory.
pub const DEFAULT_HANDLER_DIR: &str = "./modules";

/// Apply-phase `set` calls are allowed this long before being treated as a
/// per-node failure. `list`/`node`/`get` have no timeout.
pub const SET_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// One discovered handler executable.
#[derive(Debug, Clone)]
pub struct Handler {
    pub path: PathBuf,
}

/// Schemes indexed to the handler that claims them.
#[derive(Debug, Default)]
pub struct Registry {
    by_scheme: HashMap<String, Handler>,
}

impl Registry {
    /// Walks each search directory, probing every regular executable file
    /// with `list`. Files that fail to spawn or exit non-zero are skipped
    /// silently (not every file in a handler directory need be a handler);
    /// a scheme claimed twice is a hard startup error.
    pub async fn discover(search_paths: &[PathBuf]) -> Result<Self, RegistryError> {
        let mut by_scheme: HashMap<String, Handler> = HashMap::new();

        for dir in search_paths {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(_) => continue,
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if !is_executable_file(&path) {
                    continue;
                }
                let schemes = match invoke::list_schemes(&path).await {
                    Ok(schemes) => schemes,
                    Err(_) => continue,
                };
                for scheme in schemes {
                    if let Some(existing) = by_scheme.get(&scheme) {
                        return Err(RegistryError::DuplicateHandler {
                            scheme,
                            first: existing.path.display().to_string(),
                            second: path.display().to_string(),
                        });
                    }
                    by_scheme.insert(
                        scheme,
                        Handler {
                            path: path.clone(),
                        },
                    );
                }
            }
        }

        Ok(Registry { by_scheme })
    }

    /// Looks up the handler registered for a scheme.
    pub fn for_scheme(&self, scheme: &str) -> Option<&Handler> {
        self.by_scheme.get(scheme)
    }

    /// Looks up the handler registered for a node's URI.
    pub fn for_uri(&self, uri: &Uri) -> Option<&Handler> {
        self.for_scheme(uri.scheme())
    }
}

fn is_executable_file(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    metadata.is_file() && metadata.permissions().mode() & 0o111 != 0
}
