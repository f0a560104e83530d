//! Target manifest (`podwire.toml`).
//!
//! ```toml
//! [[targets]]
//! name = "Pods-App"
//! product_basename = "Pods_App"
//! links_as_framework = true
//! copy_resources_script = "Target Support Files/Pods-App/Pods-App-resources.sh"
//! project = "App.xcodeproj"
//! consumers = ["App", "AppTests"]
//! ```
//!
//! Relative project paths are resolved against the manifest's directory.

use podwire_core::Target;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Manifest not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read manifest {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Manifest {} declares no targets", path.display())]
    Empty { path: PathBuf },

    #[error("Manifest {} declares target `{name}` more than once", path.display())]
    DuplicateTarget { path: PathBuf, name: String },
}

#[derive(Debug, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    targets: Vec<Target>,
}

/// Targets to integrate, in declaration order.
#[derive(Debug)]
pub struct Manifest {
    pub path: PathBuf,
    pub targets: Vec<Target>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ManifestError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ManifestError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ManifestError> {
        let file: ManifestFile = toml::from_str(content).map_err(|source| ManifestError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if file.targets.is_empty() {
            return Err(ManifestError::Empty {
                path: path.to_path_buf(),
            });
        }

        let mut seen = HashSet::new();
        for target in &file.targets {
            if !seen.insert(target.name.as_str()) {
                return Err(ManifestError::DuplicateTarget {
                    path: path.to_path_buf(),
                    name: target.name.clone(),
                });
            }
        }

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let targets = file
            .targets
            .into_iter()
            .map(|mut target| {
                if target.project_path.is_relative() {
                    target.project_path = base.join(&target.project_path);
                }
                target
            })
            .collect();

        tracing::debug!("Loaded manifest {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            targets,
        })
    }
}
