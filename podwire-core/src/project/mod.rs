//! Project graph capability interface and its persisted implementation.
//!
//! The managers and the integrator only talk to a graph through
//! [`ProjectGraph`] and obtain one through a [`GraphOpener`]. [`PbxProject`]
//! implements both sides for the JSON encoding of a `project.pbxproj` object
//! table.
//!
//! # Architecture
//!
//! ```text
//! project.pbxproj (object table) <-> PbxProject (typed nodes, phases, products group)
//!                                        ^
//!                                        | ProjectGraph
//!                      reference / phases managers, TargetIntegrator
//! ```

mod model;
mod pbxproj;

pub use model::{
    BuildFile, BuildPhase, Fields, FileReference, FrameworksPhase, GroupChild, Node, OpaquePhase,
    ReferenceGroup, ShellScriptPhase,
};
pub use pbxproj::{PbxProject, PbxprojOpener, ROOT_DESCRIPTOR};

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::target::{ProductType, Target};

/// Narrow view of a loaded project graph.
///
/// Implementors provide storage access; lookups and mutations that only need
/// that access are provided methods.
pub trait ProjectGraph {
    /// Project directory the graph was opened from.
    fn path(&self) -> &Path;

    /// Every consuming node, in project order.
    fn nodes(&self) -> &[Node];

    fn nodes_mut(&mut self) -> &mut [Node];

    /// The shared group holding product references.
    fn reference_group(&self) -> &ReferenceGroup;

    fn reference_group_mut(&mut self) -> &mut ReferenceGroup;

    /// A fresh object id, unused anywhere in the graph.
    fn generate_id(&mut self) -> String;

    /// Delete build files outside the typed frameworks phases that point at
    /// `file_ref`, and drop them from every phase listing them. Returns how
    /// many were deleted.
    fn purge_build_files(&mut self, file_ref: &str) -> usize;

    /// Serialize the whole graph back to disk.
    fn save(&self) -> Result<()>;

    /// Bump the root descriptor's modification time without changing it.
    fn touch(&self) -> Result<()>;

    /// File whose modification time consumers watch.
    fn root_descriptor(&self) -> PathBuf {
        self.path().join(ROOT_DESCRIPTOR)
    }

    fn node(&self, name: &str) -> Option<&Node> {
        self.nodes().iter().find(|node| node.name == name)
    }

    fn node_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.nodes_mut().iter_mut().find(|node| node.name == name)
    }

    /// Names of the target's consumers that exist in this graph, in the
    /// target's order and without duplicates.
    fn find_nodes_for_target(&self, target: &Target) -> Vec<String> {
        let mut names: Vec<String> = Vec::with_capacity(target.consumers.len());
        for name in &target.consumers {
            if names.contains(name) {
                continue;
            }
            if self.node(name).is_some() {
                names.push(name.clone());
            } else {
                tracing::warn!(
                    "Consumer `{}` of target `{}` not found in {}",
                    name,
                    target.name,
                    self.path().display()
                );
            }
        }
        names
    }

    fn find_reference_by_path(&self, path: &str) -> Option<&FileReference> {
        self.reference_group().find_by_path(path)
    }

    /// Create a product reference in the reference group and return its id.
    fn add_reference(&mut self, basename: &str, product_type: ProductType) -> String {
        let id = self.generate_id();
        let reference = FileReference::new_product(id.clone(), basename, product_type);
        tracing::debug!("Adding product reference {} ({})", reference.path, id);
        self.reference_group_mut().push(reference);
        id
    }

    /// Remove the reference with `path` from the group, together with every
    /// build file in any phase that points at it.
    fn remove_reference(&mut self, path: &str) -> Option<FileReference> {
        let reference = self.reference_group_mut().remove_by_path(path)?;
        let mut purged = 0;
        for node in self.nodes_mut() {
            for phase in &mut node.phases {
                if let BuildPhase::Frameworks(frameworks) = phase {
                    purged += frameworks.remove_reference(&reference.id);
                }
            }
        }
        purged += self.purge_build_files(&reference.id);
        tracing::debug!(
            "Removed product reference {} ({}) and {} build file(s)",
            path,
            reference.id,
            purged
        );
        Some(reference)
    }

    /// Append `phase` to the node's phase list. Returns `false` when the node
    /// does not exist.
    fn add_phase(&mut self, node: &str, phase: BuildPhase) -> bool {
        match self.node_mut(node) {
            Some(node) => {
                node.phases.push(phase);
                true
            }
            None => false,
        }
    }

    /// Make `phase` the node's first phase. Returns `false` when the node does
    /// not exist.
    fn insert_phase_at_front(&mut self, node: &str, phase: BuildPhase) -> bool {
        match self.node_mut(node) {
            Some(node) => {
                node.phases.insert(0, phase);
                true
            }
            None => false,
        }
    }

    /// The node's frameworks phase (the first one, should there be several).
    fn frameworks_phase(&self, node: &str) -> Option<&FrameworksPhase> {
        self.node(node)?
            .phases
            .iter()
            .find_map(BuildPhase::as_frameworks)
    }

    fn frameworks_phase_mut(&mut self, node: &str) -> Option<&mut FrameworksPhase> {
        self.node_mut(node)?
            .phases
            .iter_mut()
            .find_map(|phase| match phase {
                BuildPhase::Frameworks(frameworks) => Some(frameworks),
                _ => None,
            })
    }

    /// Shell-script phases of the node named `name`.
    fn shell_script_phases(&self, node: &str, name: &str) -> Vec<&ShellScriptPhase> {
        match self.node(node) {
            Some(node) => node
                .phases
                .iter()
                .filter_map(BuildPhase::as_shell_script)
                .filter(|phase| phase.is_named(name))
                .collect(),
            None => Vec::new(),
        }
    }

    fn shell_script_phases_mut(&mut self, node: &str, name: &str) -> Vec<&mut ShellScriptPhase> {
        match self.node_mut(node) {
            Some(node) => node
                .phases
                .iter_mut()
                .filter_map(|phase| match phase {
                    BuildPhase::ShellScript(script) if script.is_named(name) => Some(script),
                    _ => None,
                })
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Loads project graphs from disk.
pub trait GraphOpener {
    type Graph: ProjectGraph;

    fn open(&self, path: &Path) -> Result<Self::Graph>;
}
