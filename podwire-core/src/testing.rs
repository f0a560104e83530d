//! In-memory graph shared by unit tests.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::project::{BuildPhase, Node, ProjectGraph, ReferenceGroup};
use crate::target::Target;

/// Graph with a single `App` node, kept entirely in memory.
pub(crate) struct MemoryGraph {
    pub nodes: Vec<Node>,
    pub group: ReferenceGroup,
    next_id: usize,
}

impl MemoryGraph {
    pub fn with_node(phases: Vec<BuildPhase>) -> Self {
        Self {
            nodes: vec![Node {
                id: "APP".to_string(),
                name: "App".to_string(),
                phases,
                fields: Default::default(),
            }],
            group: ReferenceGroup {
                id: "PRODUCTS".to_string(),
                children: Vec::new(),
                fields: Default::default(),
            },
            next_id: 0,
        }
    }

    pub fn phase_names(&self) -> Vec<String> {
        self.nodes[0]
            .phases
            .iter()
            .map(BuildPhase::display_name)
            .collect()
    }
}

impl ProjectGraph for MemoryGraph {
    fn path(&self) -> &Path {
        Path::new("App.xcodeproj")
    }

    fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    fn reference_group(&self) -> &ReferenceGroup {
        &self.group
    }

    fn reference_group_mut(&mut self) -> &mut ReferenceGroup {
        &mut self.group
    }

    fn generate_id(&mut self) -> String {
        self.next_id += 1;
        format!("ID{}", self.next_id)
    }

    fn purge_build_files(&mut self, _file_ref: &str) -> usize {
        0
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }

    fn touch(&self) -> Result<()> {
        Ok(())
    }
}

/// The `MathKit` target consumed by `App`.
pub(crate) fn math_kit(links_as_framework: bool, script: &str) -> Target {
    Target {
        name: "MathKit".to_string(),
        product_basename: "MathKit".to_string(),
        links_as_framework,
        copy_resources_script: script.to_string(),
        project_path: PathBuf::from("App.xcodeproj"),
        consumers: vec!["App".to_string()],
    }
}
