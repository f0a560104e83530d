//! Inspect command - Show a project's targets, phases and product references

use crate::output::{Output, OutputConfig, TableDisplay};
use anyhow::Result;
use colored::Colorize;
use podwire_core::project::{BuildPhase, ReferenceGroup};
use podwire_core::{PbxProject, ProjectGraph};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct PhaseInfo {
    pub id: String,
    pub isa: String,
    pub name: String,
    /// Paths linked by a frameworks phase.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeInfo {
    pub id: String,
    pub name: String,
    pub isa: String,
    pub phases: Vec<PhaseInfo>,
}

#[derive(Debug, Serialize)]
pub struct ProductInfo {
    pub id: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectInfo {
    pub project: String,
    pub nodes: Vec<NodeInfo>,
    pub products: Vec<ProductInfo>,
}

impl ProjectInfo {
    pub fn from_graph<G: ProjectGraph + ?Sized>(graph: &G) -> Self {
        let group = graph.reference_group();
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| NodeInfo {
                id: node.id.clone(),
                name: node.name.clone(),
                isa: node.isa().to_string(),
                phases: node.phases.iter().map(|p| phase_info(p, group)).collect(),
            })
            .collect();
        let products = group
            .references()
            .map(|reference| ProductInfo {
                id: reference.id.clone(),
                path: reference.path.clone(),
                file_type: reference.file_type().map(str::to_string),
            })
            .collect();

        Self {
            project: graph.path().display().to_string(),
            nodes,
            products,
        }
    }
}

fn phase_info(phase: &BuildPhase, group: &ReferenceGroup) -> PhaseInfo {
    let links: Vec<String> = phase
        .as_frameworks()
        .map(|frameworks| {
            frameworks
                .files
                .iter()
                .filter_map(|file| file.file_ref.as_deref())
                .map(|id| {
                    group
                        .find_by_id(id)
                        .map_or_else(|| id.to_string(), |reference| reference.path.clone())
                })
                .collect()
        })
        .unwrap_or_default();

    PhaseInfo {
        id: phase.id().to_string(),
        isa: phase.isa().to_string(),
        name: phase.display_name(),
        links,
    }
}

impl TableDisplay for ProjectInfo {
    fn to_table(&self) -> String {
        let mut lines = vec![format!("{}", self.project.bold())];

        for node in &self.nodes {
            lines.push(format!(
                "  {} {}",
                node.name.cyan(),
                format!("({})", node.isa).dimmed()
            ));
            for (index, phase) in node.phases.iter().enumerate() {
                lines.push(format!("    {}. {}", index, phase.name));
                for link in &phase.links {
                    lines.push(format!("       - {}", link));
                }
            }
        }

        lines.push(format!("  {}:", "Products".cyan()));
        if self.products.is_empty() {
            lines.push("    (none)".to_string());
        }
        for product in &self.products {
            match &product.file_type {
                Some(file_type) => lines.push(format!(
                    "    {} {}",
                    product.path,
                    format!("[{}]", file_type).dimmed()
                )),
                None => lines.push(format!("    {}", product.path)),
            }
        }

        lines.join("\n")
    }
}

/// Run the inspect command.
pub fn run(project: &Path, output: &OutputConfig) -> Result<()> {
    let graph = PbxProject::open(project)?;
    Output::new(ProjectInfo::from_graph(&graph), output).render()
}
