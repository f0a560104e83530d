//! Status command - Show which consumers are pending integration
//!
//! Read-only: plans every manifest target without saving or touching any
//! project.

use crate::manifest::Manifest;
use crate::output::{Output, OutputConfig, TableDisplay};
use anyhow::Result;
use colored::Colorize;
use podwire_core::{IntegrationPlan, TargetIntegrator};
use serde::Serialize;
use std::path::Path;

/// Plans of every target, in manifest order.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct StatusReport {
    pub targets: Vec<IntegrationPlan>,
}

impl StatusReport {
    pub fn is_up_to_date(&self) -> bool {
        self.targets.iter().all(IntegrationPlan::is_up_to_date)
    }
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

impl TableDisplay for StatusReport {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        for plan in &self.targets {
            lines.push(format!(
                "{} ({})",
                plan.target.bold(),
                plan.project.display()
            ));
            lines.push(format!("  {}: {}", "Product".cyan(), plan.product));
            lines.push(format!(
                "  {}: {}",
                "Consumers".cyan(),
                list(&plan.consuming_nodes)
            ));

            if plan.is_up_to_date() {
                lines.push(format!("  {}: {}", "Status".cyan(), "Up to date".green()));
            } else {
                if !plan.nodes_to_integrate.is_empty() {
                    lines.push(format!(
                        "  {}: {}",
                        "Pending integration".yellow(),
                        list(&plan.nodes_to_integrate)
                    ));
                }
                if !plan.legacy_script_nodes.is_empty() {
                    lines.push(format!(
                        "  {}: {}",
                        "Legacy copy scripts".yellow(),
                        list(&plan.legacy_script_nodes)
                    ));
                }
            }
        }

        if !self.is_up_to_date() {
            lines.push(String::new());
            lines.push(format!("{}: {}", "Next action".yellow(), "podwire integrate"));
        }

        lines.join("\n")
    }
}

/// Run the status command.
pub fn run(manifest_path: &Path, output: &OutputConfig) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    tracing::debug!(
        "Planning {} target(s) from {}",
        manifest.targets.len(),
        manifest.path.display()
    );

    let targets = manifest
        .targets
        .into_iter()
        .map(|target| TargetIntegrator::new(target).plan())
        .collect::<Result<Vec<_>, _>>()?;

    Output::new(StatusReport { targets }, output).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plan(pending: &[&str]) -> IntegrationPlan {
        IntegrationPlan {
            target: "Pods-App".to_string(),
            project: PathBuf::from("App.xcodeproj"),
            product: "Pods_App.framework".to_string(),
            consuming_nodes: vec!["App".to_string()],
            nodes_to_integrate: pending.iter().map(|n| n.to_string()).collect(),
            legacy_script_nodes: Vec::new(),
        }
    }

    #[test]
    fn test_table_lists_pending_nodes() {
        colored::control::set_override(false);
        let report = StatusReport {
            targets: vec![plan(&["App"])],
        };
        assert!(!report.is_up_to_date());

        let table = report.to_table();
        assert!(table.contains("Pods-App (App.xcodeproj)"));
        assert!(table.contains("Pending integration: App"));
        assert!(table.contains("Next action: podwire integrate"));
    }

    #[test]
    fn test_table_up_to_date() {
        colored::control::set_override(false);
        let report = StatusReport {
            targets: vec![plan(&[])],
        };
        assert!(report.is_up_to_date());
        assert!(report.to_table().contains("Status: Up to date"));
    }
}
