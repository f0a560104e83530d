//! Integrate command - Wire every manifest target into its project
//!
//! Targets run one after another. Each run reloads its project, so targets
//! sharing a project see each other's changes.

use crate::manifest::Manifest;
use crate::output::{Output, OutputConfig, TableDisplay};
use anyhow::Result;
use colored::Colorize;
use podwire_core::report::{LogEntry, MessageLog};
use podwire_core::{IntegrationError, IntegrationReport, Persistence, Reporter, TargetIntegrator};
use serde::Serialize;
use std::path::Path;

/// Prints progress as it happens and keeps a copy for the final output.
pub struct TerminalReporter {
    log: MessageLog,
    echo: bool,
}

impl TerminalReporter {
    pub fn new(echo: bool) -> Self {
        Self {
            log: MessageLog::new(),
            echo,
        }
    }

    /// Entries recorded since the last call.
    pub fn take_entries(&mut self) -> Vec<LogEntry> {
        self.log.drain()
    }
}

impl Reporter for TerminalReporter {
    fn section(&mut self, title: &str) {
        if self.echo {
            println!("{}", title.bold());
        }
        self.log.section(title);
    }

    fn message(&mut self, message: &str) {
        if self.echo {
            println!("  {}", message.yellow());
        }
        self.log.message(message);
    }
}

/// What happened to one target.
#[derive(Debug, Serialize)]
pub struct TargetOutcome {
    pub target: String,
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<IntegrationReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub messages: Vec<LogEntry>,
}

impl TargetOutcome {
    fn integrated(report: IntegrationReport, messages: Vec<LogEntry>) -> Self {
        Self {
            target: report.target.clone(),
            project: report.project.display().to_string(),
            report: Some(report),
            error: None,
            messages,
        }
    }

    fn failed(error: &IntegrationError, messages: Vec<LogEntry>) -> Self {
        Self {
            target: error.target.clone(),
            project: error.project.display().to_string(),
            report: None,
            error: Some(error.to_string()),
            messages,
        }
    }
}

/// Outcomes of every target, in manifest order.
#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct IntegrateSummary {
    pub targets: Vec<TargetOutcome>,
}

impl IntegrateSummary {
    pub fn failures(&self) -> usize {
        self.targets.iter().filter(|t| t.error.is_some()).count()
    }
}

impl TableDisplay for IntegrateSummary {
    fn to_table(&self) -> String {
        let mut lines = Vec::new();

        for outcome in &self.targets {
            let line = match (&outcome.report, &outcome.error) {
                (Some(report), _) => {
                    let state = match report.persistence {
                        Persistence::Saved => "saved".green(),
                        Persistence::Touched => "unchanged".dimmed(),
                    };
                    if report.integrated_nodes.is_empty() {
                        format!("  {} {}", outcome.target.cyan(), state)
                    } else {
                        format!(
                            "  {} {} (integrated {})",
                            outcome.target.cyan(),
                            state,
                            report.integrated_nodes.join(", ")
                        )
                    }
                }
                (None, Some(error)) => {
                    format!("  {} {} {}", outcome.target.cyan(), "failed:".red(), error)
                }
                (None, None) => format!("  {}", outcome.target.cyan()),
            };
            lines.push(line);
        }

        let failures = self.failures();
        let header = if failures == 0 {
            format!("{} {} target(s)", "Integrated".green().bold(), self.targets.len())
        } else {
            format!(
                "{} {} of {} target(s) failed",
                "Integration incomplete:".red().bold(),
                failures,
                self.targets.len()
            )
        };
        lines.insert(0, format!("\n{}", header));

        lines.join("\n")
    }
}

/// Run the integrate command.
///
/// Without `keep_going` the first failing target aborts the run. With it the
/// remaining targets still run and the command fails at the end.
pub fn run(manifest_path: &Path, keep_going: bool, output: &OutputConfig) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    tracing::debug!(
        "Integrating {} target(s) from {}",
        manifest.targets.len(),
        manifest.path.display()
    );
    let mut reporter = TerminalReporter::new(!output.is_json());
    let mut targets = Vec::with_capacity(manifest.targets.len());

    for target in manifest.targets {
        let result = TargetIntegrator::new(target).integrate(&mut reporter);
        let messages = reporter.take_entries();
        match result {
            Ok(report) => targets.push(TargetOutcome::integrated(report, messages)),
            Err(e) if keep_going => {
                tracing::error!("{}", e);
                targets.push(TargetOutcome::failed(&e, messages));
            }
            Err(e) => return Err(e.into()),
        }
    }

    let summary = IntegrateSummary { targets };
    let failures = summary.failures();
    let total = summary.targets.len();
    Output::new(summary, output).render()?;

    if failures > 0 {
        anyhow::bail!("{} of {} targets failed to integrate", failures, total);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use podwire_core::report::EntryKind;

    #[test]
    fn test_reporter_keeps_entries_per_target() {
        let mut reporter = TerminalReporter::new(false);
        reporter.section("Integrating target `A`");
        reporter.message("Removing stale product reference `libA.a` from project");

        let entries = reporter.take_entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EntryKind::Section);
        assert!(reporter.take_entries().is_empty());
    }

    #[test]
    fn test_summary_counts_failures() {
        colored::control::set_override(false);
        let summary = IntegrateSummary {
            targets: vec![TargetOutcome {
                target: "Pods-App".to_string(),
                project: "App.xcodeproj".to_string(),
                report: None,
                error: Some("Project file not found".to_string()),
                messages: Vec::new(),
            }],
        };
        assert_eq!(summary.failures(), 1);

        let table = summary.to_table();
        assert!(table.contains("1 of 1 target(s) failed"));
        assert!(table.contains("Pods-App failed: Project file not found"));
    }
}
