//! Target integration: wiring one target's product into its consumers.
//!
//! Each run reloads the project graph, works out which consuming nodes still
//! need the product, runs a fixed sequence of idempotent steps and then either
//! saves the graph (something changed) or touches its root descriptor
//! (nothing changed).
//!
//! ```text
//! open graph -> IntegrationContext { consuming_nodes, nodes_to_integrate }
//!            -> NormalizeLegacyCopyScript   (all consuming nodes)
//!            -> WireProductReference        (nodes to integrate)
//!            -> EnsureCopyResourcesPhase    (nodes to integrate)
//!            -> EnsureCheckManifestPhase    (nodes to integrate)
//!            -> save | touch
//! ```

use serde::Serialize;
use std::path::PathBuf;

use crate::error::{GraphError, IntegrationError};
use crate::phases;
use crate::project::{GraphOpener, PbxprojOpener, ProjectGraph};
use crate::reference;
use crate::report::Reporter;
use crate::target::Target;

/// One named mutation step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    NormalizeLegacyCopyScript,
    WireProductReference,
    EnsureCopyResourcesPhase,
    EnsureCheckManifestPhase,
}

impl Step {
    /// Steps applied to nodes that do not link the product yet.
    pub const INTEGRATION: [Step; 3] = [
        Step::WireProductReference,
        Step::EnsureCopyResourcesPhase,
        Step::EnsureCheckManifestPhase,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Step::NormalizeLegacyCopyScript => "normalize legacy copy-resources scripts",
            Step::WireProductReference => "link product reference",
            Step::EnsureCopyResourcesPhase => "ensure copy-resources phase",
            Step::EnsureCheckManifestPhase => "ensure manifest check phase",
        }
    }
}

/// Outcome of one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepResult {
    pub step: Step,
    /// Nodes the step ran over.
    pub nodes: Vec<String>,
    /// Whether the step changed the graph.
    pub mutated: bool,
}

/// How the run left the project on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Persistence {
    /// The whole graph was written back.
    Saved,
    /// Nothing changed; only the root descriptor's mtime was bumped.
    Touched,
}

/// Summary of one integration run.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationReport {
    pub target: String,
    pub project: PathBuf,
    pub consuming_nodes: Vec<String>,
    /// Nodes that received the product during this run.
    pub integrated_nodes: Vec<String>,
    pub steps: Vec<StepResult>,
    pub dirty: bool,
    pub persistence: Persistence,
}

/// What an integration run would do, computed without mutating anything.
#[derive(Debug, Clone, Serialize)]
pub struct IntegrationPlan {
    pub target: String,
    pub project: PathBuf,
    pub product: String,
    pub consuming_nodes: Vec<String>,
    pub nodes_to_integrate: Vec<String>,
    /// Nodes whose copy-resources script is in a legacy format.
    pub legacy_script_nodes: Vec<String>,
}

impl IntegrationPlan {
    pub fn is_up_to_date(&self) -> bool {
        self.nodes_to_integrate.is_empty() && self.legacy_script_nodes.is_empty()
    }
}

/// State resolved once at the start of a run and shared by every step.
#[derive(Debug)]
pub struct IntegrationContext<G> {
    pub graph: G,
    /// Target consumers present in the graph.
    pub consuming_nodes: Vec<String>,
    /// Consumers whose frameworks phase does not reference the current
    /// product yet.
    pub nodes_to_integrate: Vec<String>,
}

impl<G: ProjectGraph> IntegrationContext<G> {
    pub fn new(graph: G, target: &Target) -> Self {
        let consuming_nodes = graph.find_nodes_for_target(target);
        let product = target.product_name();
        let nodes_to_integrate = consuming_nodes
            .iter()
            .filter(|node| !reference::links_product(&graph, node, &product))
            .cloned()
            .collect();
        Self {
            graph,
            consuming_nodes,
            nodes_to_integrate,
        }
    }
}

/// Integrates a single target into its consuming project.
///
/// Runs against the same project must not overlap: each run loads its own
/// copy of the graph and the last save wins.
#[derive(Debug, Clone)]
pub struct TargetIntegrator<O = PbxprojOpener> {
    target: Target,
    opener: O,
}

impl TargetIntegrator<PbxprojOpener> {
    pub fn new(target: Target) -> Self {
        Self::with_opener(target, PbxprojOpener)
    }
}

impl<O: GraphOpener> TargetIntegrator<O> {
    pub fn with_opener(target: Target, opener: O) -> Self {
        Self { target, opener }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn section_title(&self) -> String {
        format!(
            "Integrating target `{}` (`{}` project)",
            self.target.name,
            self.target.project_path.display()
        )
    }

    /// Integrate the target, reporting progress to `reporter`.
    pub fn integrate(
        &self,
        reporter: &mut dyn Reporter,
    ) -> Result<IntegrationReport, IntegrationError> {
        reporter.section(&self.section_title());

        let mut context = self.load()?;
        let steps = self.run_steps(&mut context, reporter);

        // Once the integration steps ran the graph counts as changed, whether
        // or not each individual step reported a mutation.
        let integrated = !context.nodes_to_integrate.is_empty();
        let dirty = integrated || steps.iter().any(|result| result.mutated);

        let persistence = if dirty {
            context.graph.save().map_err(|e| self.error(e))?;
            Persistence::Saved
        } else {
            // Consumers regenerate derived configuration without reloading
            // the project unless its descriptor looks modified.
            context.graph.touch().map_err(|e| self.error(e))?;
            Persistence::Touched
        };

        tracing::debug!(
            "Integrated `{}` into {} node(s), dirty={}",
            self.target.name,
            context.nodes_to_integrate.len(),
            dirty
        );

        Ok(IntegrationReport {
            target: self.target.name.clone(),
            project: self.target.project_path.clone(),
            consuming_nodes: context.consuming_nodes,
            integrated_nodes: context.nodes_to_integrate,
            steps,
            dirty,
            persistence,
        })
    }

    /// Work out what `integrate` would change without touching the project.
    pub fn plan(&self) -> Result<IntegrationPlan, IntegrationError> {
        let context = self.load()?;
        let legacy_script_nodes = context
            .consuming_nodes
            .iter()
            .filter(|node| phases::has_legacy_copy_script(&context.graph, &self.target, node))
            .cloned()
            .collect();

        Ok(IntegrationPlan {
            target: self.target.name.clone(),
            project: self.target.project_path.clone(),
            product: self.target.product_name(),
            consuming_nodes: context.consuming_nodes,
            nodes_to_integrate: context.nodes_to_integrate,
            legacy_script_nodes,
        })
    }

    fn load(&self) -> Result<IntegrationContext<O::Graph>, IntegrationError> {
        let graph = self
            .opener
            .open(&self.target.project_path)
            .map_err(|e| self.error(e))?;
        Ok(IntegrationContext::new(graph, &self.target))
    }

    fn run_steps(
        &self,
        context: &mut IntegrationContext<O::Graph>,
        reporter: &mut dyn Reporter,
    ) -> Vec<StepResult> {
        let mut results = Vec::with_capacity(1 + Step::INTEGRATION.len());

        let all_nodes = context.consuming_nodes.clone();
        results.push(self.run_step(
            Step::NormalizeLegacyCopyScript,
            &mut context.graph,
            all_nodes,
            reporter,
        ));

        if !context.nodes_to_integrate.is_empty() {
            for step in Step::INTEGRATION {
                let nodes = context.nodes_to_integrate.clone();
                results.push(self.run_step(step, &mut context.graph, nodes, reporter));
            }
        }

        results
    }

    fn run_step(
        &self,
        step: Step,
        graph: &mut O::Graph,
        nodes: Vec<String>,
        reporter: &mut dyn Reporter,
    ) -> StepResult {
        let target = &self.target;
        let mut mutated = false;
        for node in &nodes {
            let changed = match step {
                Step::NormalizeLegacyCopyScript => {
                    phases::normalize_legacy_copy_script(&mut *graph, target, node)
                }
                Step::WireProductReference => {
                    reference::ensure_product_reference(&mut *graph, target, node, reporter)
                }
                Step::EnsureCopyResourcesPhase => {
                    phases::ensure_copy_resources_phase(&mut *graph, target, node)
                }
                Step::EnsureCheckManifestPhase => {
                    phases::ensure_check_manifest_phase(&mut *graph, node)
                }
            };
            mutated |= changed;
        }
        tracing::debug!("Step `{}`: mutated={}", step.description(), mutated);
        StepResult {
            step,
            nodes,
            mutated,
        }
    }

    fn error(&self, source: GraphError) -> IntegrationError {
        IntegrationError {
            target: self.target.name.clone(),
            project: self.target.project_path.clone(),
            source,
        }
    }
}
