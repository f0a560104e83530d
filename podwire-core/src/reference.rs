//! Product references and their frameworks-phase memberships.

use crate::project::{BuildFile, BuildPhase, FrameworksPhase, ProjectGraph};
use crate::report::Reporter;
use crate::target::Target;

/// Whether `node` already links the product at `product_name`.
pub fn links_product<G: ProjectGraph + ?Sized>(graph: &G, node: &str, product_name: &str) -> bool {
    let Some(frameworks) = graph.frameworks_phase(node) else {
        return false;
    };
    let group = graph.reference_group();
    frameworks
        .files
        .iter()
        .filter_map(|file| file.file_ref.as_deref())
        .filter_map(|id| group.find_by_id(id))
        .any(|reference| reference.path == product_name)
}

/// Wire the target's product into `node`'s frameworks phase.
///
/// A reference left over from the other linking mode is removed from the
/// project first. The product reference is reused when present and created
/// otherwise, and the node gets exactly one membership for it. Returns
/// whether the graph changed.
pub fn ensure_product_reference<G: ProjectGraph + ?Sized>(
    graph: &mut G,
    target: &Target,
    node: &str,
    reporter: &mut dyn Reporter,
) -> bool {
    let mut mutated = false;

    let stale = target.alternate_product_name();
    if graph.remove_reference(&stale).is_some() {
        reporter.message(&format!(
            "Removing stale product reference `{stale}` from project"
        ));
        mutated = true;
    }

    let product = target.product_name();
    let reference_id = match graph.find_reference_by_path(&product) {
        Some(reference) => reference.id.clone(),
        None => {
            mutated = true;
            graph.add_reference(&target.product_basename, target.product_type())
        }
    };

    if graph.frameworks_phase(node).is_none() {
        let id = graph.generate_id();
        if !graph.add_phase(node, BuildPhase::Frameworks(FrameworksPhase::new(id))) {
            tracing::warn!("Cannot link {} into missing node `{}`", product, node);
            return mutated;
        }
        tracing::debug!("Added frameworks phase to `{}`", node);
        mutated = true;
    }

    let linked = graph
        .frameworks_phase(node)
        .is_some_and(|frameworks| frameworks.contains_reference(&reference_id));
    if !linked {
        let build_file_id = graph.generate_id();
        if let Some(frameworks) = graph.frameworks_phase_mut(node) {
            frameworks
                .files
                .push(BuildFile::new(build_file_id, reference_id));
            tracing::debug!("Linked {} into `{}`", product, node);
            mutated = true;
        }
    }

    mutated
}
