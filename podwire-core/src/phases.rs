//! Shell-script build phases installed by integration.

use crate::project::{BuildPhase, ProjectGraph, ShellScriptPhase};
use crate::target::Target;

/// Phase running the target's generated copy-resources script.
pub const COPY_RESOURCES_PHASE_NAME: &str = "Copy Pods Resources";

/// Phase failing the build when the installed sandbox is out of date.
pub const CHECK_MANIFEST_PHASE_NAME: &str = "Check Pods Manifest.lock";

/// Compares the lockfile against the installed manifest and stops the build
/// on mismatch.
pub const CHECK_MANIFEST_SCRIPT: &str = r#"diff "${PODS_ROOT}/../Podfile.lock" "${PODS_ROOT}/Manifest.lock" > /dev/null
if [[ $? != 0 ]] ; then
    cat << EOM
error: The sandbox is not in sync with the Podfile.lock. Run 'pod install' or update your CocoaPods installation.
EOM
    exit 1
fi
"#;

/// Canonical copy-resources script: the quoted script path and one newline.
pub fn copy_resources_script(target: &Target) -> String {
    format!("\"{}\"\n", target.copy_resources_script)
}

/// Ensure `node` has a shell-script phase called `name` running `script`.
///
/// A missing phase is created (first when `insert_at_front`, last otherwise)
/// with env-var logging off. An existing phase keeps its position and only
/// has its script replaced when it differs. Returns whether the graph changed.
pub fn ensure_shell_script_phase<G: ProjectGraph + ?Sized>(
    graph: &mut G,
    node: &str,
    name: &str,
    script: &str,
    insert_at_front: bool,
) -> bool {
    if let Some(phase) = graph.shell_script_phases_mut(node, name).into_iter().next() {
        if phase.shell_script == script {
            return false;
        }
        tracing::debug!("Updating script of `{}` phase on `{}`", name, node);
        phase.shell_script = script.to_string();
        return true;
    }

    let id = graph.generate_id();
    let phase = BuildPhase::ShellScript(ShellScriptPhase::new(id, name, script));
    let added = if insert_at_front {
        graph.insert_phase_at_front(node, phase)
    } else {
        graph.add_phase(node, phase)
    };
    if added {
        tracing::debug!("Added `{}` phase to `{}`", name, node);
    }
    added
}

pub fn ensure_copy_resources_phase<G: ProjectGraph + ?Sized>(
    graph: &mut G,
    target: &Target,
    node: &str,
) -> bool {
    ensure_shell_script_phase(
        graph,
        node,
        COPY_RESOURCES_PHASE_NAME,
        &copy_resources_script(target),
        false,
    )
}

/// The check has to run before anything compiles, so it goes first.
pub fn ensure_check_manifest_phase<G: ProjectGraph + ?Sized>(graph: &mut G, node: &str) -> bool {
    ensure_shell_script_phase(
        graph,
        node,
        CHECK_MANIFEST_PHASE_NAME,
        CHECK_MANIFEST_SCRIPT,
        true,
    )
}

/// Whether a copy-resources phase on `node` holds a non-canonical script.
pub fn has_legacy_copy_script<G: ProjectGraph + ?Sized>(
    graph: &G,
    target: &Target,
    node: &str,
) -> bool {
    let canonical = copy_resources_script(target);
    graph
        .shell_script_phases(node, COPY_RESOURCES_PHASE_NAME)
        .iter()
        .any(|phase| phase.shell_script != canonical)
}

/// Rewrite copy-resources phases written in an older script format.
///
/// Applies to integrated and unintegrated nodes alike.
pub fn normalize_legacy_copy_script<G: ProjectGraph + ?Sized>(
    graph: &mut G,
    target: &Target,
    node: &str,
) -> bool {
    let canonical = copy_resources_script(target);
    let mut mutated = false;
    for phase in graph.shell_script_phases_mut(node, COPY_RESOURCES_PHASE_NAME) {
        if phase.shell_script != canonical {
            tracing::debug!(
                "Normalizing copy-resources script on `{}`: {:?}",
                node,
                phase.shell_script
            );
            phase.shell_script = canonical.clone();
            mutated = true;
        }
    }
    mutated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{FrameworksPhase, OpaquePhase};
    use crate::testing::{math_kit, MemoryGraph};

    fn sources() -> BuildPhase {
        let mut object = serde_json::Map::new();
        object.insert("isa".into(), "PBXSourcesBuildPhase".into());
        BuildPhase::Opaque(OpaquePhase {
            id: "SOURCES".to_string(),
            object,
        })
    }

    fn target(script: &str) -> Target {
        math_kit(true, script)
    }

    #[test]
    fn test_copy_resources_script_is_quoted() {
        let target = target("Target Support Files/MathKit/MathKit-resources.sh");
        assert_eq!(
            copy_resources_script(&target),
            "\"Target Support Files/MathKit/MathKit-resources.sh\"\n"
        );
    }

    #[test]
    fn test_check_manifest_script_text() {
        assert!(CHECK_MANIFEST_SCRIPT.starts_with(
            "diff \"${PODS_ROOT}/../Podfile.lock\" \"${PODS_ROOT}/Manifest.lock\" > /dev/null\n"
        ));
        assert!(CHECK_MANIFEST_SCRIPT.contains(
            "error: The sandbox is not in sync with the Podfile.lock. Run 'pod install' or update your CocoaPods installation.\n"
        ));
        assert!(CHECK_MANIFEST_SCRIPT.ends_with("    exit 1\nfi\n"));
    }

    #[test]
    fn test_check_phase_goes_first_copy_phase_last() {
        let mut graph = MemoryGraph::with_node(vec![
            sources(),
            BuildPhase::Frameworks(FrameworksPhase::new("FW")),
        ]);
        let target = target("MathKit-resources.sh");

        assert!(ensure_copy_resources_phase(&mut graph, &target, "App"));
        assert!(ensure_check_manifest_phase(&mut graph, "App"));
        assert_eq!(
            graph.phase_names(),
            vec![
                CHECK_MANIFEST_PHASE_NAME,
                "PBXSourcesBuildPhase",
                "Frameworks",
                COPY_RESOURCES_PHASE_NAME
            ]
        );

        let check = graph.shell_script_phases("App", CHECK_MANIFEST_PHASE_NAME)[0];
        assert!(!check.shows_env_vars());

        // Already in place
        assert!(!ensure_copy_resources_phase(&mut graph, &target, "App"));
        assert!(!ensure_check_manifest_phase(&mut graph, "App"));
        assert_eq!(graph.nodes[0].phases.len(), 4);
    }

    #[test]
    fn test_existing_check_phase_is_not_moved() {
        let mut graph = MemoryGraph::with_node(vec![sources()]);
        graph.add_phase(
            "App",
            BuildPhase::ShellScript(ShellScriptPhase::new(
                "CHECK",
                CHECK_MANIFEST_PHASE_NAME,
                "old check\n",
            )),
        );

        // Script is refreshed in place
        assert!(ensure_check_manifest_phase(&mut graph, "App"));
        assert_eq!(
            graph.phase_names(),
            vec!["PBXSourcesBuildPhase", CHECK_MANIFEST_PHASE_NAME]
        );
        assert_eq!(
            graph.shell_script_phases("App", CHECK_MANIFEST_PHASE_NAME)[0].shell_script,
            CHECK_MANIFEST_SCRIPT
        );
    }

    #[test]
    fn test_missing_node_is_not_mutated() {
        let mut graph = MemoryGraph::with_node(Vec::new());
        assert!(!ensure_check_manifest_phase(&mut graph, "Other"));
        assert!(graph.nodes[0].phases.is_empty());
    }

    #[test]
    fn test_normalize_legacy_copy_script() {
        let target = target("Target Support Files/MathKit/MathKit-resources.sh");
        let mut graph = MemoryGraph::with_node(vec![BuildPhase::ShellScript(ShellScriptPhase::new(
            "COPY",
            COPY_RESOURCES_PHASE_NAME,
            "MathKit-resources.sh\n",
        ))]);

        assert!(has_legacy_copy_script(&graph, &target, "App"));
        assert!(normalize_legacy_copy_script(&mut graph, &target, "App"));
        assert_eq!(
            graph.shell_script_phases("App", COPY_RESOURCES_PHASE_NAME)[0].shell_script,
            "\"Target Support Files/MathKit/MathKit-resources.sh\"\n"
        );
        assert!(!has_legacy_copy_script(&graph, &target, "App"));
        assert!(!normalize_legacy_copy_script(&mut graph, &target, "App"));
    }

    #[test]
    fn test_normalize_ignores_other_script_phases() {
        let target = target("MathKit-resources.sh");
        let mut graph = MemoryGraph::with_node(vec![BuildPhase::ShellScript(ShellScriptPhase::new(
            "LINT",
            "Lint",
            "swiftlint\n",
        ))]);
        assert!(!normalize_legacy_copy_script(&mut graph, &target, "App"));
        assert_eq!(
            graph.shell_script_phases("App", "Lint")[0].shell_script,
            "swiftlint\n"
        );
    }
}
