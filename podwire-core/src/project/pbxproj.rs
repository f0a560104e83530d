//! JSON-encoded `project.pbxproj` object tables.
//!
//! # Format
//!
//! ```json
//! {
//!   "archiveVersion": "1",
//!   "classes": {},
//!   "objectVersion": "46",
//!   "objects": {
//!     "<ID>": { "isa": "PBXProject", "targets": ["<ID>"], "productRefGroup": "<ID>" },
//!     "<ID>": { "isa": "PBXNativeTarget", "name": "App", "buildPhases": ["<ID>"] }
//!   },
//!   "rootObject": "<ID>"
//! }
//! ```
//!
//! Targets, their build phases, frameworks memberships, and the products
//! group are decoded into typed values. Every other object is carried through
//! untouched.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::NamedTempFile;
use uuid::Uuid;

use super::model::{
    BuildFile, BuildPhase, Fields, FileReference, FrameworksPhase, GroupChild, Node, OpaquePhase,
    ReferenceGroup, ShellScriptPhase, ISA_AGGREGATE_TARGET, ISA_BUILD_FILE, ISA_FILE_REFERENCE,
    ISA_FRAMEWORKS_PHASE, ISA_GROUP, ISA_NATIVE_TARGET, ISA_PROJECT, ISA_SHELL_SCRIPT_PHASE,
};
use super::{GraphOpener, ProjectGraph};
use crate::error::{GraphError, Result};

/// File inside the project directory that holds the object table.
pub const ROOT_DESCRIPTOR: &str = "project.pbxproj";

/// Length of an object id (96 bits, upper-case hex).
const OBJECT_ID_LEN: usize = 24;

/// A project graph loaded from `<path>/project.pbxproj`.
#[derive(Debug, Clone)]
pub struct PbxProject {
    path: PathBuf,
    /// Top-level keys other than `objects` and `rootObject`.
    header: Fields,
    root_object: String,
    nodes: Vec<Node>,
    group: ReferenceGroup,
    /// Objects without a typed counterpart, keyed by id.
    objects: BTreeMap<String, Fields>,
}

impl PbxProject {
    /// Open the project directory at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let descriptor = path.join(ROOT_DESCRIPTOR);

        let content = match fs::read_to_string(&descriptor) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GraphError::NotFound { path: descriptor });
            }
            Err(source) => {
                return Err(GraphError::Read {
                    path: descriptor,
                    source,
                })
            }
        };

        let document: Value = serde_json::from_str(&content)
            .map_err(|e| GraphError::malformed(&descriptor, e.to_string()))?;
        let project = Decoder::new(&descriptor).decode(path, document)?;

        tracing::debug!(
            "Loaded {} with {} nodes and {} product references",
            descriptor.display(),
            project.nodes.len(),
            project.group.len()
        );
        Ok(project)
    }

    pub fn root_object(&self) -> &str {
        &self.root_object
    }

    /// An object kept verbatim because integration never edits it.
    pub fn object(&self, id: &str) -> Option<&Fields> {
        self.objects.get(id)
    }

    /// Encode the graph back into its on-disk document.
    pub fn to_document(&self) -> Value {
        let mut objects: Map<String, Value> = self
            .objects
            .iter()
            .map(|(id, fields)| (id.clone(), Value::Object(fields.clone())))
            .collect();

        for node in &self.nodes {
            let mut fields = node.fields.clone();
            if fields.contains_key("name") {
                fields.insert("name".to_string(), Value::String(node.name.clone()));
            }
            fields.insert(
                "buildPhases".to_string(),
                id_list(node.phases.iter().map(BuildPhase::id)),
            );
            objects.insert(node.id.clone(), Value::Object(fields));

            for phase in &node.phases {
                encode_phase(phase, &mut objects);
            }
        }

        let mut group = self.group.fields.clone();
        group.insert(
            "children".to_string(),
            id_list(self.group.children.iter().map(|child| match child {
                GroupChild::Reference(reference) => reference.id.as_str(),
                GroupChild::Opaque(id) => id.as_str(),
            })),
        );
        objects.insert(self.group.id.clone(), Value::Object(group));
        for reference in self.group.references() {
            let mut fields = reference.fields.clone();
            fields.insert("path".to_string(), Value::String(reference.path.clone()));
            objects.insert(reference.id.clone(), Value::Object(fields));
        }

        let mut document = self.header.clone();
        document.insert("objects".to_string(), Value::Object(objects));
        document.insert(
            "rootObject".to_string(),
            Value::String(self.root_object.clone()),
        );
        Value::Object(document)
    }

    fn contains_id(&self, id: &str) -> bool {
        if self.root_object == id || self.objects.contains_key(id) || self.group.id == id {
            return true;
        }
        if self.group.references().any(|reference| reference.id == id) {
            return true;
        }
        self.nodes.iter().any(|node| {
            node.id == id
                || node.phases.iter().any(|phase| {
                    phase.id() == id
                        || phase
                            .as_frameworks()
                            .is_some_and(|fw| fw.files.iter().any(|file| file.id == id))
                })
        })
    }
}

impl ProjectGraph for PbxProject {
    fn path(&self) -> &Path {
        &self.path
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
        loop {
            let mut id = Uuid::new_v4().simple().to_string().to_uppercase();
            id.truncate(OBJECT_ID_LEN);
            if !self.contains_id(&id) {
                return id;
            }
        }
    }

    fn purge_build_files(&mut self, file_ref: &str) -> usize {
        let stale: Vec<String> = self
            .objects
            .iter()
            .filter(|(_, fields)| {
                isa(fields) == Some(ISA_BUILD_FILE)
                    && fields.get("fileRef").and_then(Value::as_str) == Some(file_ref)
            })
            .map(|(id, _)| id.clone())
            .collect();
        if stale.is_empty() {
            return 0;
        }

        for id in &stale {
            self.objects.remove(id);
        }
        for fields in self.objects.values_mut() {
            drop_listed(fields, "files", &stale);
        }
        for node in &mut self.nodes {
            for phase in &mut node.phases {
                if let BuildPhase::Opaque(opaque) = phase {
                    drop_listed(&mut opaque.object, "files", &stale);
                }
            }
        }
        stale.len()
    }

    /// Write the graph through a temporary file renamed over the descriptor,
    /// so readers never observe a partial write.
    fn save(&self) -> Result<()> {
        let descriptor = self.root_descriptor();
        let save_error = |source: std::io::Error| GraphError::Save {
            path: descriptor.clone(),
            source,
        };

        let mut content = serde_json::to_string_pretty(&self.to_document())
            .map_err(|e| save_error(std::io::Error::other(e)))?;
        content.push('\n');

        let mut file = NamedTempFile::new_in(&self.path).map_err(save_error)?;
        if let Ok(metadata) = fs::metadata(&descriptor) {
            file.as_file()
                .set_permissions(metadata.permissions())
                .map_err(save_error)?;
        }
        file.write_all(content.as_bytes()).map_err(save_error)?;
        file.persist(&descriptor).map_err(|e| save_error(e.error))?;

        tracing::debug!("Saved {}", descriptor.display());
        Ok(())
    }

    fn touch(&self) -> Result<()> {
        let descriptor = self.root_descriptor();
        let touch_error = |source: std::io::Error| GraphError::Touch {
            path: descriptor.clone(),
            source,
        };

        let file = File::open(&descriptor).map_err(touch_error)?;
        file.set_modified(SystemTime::now()).map_err(touch_error)?;

        tracing::debug!("Touched {}", descriptor.display());
        Ok(())
    }
}

/// Opens [`PbxProject`]s from project directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct PbxprojOpener;

impl GraphOpener for PbxprojOpener {
    type Graph = PbxProject;

    fn open(&self, path: &Path) -> Result<PbxProject> {
        PbxProject::open(path)
    }
}

// ============================================================================
// Decoding
// ============================================================================

struct Decoder<'a> {
    descriptor: &'a Path,
}

impl<'a> Decoder<'a> {
    fn new(descriptor: &'a Path) -> Self {
        Self { descriptor }
    }

    fn malformed(&self, message: impl Into<String>) -> GraphError {
        GraphError::malformed(self.descriptor, message)
    }

    fn decode(&self, path: PathBuf, document: Value) -> Result<PbxProject> {
        let Value::Object(mut header) = document else {
            return Err(self.malformed("top level is not a dictionary"));
        };

        let mut objects = match header.remove("objects") {
            Some(Value::Object(objects)) => objects
                .into_iter()
                .map(|(id, object)| match object {
                    Value::Object(fields) => Ok((id, fields)),
                    _ => Err(self.malformed(format!("object {id} is not a dictionary"))),
                })
                .collect::<Result<BTreeMap<String, Fields>>>()?,
            _ => return Err(self.malformed("missing objects table")),
        };

        let root_object = match header.remove("rootObject") {
            Some(Value::String(id)) => id,
            _ => return Err(self.malformed("missing rootObject")),
        };
        let root = objects
            .get(&root_object)
            .ok_or_else(|| self.malformed(format!("root object {root_object} not found")))?;
        if isa(root) != Some(ISA_PROJECT) {
            return Err(self.malformed(format!("root object {root_object} is not a PBXProject")));
        }
        let target_ids = self.id_list(root, "targets")?;
        let group_id = root
            .get("productRefGroup")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| self.malformed("project has no productRefGroup"))?;

        let mut nodes = Vec::with_capacity(target_ids.len());
        for id in target_ids {
            let is_node = objects
                .get(&id)
                .map(|fields| matches!(isa(fields), Some(ISA_NATIVE_TARGET | ISA_AGGREGATE_TARGET)))
                .ok_or_else(|| self.malformed(format!("target {id} not found")))?;
            if !is_node {
                continue;
            }
            let Some(mut fields) = objects.remove(&id) else {
                continue;
            };

            // `name` stays in `fields` so an unnamed target encodes back unnamed
            let name = fields
                .get("name")
                .and_then(Value::as_str)
                .map_or_else(|| id.clone(), str::to_string);
            let phase_ids = self.id_list(&fields, "buildPhases")?;
            fields.remove("buildPhases");
            let phases = phase_ids
                .iter()
                .map(|phase_id| self.decode_phase(&mut objects, phase_id))
                .collect::<Result<Vec<_>>>()?;

            nodes.push(Node {
                id,
                name,
                phases,
                fields,
            });
        }

        let group = self.decode_group(&mut objects, group_id)?;

        Ok(PbxProject {
            path,
            header,
            root_object,
            nodes,
            group,
            objects,
        })
    }

    fn decode_phase(&self, objects: &mut BTreeMap<String, Fields>, id: &str) -> Result<BuildPhase> {
        let mut fields = objects
            .remove(id)
            .ok_or_else(|| self.malformed(format!("build phase {id} not found")))?;

        let kind = isa(&fields).map(str::to_string);
        let phase = match kind.as_deref() {
            Some(ISA_FRAMEWORKS_PHASE) => {
                let file_ids = self.id_list(&fields, "files")?;
                fields.remove("files");
                let mut files = Vec::with_capacity(file_ids.len());
                for file_id in file_ids {
                    let mut file = objects
                        .remove(&file_id)
                        .ok_or_else(|| self.malformed(format!("build file {file_id} not found")))?;
                    let file_ref = take_string(&mut file, "fileRef");
                    files.push(BuildFile {
                        id: file_id,
                        file_ref,
                        fields: file,
                    });
                }
                BuildPhase::Frameworks(FrameworksPhase {
                    id: id.to_string(),
                    files,
                    fields,
                })
            }
            Some(ISA_SHELL_SCRIPT_PHASE) => {
                let name = take_string(&mut fields, "name");
                let shell_script = take_string(&mut fields, "shellScript").unwrap_or_default();
                let show_env_vars_in_log = fields.remove("showEnvVarsInLog").and_then(|v| flag(&v));
                BuildPhase::ShellScript(ShellScriptPhase {
                    id: id.to_string(),
                    name,
                    shell_script,
                    show_env_vars_in_log,
                    fields,
                })
            }
            _ => BuildPhase::Opaque(OpaquePhase {
                id: id.to_string(),
                object: fields,
            }),
        };
        Ok(phase)
    }

    fn decode_group(
        &self,
        objects: &mut BTreeMap<String, Fields>,
        id: String,
    ) -> Result<ReferenceGroup> {
        let mut fields = objects
            .remove(&id)
            .ok_or_else(|| self.malformed(format!("products group {id} not found")))?;
        if isa(&fields) != Some(ISA_GROUP) {
            return Err(self.malformed(format!("products group {id} is not a PBXGroup")));
        }
        let child_ids = self.id_list(&fields, "children")?;
        fields.remove("children");

        let mut children = Vec::with_capacity(child_ids.len());
        for child_id in child_ids {
            let is_reference = objects
                .get(&child_id)
                .is_some_and(|child| isa(child) == Some(ISA_FILE_REFERENCE));
            if is_reference {
                if let Some(mut child) = objects.remove(&child_id) {
                    match take_string(&mut child, "path") {
                        Some(path) => {
                            children.push(GroupChild::Reference(FileReference {
                                id: child_id,
                                path,
                                fields: child,
                            }));
                            continue;
                        }
                        // Name-only references stay opaque
                        None => {
                            objects.insert(child_id.clone(), child);
                        }
                    }
                }
            }
            children.push(GroupChild::Opaque(child_id));
        }

        Ok(ReferenceGroup {
            id,
            children,
            fields,
        })
    }

    fn id_list(&self, fields: &Fields, key: &str) -> Result<Vec<String>> {
        match fields.get(key) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.malformed(format!("`{key}` holds a non-string id")))
                })
                .collect(),
            Some(_) => Err(self.malformed(format!("`{key}` is not a list"))),
        }
    }
}

fn isa(fields: &Fields) -> Option<&str> {
    fields.get("isa").and_then(Value::as_str)
}

/// Remove `key` if it holds a string; any other value is left in place.
fn take_string(fields: &mut Fields, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            fields.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}

/// Boolean flags are persisted as `"0"`/`"1"`.
fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.as_str() {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        },
        Value::Number(n) => n.as_u64().map(|n| n != 0),
        _ => None,
    }
}

// ============================================================================
// Encoding
// ============================================================================

/// Remove `ids` from the id array under `key`, if there is one.
fn drop_listed(fields: &mut Fields, key: &str, ids: &[String]) {
    if let Some(Value::Array(listed)) = fields.get_mut(key) {
        listed.retain(|value| {
            !value
                .as_str()
                .is_some_and(|listed_id| ids.iter().any(|id| id == listed_id))
        });
    }
}

fn id_list<'a>(ids: impl Iterator<Item = &'a str>) -> Value {
    Value::Array(ids.map(|id| Value::String(id.to_string())).collect())
}

fn encode_phase(phase: &BuildPhase, objects: &mut Map<String, Value>) {
    match phase {
        BuildPhase::Frameworks(frameworks) => {
            let mut fields = frameworks.fields.clone();
            fields.insert(
                "files".to_string(),
                id_list(frameworks.files.iter().map(|file| file.id.as_str())),
            );
            objects.insert(frameworks.id.clone(), Value::Object(fields));

            for file in &frameworks.files {
                let mut fields = file.fields.clone();
                if let Some(file_ref) = &file.file_ref {
                    fields.insert("fileRef".to_string(), Value::String(file_ref.clone()));
                }
                objects.insert(file.id.clone(), Value::Object(fields));
            }
        }
        BuildPhase::ShellScript(script) => {
            let mut fields = script.fields.clone();
            if let Some(name) = &script.name {
                fields.insert("name".to_string(), Value::String(name.clone()));
            }
            fields.insert(
                "shellScript".to_string(),
                Value::String(script.shell_script.clone()),
            );
            if let Some(show) = script.show_env_vars_in_log {
                let flag = if show { "1" } else { "0" };
                fields.insert(
                    "showEnvVarsInLog".to_string(),
                    Value::String(flag.to_string()),
                );
            }
            objects.insert(script.id.clone(), Value::Object(fields));
        }
        BuildPhase::Opaque(opaque) => {
            objects.insert(opaque.id.clone(), Value::Object(opaque.object.clone()));
        }
    }
}
