//! In-memory model of the parts of a project graph that integration touches.
//!
//! Typed values keep the keys the managers read and write as struct fields and
//! carry every other persisted key in `fields`, so decoding and re-encoding an
//! object never loses data.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::target::ProductType;

/// Persisted keys of an object that have no typed counterpart.
pub type Fields = Map<String, Value>;

pub const ISA_PROJECT: &str = "PBXProject";
pub const ISA_NATIVE_TARGET: &str = "PBXNativeTarget";
pub const ISA_AGGREGATE_TARGET: &str = "PBXAggregateTarget";
pub const ISA_FRAMEWORKS_PHASE: &str = "PBXFrameworksBuildPhase";
pub const ISA_SHELL_SCRIPT_PHASE: &str = "PBXShellScriptBuildPhase";
pub const ISA_BUILD_FILE: &str = "PBXBuildFile";
pub const ISA_FILE_REFERENCE: &str = "PBXFileReference";
pub const ISA_GROUP: &str = "PBXGroup";

/// Build action mask Xcode writes for phases that run in every configuration.
const DEFAULT_BUILD_ACTION_MASK: &str = "2147483647";

fn object_fields(isa: &str) -> Fields {
    let mut fields = Map::new();
    fields.insert("isa".to_string(), Value::String(isa.to_string()));
    fields
}

fn phase_fields(isa: &str) -> Fields {
    let mut fields = object_fields(isa);
    fields.insert(
        "buildActionMask".to_string(),
        Value::String(DEFAULT_BUILD_ACTION_MASK.to_string()),
    );
    fields.insert(
        "runOnlyForDeploymentPostprocessing".to_string(),
        Value::String("0".to_string()),
    );
    fields
}

/// A consuming build node (a native or aggregate target of the project).
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    /// Build phases in execution order.
    pub phases: Vec<BuildPhase>,
    pub fields: Fields,
}

impl Node {
    pub fn isa(&self) -> &str {
        self.fields
            .get("isa")
            .and_then(Value::as_str)
            .unwrap_or(ISA_NATIVE_TARGET)
    }
}

/// One ordered step of a node's build.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildPhase {
    ShellScript(ShellScriptPhase),
    Frameworks(FrameworksPhase),
    /// Any other phase kind, kept exactly as it was read.
    Opaque(OpaquePhase),
}

impl BuildPhase {
    pub fn id(&self) -> &str {
        match self {
            BuildPhase::ShellScript(phase) => &phase.id,
            BuildPhase::Frameworks(phase) => &phase.id,
            BuildPhase::Opaque(phase) => &phase.id,
        }
    }

    pub fn isa(&self) -> &str {
        match self {
            BuildPhase::ShellScript(_) => ISA_SHELL_SCRIPT_PHASE,
            BuildPhase::Frameworks(_) => ISA_FRAMEWORKS_PHASE,
            BuildPhase::Opaque(phase) => phase.isa(),
        }
    }

    /// Display name: the explicit name of a script phase, or the phase kind.
    pub fn display_name(&self) -> String {
        match self {
            BuildPhase::ShellScript(phase) => phase
                .name
                .clone()
                .unwrap_or_else(|| "Run Script".to_string()),
            BuildPhase::Frameworks(_) => "Frameworks".to_string(),
            BuildPhase::Opaque(phase) => phase
                .object
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| phase.isa().to_string()),
        }
    }

    pub fn as_shell_script(&self) -> Option<&ShellScriptPhase> {
        match self {
            BuildPhase::ShellScript(phase) => Some(phase),
            _ => None,
        }
    }

    pub fn as_frameworks(&self) -> Option<&FrameworksPhase> {
        match self {
            BuildPhase::Frameworks(phase) => Some(phase),
            _ => None,
        }
    }
}

/// A phase that runs a shell script.
#[derive(Clone, Debug, PartialEq)]
pub struct ShellScriptPhase {
    pub id: String,
    pub name: Option<String>,
    pub shell_script: String,
    /// `None` when the persisted object leaves the flag at the tool default.
    pub show_env_vars_in_log: Option<bool>,
    pub fields: Fields,
}

impl ShellScriptPhase {
    /// A fresh `/bin/sh` phase that does not log environment variables.
    pub fn new(id: impl Into<String>, name: impl Into<String>, script: impl Into<String>) -> Self {
        let mut fields = phase_fields(ISA_SHELL_SCRIPT_PHASE);
        fields.insert("files".to_string(), Value::Array(Vec::new()));
        fields.insert("inputPaths".to_string(), Value::Array(Vec::new()));
        fields.insert("outputPaths".to_string(), Value::Array(Vec::new()));
        fields.insert("shellPath".to_string(), Value::String("/bin/sh".to_string()));
        Self {
            id: id.into(),
            name: Some(name.into()),
            shell_script: script.into(),
            show_env_vars_in_log: Some(false),
            fields,
        }
    }

    pub fn shows_env_vars(&self) -> bool {
        self.show_env_vars_in_log.unwrap_or(true)
    }

    pub fn is_named(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// The phase declaring which artifacts a node links against.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameworksPhase {
    pub id: String,
    pub files: Vec<BuildFile>,
    pub fields: Fields,
}

impl FrameworksPhase {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            files: Vec::new(),
            fields: phase_fields(ISA_FRAMEWORKS_PHASE),
        }
    }

    /// Whether any membership points at the reference with id `file_ref`.
    pub fn contains_reference(&self, file_ref: &str) -> bool {
        self.files
            .iter()
            .any(|file| file.file_ref.as_deref() == Some(file_ref))
    }

    /// Drop every membership pointing at `file_ref`, returning how many went.
    pub fn remove_reference(&mut self, file_ref: &str) -> usize {
        let before = self.files.len();
        self.files
            .retain(|file| file.file_ref.as_deref() != Some(file_ref));
        before - self.files.len()
    }
}

/// Membership of a file reference in a phase.
#[derive(Clone, Debug, PartialEq)]
pub struct BuildFile {
    pub id: String,
    /// Id of the referenced `FileReference`. Memberships of package products
    /// carry no file reference.
    pub file_ref: Option<String>,
    pub fields: Fields,
}

impl BuildFile {
    pub fn new(id: impl Into<String>, file_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            file_ref: Some(file_ref.into()),
            fields: object_fields(ISA_BUILD_FILE),
        }
    }
}

/// A phase kind integration never edits.
#[derive(Clone, Debug, PartialEq)]
pub struct OpaquePhase {
    pub id: String,
    /// The complete persisted object, `isa` included.
    pub object: Fields,
}

impl OpaquePhase {
    pub fn isa(&self) -> &str {
        self.object
            .get("isa")
            .and_then(Value::as_str)
            .unwrap_or("PBXBuildPhase")
    }
}

/// A pointer to a build artifact, shared through the reference group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FileReference {
    pub id: String,
    pub path: String,
    #[serde(skip)]
    pub fields: Fields,
}

impl FileReference {
    /// Reference to the product `product_type` builds from `basename`.
    pub fn new_product(id: impl Into<String>, basename: &str, product_type: ProductType) -> Self {
        let mut fields = object_fields(ISA_FILE_REFERENCE);
        fields.insert(
            "explicitFileType".to_string(),
            Value::String(product_type.file_type().to_string()),
        );
        fields.insert("includeInIndex".to_string(), Value::String("0".to_string()));
        fields.insert(
            "sourceTree".to_string(),
            Value::String("BUILT_PRODUCTS_DIR".to_string()),
        );
        Self {
            id: id.into(),
            path: product_type.product_name(basename),
            fields,
        }
    }

    pub fn file_type(&self) -> Option<&str> {
        self.fields
            .get("explicitFileType")
            .or_else(|| self.fields.get("lastKnownFileType"))
            .and_then(Value::as_str)
    }
}

/// Child of the reference group, in persisted order.
#[derive(Clone, Debug, PartialEq)]
pub enum GroupChild {
    Reference(FileReference),
    /// Id of a child that is not a file reference (e.g. a nested group).
    Opaque(String),
}

/// The shared group holding product references.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceGroup {
    pub id: String,
    pub children: Vec<GroupChild>,
    pub fields: Fields,
}

impl ReferenceGroup {
    pub fn references(&self) -> impl Iterator<Item = &FileReference> {
        self.children.iter().filter_map(|child| match child {
            GroupChild::Reference(reference) => Some(reference),
            GroupChild::Opaque(_) => None,
        })
    }

    pub fn find_by_path(&self, path: &str) -> Option<&FileReference> {
        self.references().find(|reference| reference.path == path)
    }

    pub fn find_by_id(&self, id: &str) -> Option<&FileReference> {
        self.references().find(|reference| reference.id == id)
    }

    pub fn push(&mut self, reference: FileReference) {
        self.children.push(GroupChild::Reference(reference));
    }

    /// Remove the reference with `path`, if present.
    pub fn remove_by_path(&mut self, path: &str) -> Option<FileReference> {
        let index = self.children.iter().position(
            |child| matches!(child, GroupChild::Reference(reference) if reference.path == path),
        )?;
        match self.children.remove(index) {
            GroupChild::Reference(reference) => Some(reference),
            GroupChild::Opaque(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.references().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
