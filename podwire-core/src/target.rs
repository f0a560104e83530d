//! Targets produced upstream and the products they link as.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of artifact a target builds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    DynamicFramework,
    StaticLibrary,
}

impl ProductType {
    /// File name of the product built from `basename`.
    pub fn product_name(self, basename: &str) -> String {
        match self {
            ProductType::DynamicFramework => format!("{basename}.framework"),
            ProductType::StaticLibrary => format!("lib{basename}.a"),
        }
    }

    /// Explicit file type recorded on the product's file reference.
    pub fn file_type(self) -> &'static str {
        match self {
            ProductType::DynamicFramework => "wrapper.framework",
            ProductType::StaticLibrary => "archive.ar",
        }
    }

    /// The product type of the other linking mode.
    pub fn alternate(self) -> Self {
        match self {
            ProductType::DynamicFramework => ProductType::StaticLibrary,
            ProductType::StaticLibrary => ProductType::DynamicFramework,
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductType::DynamicFramework => write!(f, "framework"),
            ProductType::StaticLibrary => write!(f, "static library"),
        }
    }
}

/// A logical build unit whose product gets wired into consuming nodes.
///
/// Immutable for the duration of one integration run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Display name, e.g. `Pods-App`.
    pub name: String,
    /// Product name without prefix or extension, e.g. `Pods_App`.
    pub product_basename: String,
    /// Whether the product links as a dynamic framework.
    #[serde(default)]
    pub links_as_framework: bool,
    /// Path of the generated copy-resources script, as referenced from the
    /// consuming project.
    pub copy_resources_script: String,
    /// Path of the consuming project directory (e.g. `App.xcodeproj`).
    #[serde(rename = "project")]
    pub project_path: PathBuf,
    /// Names of the project nodes that link against this target's product.
    #[serde(default)]
    pub consumers: Vec<String>,
}

impl Target {
    pub fn product_type(&self) -> ProductType {
        if self.links_as_framework {
            ProductType::DynamicFramework
        } else {
            ProductType::StaticLibrary
        }
    }

    /// Name of the artifact this target currently produces.
    pub fn product_name(&self) -> String {
        self.product_type().product_name(&self.product_basename)
    }

    /// Name the artifact would have under the other linking mode.
    ///
    /// A reference with this name in the project is left over from an
    /// earlier integration and has to be removed.
    pub fn alternate_product_name(&self) -> String {
        self.product_type()
            .alternate()
            .product_name(&self.product_basename)
    }
}
