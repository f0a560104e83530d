//! Podwire core - target integration for Xcode project graphs.
//!
//! This crate wires the build products of generated dependency targets into
//! the consuming targets of an existing Xcode project: it links the product,
//! installs a copy-resources phase and a manifest check phase, and persists
//! the project only when something changed.
//!
//! # Features
//!
//! - **Idempotent integration**: rerunning against an integrated project changes nothing
//! - **Linking mode switches**: stale framework or static-library references are replaced
//! - **Legacy script repair**: old copy-resources scripts are rewritten in place
//! - **Lossless persistence**: objects the integrator does not model survive a save
//!
//! # Usage
//!
//! ```no_run
//! use podwire_core::{MessageLog, Target, TargetIntegrator};
//!
//! let target = Target {
//!     name: "Pods".to_string(),
//!     product_basename: "Pods".to_string(),
//!     links_as_framework: true,
//!     copy_resources_script: "Pods/Target Support Files/Pods/Pods-resources.sh".to_string(),
//!     project_path: "App.xcodeproj".into(),
//!     consumers: vec!["App".to_string()],
//! };
//!
//! let mut log = MessageLog::new();
//! let report = TargetIntegrator::new(target).integrate(&mut log)?;
//! println!("dirty: {}", report.dirty);
//! # Ok::<(), podwire_core::IntegrationError>(())
//! ```

pub mod error;
pub mod integrator;
pub mod phases;
pub mod project;
pub mod reference;
pub mod report;
pub mod target;

#[cfg(test)]
mod testing;

pub use error::{GraphError, IntegrationError, Result};
pub use integrator::{
    IntegrationContext, IntegrationPlan, IntegrationReport, Persistence, Step, StepResult,
    TargetIntegrator,
};
pub use project::{GraphOpener, PbxProject, PbxprojOpener, ProjectGraph};
pub use report::{MessageLog, Reporter, TracingReporter};
pub use target::{ProductType, Target};
