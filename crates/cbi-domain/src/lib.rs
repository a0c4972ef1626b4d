#![deny(clippy::all, warnings)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

pub mod arch;
pub mod errors;
pub mod mode;
pub mod paths;
pub mod plan;
pub mod resolver;

pub use arch::ArchitectureId;
pub use errors::PlanError;
pub use mode::ClangBuildMode;
pub use paths::relative_to_root;
pub use plan::{ArchiveSpec, BuildPlan};
pub use resolver::{resolve_build_plan, DefaultArchive, PlanEnvironment, PlanProbe, PlanRequest};
