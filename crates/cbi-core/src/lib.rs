#![deny(clippy::all, warnings)]

mod build;
mod command;
mod config;
mod effects;
mod errors;
mod outcome;
mod preflight;
mod process;
mod version;

#[cfg(test)]
mod testing;

pub use crate::build::{prepare_build, BuildRequest};
pub use crate::command::{BuildCommand, BuildSettings};
pub use crate::config::{Config, ToolOverrides};
pub use crate::effects::{Effects, HostSystem, ProcessRunner, SystemEffects};
pub use crate::errors::PrepError;
pub use crate::outcome::{format_status_message, to_json_response, CommandStatus, ExecutionOutcome};
pub use crate::preflight::{
    check_tools, detect_host, ensure_image_unpublished, HostPlanProbe, ResolvedTool,
    ToolRequirement, Toolset, BUILDAH, REG,
};
pub use crate::process::RunOutput;
pub use crate::version::ToolVersion;

pub use cbi_domain::{ArchitectureId, ClangBuildMode, PlanRequest};

pub const CBI_VERSION: &str = env!("CARGO_PKG_VERSION");
