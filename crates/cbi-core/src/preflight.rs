//! Host checks that run before a plan is resolved.

use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use cbi_domain::{ArchitectureId, PlanProbe};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::effects::{Effects, HostSystem};
use crate::errors::PrepError;
use crate::version::ToolVersion;

#[derive(Debug, Clone, Copy)]
pub struct ToolRequirement {
    pub name: &'static str,
    pub min_version: Option<ToolVersion>,
}

/// Multi-platform `bud --manifest` needs buildah 1.19.3.
pub const BUILDAH: ToolRequirement = ToolRequirement {
    name: "buildah",
    min_version: Some(ToolVersion::new(1, 19, 3)),
};

pub const REG: ToolRequirement = ToolRequirement {
    name: "reg",
    min_version: None,
};

const VERSION_ARGS: [&str; 2] = ["--version", "version"];

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTool {
    pub name: &'static str,
    pub program: PathBuf,
    pub version: Option<ToolVersion>,
}

impl ResolvedTool {
    #[must_use]
    pub fn program_str(&self) -> String {
        self.program.to_string_lossy().to_string()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Toolset {
    pub buildah: ResolvedTool,
    pub reg: ResolvedTool,
}

/// Locate every required tool and verify minimum versions.
///
/// # Errors
/// Returns [`PrepError::ToolMissing`] for the first tool that is absent or too old.
pub fn check_tools(effects: &dyn Effects, config: &Config) -> Result<Toolset, PrepError> {
    let buildah = check_tool(effects, &BUILDAH, config.tools.buildah.as_deref(), config)?;
    let reg = check_tool(effects, &REG, config.tools.reg.as_deref(), config)?;
    Ok(Toolset { buildah, reg })
}

fn check_tool(
    effects: &dyn Effects,
    requirement: &ToolRequirement,
    program_override: Option<&str>,
    config: &Config,
) -> Result<ResolvedTool, PrepError> {
    let lookup = program_override.unwrap_or(requirement.name);
    let Some(program) = effects.host().which(lookup) else {
        return Err(PrepError::ToolMissing {
            name: requirement.name.to_string(),
            min_version: requirement.min_version,
            found: None,
        });
    };
    debug!(tool = requirement.name, program = %program.display(), "located tool");

    let Some(minimum) = requirement.min_version else {
        return Ok(ResolvedTool {
            name: requirement.name,
            program,
            version: None,
        });
    };

    let version = probe_version(effects, &program, config);
    match version {
        Some(found) if found >= minimum => {
            debug!(tool = requirement.name, %found, %minimum, "tool version accepted");
            Ok(ResolvedTool {
                name: requirement.name,
                program,
                version: Some(found),
            })
        }
        other => Err(PrepError::ToolMissing {
            name: requirement.name.to_string(),
            min_version: Some(minimum),
            found: Some(other.map_or_else(|| "an unknown version".to_string(), |v| v.to_string())),
        }),
    }
}

fn probe_version(effects: &dyn Effects, program: &Path, config: &Config) -> Option<ToolVersion> {
    let program = program.to_string_lossy();
    for flag in VERSION_ARGS {
        let output = match effects.process().run_command(
            &program,
            &[flag.to_string()],
            config.working_dir.as_std_path(),
        ) {
            Ok(output) => output,
            Err(err) => {
                debug!(%program, flag, error = %err, "version probe failed");
                continue;
            }
        };
        if !output.success() {
            continue;
        }
        let text = format!("{}\n{}", output.stdout, output.stderr);
        if let Some(version) = ToolVersion::find_in(&text) {
            return Some(version);
        }
    }
    None
}

/// Refuse to build over an image that already exists in its registry.
///
/// # Errors
/// Returns [`PrepError::ImageAlreadyPublished`] when `reg digest` resolves the
/// image, or [`PrepError::Host`] when `reg` cannot be run at all.
pub fn ensure_image_unpublished(
    effects: &dyn Effects,
    reg: &ResolvedTool,
    config: &Config,
) -> Result<(), PrepError> {
    if config.skip_registry_check {
        warn!(image = %config.image, "registry check skipped (CBI_SKIP_REGISTRY_CHECK=1)");
        return Ok(());
    }
    let output = effects
        .process()
        .run_command(
            &reg.program_str(),
            &["digest".to_string(), config.image.clone()],
            config.working_dir.as_std_path(),
        )
        .map_err(PrepError::Host)?;
    let digest = output.stdout.trim();
    if output.success() && !digest.is_empty() {
        debug!(image = %config.image, digest, "image digest found");
        return Err(PrepError::ImageAlreadyPublished(config.image.clone()));
    }
    debug!(
        image = %config.image,
        code = output.code,
        stderr = output.stderr.trim(),
        "image not found in registry"
    );
    Ok(())
}

/// Map the running machine onto a supported architecture.
///
/// # Errors
/// Returns [`PrepError::UnsupportedHost`] for machines outside
/// [`ArchitectureId::SUPPORTED`].
pub fn detect_host(effects: &dyn Effects) -> Result<ArchitectureId, PrepError> {
    let raw = effects.host().arch();
    ArchitectureId::from_uname(&raw).ok_or(PrepError::UnsupportedHost(raw))
}

/// Answers the resolver's questions from the live host.
pub struct HostPlanProbe<'a> {
    host: &'a dyn HostSystem,
    build_root: &'a Utf8Path,
    binfmt_dir: &'a Utf8Path,
}

impl<'a> HostPlanProbe<'a> {
    #[must_use]
    pub fn new(host: &'a dyn HostSystem, config: &'a Config) -> Self {
        Self {
            host,
            build_root: &config.build_root,
            binfmt_dir: &config.binfmt_dir,
        }
    }
}

impl PlanProbe for HostPlanProbe<'_> {
    // qemu-user-static registers one binfmt_misc entry per foreign architecture.
    fn emulation_available(&self, arch: ArchitectureId) -> bool {
        let marker = self.binfmt_dir.join(format!("qemu-{}", arch.uname()));
        self.host.exists(marker.as_std_path())
    }

    fn file_exists(&self, path: &Utf8Path) -> bool {
        self.host.is_file(self.build_root.join(path).as_std_path())
    }

    fn resolve(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.host.canonicalize(path)
    }
}
