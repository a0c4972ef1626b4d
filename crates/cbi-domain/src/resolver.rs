//! Build plan resolution.
//!
//! [`resolve_build_plan`] turns raw flags plus a snapshot of host facts into a
//! [`BuildPlan`]. It never runs commands or writes files; every question it
//! asks the host goes through [`PlanProbe`].

use std::collections::BTreeMap;
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::paths::{escapes_root, relative_to_root};
use crate::{ArchitectureId, ArchiveSpec, BuildPlan, ClangBuildMode, PlanError};

/// Read-only host capabilities consulted during resolution.
pub trait PlanProbe {
    /// Whether binaries for `arch` can run on this host through emulation.
    fn emulation_available(&self, arch: ArchitectureId) -> bool;
    /// Whether `path` (relative to the build root) names an existing file.
    fn file_exists(&self, path: &Utf8Path) -> bool;
    /// Absolute, symlink-free form of an absolute `path`, or `None` when it
    /// does not exist.
    fn resolve(&self, path: &Utf8Path) -> Option<Utf8PathBuf>;
}

/// Flags as the user supplied them.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub clang_build_mode: String,
    pub archive_paths: BTreeMap<ArchitectureId, String>,
    pub disable_multiarch: bool,
}

impl PlanRequest {
    fn archive_path(&self, arch: ArchitectureId) -> Option<&str> {
        self.archive_paths
            .get(&arch)
            .map(String::as_str)
            .filter(|raw| !raw.trim().is_empty())
    }
}

/// Where `INSTALL` exports the compiler when no path was given.
#[derive(Debug, Clone)]
pub struct DefaultArchive {
    /// Directory relative to the build root.
    pub directory: Utf8PathBuf,
    pub clang_version: String,
    pub image_id: String,
}

impl DefaultArchive {
    pub fn path_for(&self, arch: ArchitectureId) -> Utf8PathBuf {
        self.directory.join(format!(
            "clang-{}-{}-{}.tar.gz",
            self.clang_version,
            image_slug(&self.image_id),
            arch.uname()
        ))
    }
}

fn image_slug(image: &str) -> String {
    image
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect()
}

/// Host facts that do not change during an invocation.
#[derive(Debug, Clone)]
pub struct PlanEnvironment {
    pub host: ArchitectureId,
    pub supported: Vec<ArchitectureId>,
    pub build_root: Utf8PathBuf,
    pub working_dir: Utf8PathBuf,
    pub default_archive: DefaultArchive,
}

/// Validate the request against the host and produce an immutable plan.
pub fn resolve_build_plan(
    request: &PlanRequest,
    env: &PlanEnvironment,
    probe: &dyn PlanProbe,
) -> Result<BuildPlan, PlanError> {
    let mode = ClangBuildMode::from_str(&request.clang_build_mode)
        .map_err(|_| PlanError::InvalidBuildMode(request.clang_build_mode.clone()))?;

    let mut disable_multiarch = request.disable_multiarch;
    if mode == ClangBuildMode::Install && !disable_multiarch {
        info!("INSTALL builds the compiler natively; multiarch disabled");
        disable_multiarch = true;
    }

    if !disable_multiarch {
        for arch in env.supported.iter().copied().filter(|arch| *arch != env.host) {
            let available = probe.emulation_available(arch);
            debug!(%arch, available, "emulation probe");
            if !available {
                return Err(PlanError::MissingEmulationSupport(arch));
            }
        }
    }

    let platforms = if disable_multiarch {
        vec![env.host]
    } else {
        env.supported.clone()
    };

    let mut archive_spec = ArchiveSpec::default();
    match mode {
        ClangBuildMode::Skip => {
            for arch in request.archive_paths.keys() {
                if request.archive_path(*arch).is_some() {
                    warn!(%arch, "clang archive ignored in SKIP mode");
                }
            }
        }
        ClangBuildMode::Install => {
            let path = match request.archive_path(env.host) {
                Some(raw) => in_root(env, probe, env.host, raw)?,
                None => env.default_archive.path_for(env.host),
            };
            debug!(arch = %env.host, %path, "clang archive export target");
            archive_spec.insert(env.host, path);
            warn_unused(request, &platforms);
        }
        ClangBuildMode::InstallFrom => {
            for arch in platforms.iter().copied() {
                let raw = request
                    .archive_path(arch)
                    .ok_or(PlanError::MissingArchivePath(arch))?;
                let path = in_root(env, probe, arch, raw)?;
                if !probe.file_exists(&path) {
                    return Err(PlanError::ArchiveNotFound { arch, path });
                }
                debug!(%arch, %path, "clang archive import source");
                archive_spec.insert(arch, path);
            }
            warn_unused(request, &platforms);
        }
    }

    Ok(BuildPlan::new(
        platforms,
        !disable_multiarch,
        mode,
        archive_spec,
    ))
}

// Existing files are judged by where their symlinks lead; paths that do not
// exist yet fall back to lexical folding.
fn in_root(
    env: &PlanEnvironment,
    probe: &dyn PlanProbe,
    arch: ArchitectureId,
    raw: &str,
) -> Result<Utf8PathBuf, PlanError> {
    let raw = Utf8Path::new(raw.trim());
    let path = match (resolve_target(env, probe, raw), probe.resolve(&env.build_root)) {
        (Some(target), Some(root)) => {
            debug!(%arch, %target, %root, "archive path resolved on disk");
            relative_to_root(&target, &root, &root)
        }
        _ => relative_to_root(raw, &env.working_dir, &env.build_root),
    };
    if path.as_str().is_empty() || escapes_root(&path) {
        return Err(PlanError::ArchiveOutsideRoot { arch, path });
    }
    Ok(path)
}

fn resolve_target(
    env: &PlanEnvironment,
    probe: &dyn PlanProbe,
    raw: &Utf8Path,
) -> Option<Utf8PathBuf> {
    let anchored = env.working_dir.join(raw);
    if let Some(target) = probe.resolve(&anchored) {
        return Some(target);
    }
    let name = anchored.file_name()?;
    probe
        .resolve(anchored.parent()?)
        .map(|parent| parent.join(name))
}

fn warn_unused(request: &PlanRequest, platforms: &[ArchitectureId]) {
    for arch in request.archive_paths.keys() {
        if !platforms.contains(arch) && request.archive_path(*arch).is_some() {
            warn!(%arch, "clang archive ignored; architecture is not being built");
        }
    }
}
