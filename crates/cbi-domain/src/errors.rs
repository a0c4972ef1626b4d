use camino::Utf8PathBuf;

use crate::ArchitectureId;

/// Reasons a build plan cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("invalid clang build mode `{0}` (expected SKIP, INSTALL or INSTALL_FROM)")]
    InvalidBuildMode(String),
    #[error("emulation support for {0} is not registered on this host")]
    MissingEmulationSupport(ArchitectureId),
    #[error("no clang archive supplied for {0}")]
    MissingArchivePath(ArchitectureId),
    #[error("clang archive for {arch} escapes the build root: {path}")]
    ArchiveOutsideRoot {
        arch: ArchitectureId,
        path: Utf8PathBuf,
    },
    #[error("clang archive for {arch} does not exist: {path}")]
    ArchiveNotFound {
        arch: ArchitectureId,
        path: Utf8PathBuf,
    },
}

impl PlanError {
    /// Short machine-readable tag used in JSON details.
    pub fn reason(&self) -> &'static str {
        match self {
            PlanError::InvalidBuildMode(_) => "invalid_build_mode",
            PlanError::MissingEmulationSupport(_) => "missing_emulation_support",
            PlanError::MissingArchivePath(_) => "missing_archive_path",
            PlanError::ArchiveOutsideRoot { .. } => "archive_outside_root",
            PlanError::ArchiveNotFound { .. } => "archive_not_found",
        }
    }

    pub fn architecture(&self) -> Option<ArchitectureId> {
        match self {
            PlanError::InvalidBuildMode(_) => None,
            PlanError::MissingEmulationSupport(arch)
            | PlanError::MissingArchivePath(arch)
            | PlanError::ArchiveOutsideRoot { arch, .. }
            | PlanError::ArchiveNotFound { arch, .. } => Some(*arch),
        }
    }
}
