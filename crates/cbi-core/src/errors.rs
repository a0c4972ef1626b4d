use cbi_domain::{ArchitectureId, PlanError};
use serde_json::{json, Value};

use crate::outcome::ExecutionOutcome;
use crate::version::ToolVersion;

const EMULATION_HINT: &str =
    "register qemu-user-static: podman run --rm --privileged docker.io/multiarch/qemu-user-static --reset -p yes (or pass --disable-multiarch)";

/// Everything that stops an invocation before the image builder runs.
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    #[error("{} is required but {}", requirement(.name, .min_version), found_text(.found))]
    ToolMissing {
        name: String,
        min_version: Option<ToolVersion>,
        found: Option<String>,
    },
    #[error("image {0} is already published; refusing to overwrite it")]
    ImageAlreadyPublished(String),
    #[error("host architecture {0} is not supported")]
    UnsupportedHost(String),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("{0:#}")]
    Host(anyhow::Error),
}

fn requirement(name: &str, min_version: &Option<ToolVersion>) -> String {
    match min_version {
        Some(min) => format!("{name} >= {min}"),
        None => name.to_string(),
    }
}

fn found_text(found: &Option<String>) -> String {
    match found {
        Some(version) => format!("found {version}"),
        None => "it was not found".to_string(),
    }
}

impl PrepError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            PrepError::ToolMissing { .. } => "CBI101",
            PrepError::ImageAlreadyPublished(_) => "CBI102",
            PrepError::UnsupportedHost(_) => "CBI103",
            PrepError::Plan(PlanError::InvalidBuildMode(_)) => "CBI110",
            PrepError::Plan(PlanError::MissingEmulationSupport(_)) => "CBI111",
            PrepError::Plan(PlanError::MissingArchivePath(_)) => "CBI112",
            PrepError::Plan(PlanError::ArchiveOutsideRoot { .. }) => "CBI113",
            PrepError::Plan(PlanError::ArchiveNotFound { .. }) => "CBI114",
            PrepError::Host(_) => "CBI120",
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            PrepError::ToolMissing { .. } => "tool_missing",
            PrepError::ImageAlreadyPublished(_) => "image_already_published",
            PrepError::UnsupportedHost(_) => "unsupported_host",
            PrepError::Plan(err) => err.reason(),
            PrepError::Host(_) => "host_failure",
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            PrepError::ToolMissing { name, .. } => Some(format!(
                "install or upgrade {name}, or point CBI_{} at it",
                name.to_ascii_uppercase()
            )),
            PrepError::ImageAlreadyPublished(_) => {
                Some("bump CBI_CLANG_VERSION or set CBI_IMAGE to a new tag".to_string())
            }
            PrepError::Plan(PlanError::InvalidBuildMode(_)) => {
                Some("use one of SKIP, INSTALL, INSTALL_FROM".to_string())
            }
            PrepError::Plan(PlanError::MissingEmulationSupport(_)) => {
                Some(EMULATION_HINT.to_string())
            }
            PrepError::Plan(PlanError::MissingArchivePath(arch)) => {
                Some(format!("pass --clang-archive-{} <PATH>", arch.uname()))
            }
            PrepError::Plan(PlanError::ArchiveOutsideRoot { .. }) => {
                Some("move the archive under the build root (CBI_BUILD_ROOT)".to_string())
            }
            PrepError::UnsupportedHost(_)
            | PrepError::Plan(PlanError::ArchiveNotFound { .. })
            | PrepError::Host(_) => None,
        }
    }

    fn extra_details(&self) -> Value {
        match self {
            PrepError::ToolMissing {
                name,
                min_version,
                found,
            } => json!({
                "tool": name,
                "min_version": min_version.map(|v| v.to_string()),
                "found": found,
            }),
            PrepError::ImageAlreadyPublished(image) => json!({ "image": image }),
            PrepError::UnsupportedHost(arch) => json!({
                "host": arch,
                "supported": ArchitectureId::SUPPORTED.map(ArchitectureId::uname),
            }),
            PrepError::Plan(PlanError::InvalidBuildMode(value)) => json!({ "value": value }),
            PrepError::Plan(
                PlanError::ArchiveOutsideRoot { arch, path } | PlanError::ArchiveNotFound { arch, path },
            ) => json!({ "arch": arch, "path": path }),
            PrepError::Plan(err) => json!({ "arch": err.architecture() }),
            PrepError::Host(err) => json!({ "error": format!("{err:#}") }),
        }
    }

    /// Render as a command outcome carrying `code`, `reason` and an optional `hint`.
    #[must_use]
    pub fn into_outcome(self) -> ExecutionOutcome {
        let mut details = self.extra_details();
        if let Value::Object(ref mut map) = details {
            map.insert("code".into(), Value::String(self.code().to_string()));
            map.insert("reason".into(), Value::String(self.reason().to_string()));
            if let Some(hint) = self.hint() {
                map.insert("hint".into(), Value::String(hint));
            }
        }
        let message = self.to_string();
        match self {
            PrepError::Host(_) => ExecutionOutcome::failure(message, details),
            _ => ExecutionOutcome::user_error(message, details),
        }
    }
}
