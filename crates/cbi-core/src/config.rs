//! Environment-driven settings for a build invocation.

use std::collections::HashMap;
use std::env;

use anyhow::{anyhow, Context};
use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

pub const DEFAULT_CLANG_VERSION: &str = "main";
pub const DEFAULT_IMAGE_REPOSITORY: &str = "localhost/clang-toolchain";
pub const DEFAULT_ARCHIVE_DIR: &str = "clang-archives";
pub const DEFAULT_BINFMT_DIR: &str = "/proc/sys/fs/binfmt_misc";

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn flag_is_enabled(&self, key: &str) -> bool {
        matches!(self.vars.get(key).map(String::as_str), Some("1"))
    }

    /// Non-blank value of `key`, trimmed.
    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolOverrides {
    pub buildah: Option<String>,
    pub reg: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Config {
    pub(crate) image: String,
    pub(crate) clang_version: String,
    pub(crate) working_dir: Utf8PathBuf,
    pub(crate) build_root: Utf8PathBuf,
    pub(crate) context: Utf8PathBuf,
    pub(crate) containerfile: Option<Utf8PathBuf>,
    pub(crate) archive_dir: Utf8PathBuf,
    pub(crate) binfmt_dir: Utf8PathBuf,
    pub(crate) tools: ToolOverrides,
    pub(crate) skip_registry_check: bool,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    /// Returns an error if the working directory cannot be read or is not UTF-8.
    pub fn from_env() -> anyhow::Result<Self> {
        let snapshot = EnvSnapshot::capture();
        let cwd = env::current_dir().context("failed to read the working directory")?;
        let working_dir = Utf8PathBuf::try_from(cwd)
            .map_err(|err| anyhow!("working directory is not UTF-8: {}", err.as_path().display()))?;
        Ok(Self::from_snapshot(&snapshot, working_dir))
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot, working_dir: Utf8PathBuf) -> Self {
        let clang_version = snapshot
            .var("CBI_CLANG_VERSION")
            .unwrap_or(DEFAULT_CLANG_VERSION)
            .to_string();
        let image = snapshot.var("CBI_IMAGE").map_or_else(
            || format!("{DEFAULT_IMAGE_REPOSITORY}:{clang_version}"),
            ToOwned::to_owned,
        );
        let build_root = snapshot
            .var("CBI_BUILD_ROOT")
            .map_or_else(|| working_dir.clone(), |raw| anchor(&working_dir, raw));
        let context = snapshot
            .var("CBI_CONTEXT")
            .map_or_else(|| build_root.clone(), |raw| anchor(&working_dir, raw));
        Self {
            image,
            clang_version,
            build_root,
            context,
            containerfile: snapshot
                .var("CBI_CONTAINERFILE")
                .map(|raw| anchor(&working_dir, raw)),
            archive_dir: Utf8PathBuf::from(
                snapshot.var("CBI_ARCHIVE_DIR").unwrap_or(DEFAULT_ARCHIVE_DIR),
            ),
            binfmt_dir: Utf8PathBuf::from(
                snapshot.var("CBI_BINFMT_DIR").unwrap_or(DEFAULT_BINFMT_DIR),
            ),
            tools: ToolOverrides {
                buildah: snapshot.var("CBI_BUILDAH").map(ToOwned::to_owned),
                reg: snapshot.var("CBI_REG").map(ToOwned::to_owned),
            },
            skip_registry_check: snapshot.flag_is_enabled("CBI_SKIP_REGISTRY_CHECK"),
            working_dir,
        }
    }

    #[must_use]
    pub fn image(&self) -> &str {
        &self.image
    }

    #[must_use]
    pub fn clang_version(&self) -> &str {
        &self.clang_version
    }

    #[must_use]
    pub fn build_root(&self) -> &Utf8Path {
        &self.build_root
    }

    #[must_use]
    pub fn context(&self) -> &Utf8Path {
        &self.context
    }

    #[must_use]
    pub fn working_dir(&self) -> &Utf8Path {
        &self.working_dir
    }
}

fn anchor(base: &Utf8Path, raw: &str) -> Utf8PathBuf {
    let path = Utf8Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
