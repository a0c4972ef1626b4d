use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};

use crate::process::{run_command, run_command_streaming, RunOutput};

pub trait ProcessRunner: Send + Sync {
    fn run_command(&self, program: &str, args: &[String], cwd: &Path) -> Result<RunOutput>;
    fn run_command_streaming(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<RunOutput>;
}

pub trait HostSystem: Send + Sync {
    /// `uname -m` spelling of the running machine.
    fn arch(&self) -> String;
    fn which(&self, program: &str) -> Option<PathBuf>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    /// Absolute path with every symlink followed; `None` if it does not exist.
    fn canonicalize(&self, path: &Utf8Path) -> Option<Utf8PathBuf>;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

pub trait Effects: Send + Sync {
    fn process(&self) -> &dyn ProcessRunner;
    fn host(&self) -> &dyn HostSystem;
}

pub struct SystemEffects {
    process: Arc<SystemProcessRunner>,
    host: Arc<SystemHost>,
}

impl SystemEffects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            process: Arc::new(SystemProcessRunner),
            host: Arc::new(SystemHost),
        }
    }
}

impl Default for SystemEffects {
    fn default() -> Self {
        Self::new()
    }
}

impl Effects for SystemEffects {
    fn process(&self) -> &dyn ProcessRunner {
        self.process.as_ref()
    }

    fn host(&self) -> &dyn HostSystem {
        self.host.as_ref()
    }
}

struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run_command(&self, program: &str, args: &[String], cwd: &Path) -> Result<RunOutput> {
        run_command(program, args, cwd)
    }

    fn run_command_streaming(
        &self,
        program: &str,
        args: &[String],
        cwd: &Path,
    ) -> Result<RunOutput> {
        run_command_streaming(program, args, cwd)
    }
}

struct SystemHost;

impl HostSystem for SystemHost {
    fn arch(&self) -> String {
        std::env::consts::ARCH.to_string()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
            let candidate = PathBuf::from(program);
            return candidate.is_file().then_some(candidate);
        }
        which::which(program).ok()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn canonicalize(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        path.canonicalize_utf8().ok()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("failed to create {}", path.display()))
    }
}
