use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Result;
use camino::{Utf8Path, Utf8PathBuf};

use crate::config::{Config, EnvSnapshot};
use crate::effects::{Effects, HostSystem, ProcessRunner};
use crate::process::RunOutput;

pub(crate) fn output(code: i32, stdout: &str) -> RunOutput {
    RunOutput {
        code,
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub(crate) fn test_config(pairs: &[(&str, &str)]) -> Config {
    Config::from_snapshot(&EnvSnapshot::testing(pairs), Utf8PathBuf::from("/work"))
}

#[derive(Default)]
pub(crate) struct FakeProcess {
    responses: Vec<(String, RunOutput)>,
    calls: Mutex<Vec<String>>,
    streamed: Mutex<Vec<String>>,
    build_code: i32,
}

impl FakeProcess {
    fn line(program: &str, args: &[String]) -> String {
        let mut parts = vec![program.to_string()];
        parts.extend(args.iter().cloned());
        parts.join(" ")
    }

    fn respond(&self, line: &str) -> RunOutput {
        self.responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map_or_else(|| output(127, ""), |(_, out)| out.clone())
    }
}

impl ProcessRunner for FakeProcess {
    fn run_command(&self, program: &str, args: &[String], _cwd: &Path) -> Result<RunOutput> {
        let line = Self::line(program, args);
        self.calls.lock().expect("calls lock").push(line.clone());
        Ok(self.respond(&line))
    }

    fn run_command_streaming(
        &self,
        program: &str,
        args: &[String],
        _cwd: &Path,
    ) -> Result<RunOutput> {
        let line = Self::line(program, args);
        self.streamed.lock().expect("streamed lock").push(line);
        Ok(output(self.build_code, ""))
    }
}

#[derive(Default)]
pub(crate) struct FakeHost {
    arch: String,
    programs: HashMap<String, PathBuf>,
    paths: HashSet<PathBuf>,
    canonical: HashMap<Utf8PathBuf, Utf8PathBuf>,
    created: Mutex<Vec<PathBuf>>,
}

impl HostSystem for FakeHost {
    fn arch(&self) -> String {
        self.arch.clone()
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        self.programs.get(program).cloned()
    }

    fn exists(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    fn canonicalize(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        self.canonical.get(path).cloned()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.created
            .lock()
            .expect("created lock")
            .push(path.to_path_buf());
        Ok(())
    }
}

/// Host with `buildah` 1.23.1 and `reg` on PATH and an image that is not yet published.
pub(crate) struct FakeEffects {
    process: FakeProcess,
    host: FakeHost,
}

impl FakeEffects {
    pub(crate) fn new(arch: &str) -> Self {
        Self {
            process: FakeProcess::default(),
            host: FakeHost {
                arch: arch.to_string(),
                ..FakeHost::default()
            },
        }
        .with_program("buildah", "/usr/bin/buildah")
        .with_program("reg", "/usr/bin/reg")
        .with_response(
            "/usr/bin/buildah --version",
            output(0, "buildah version 1.23.1 (image-spec 1.0.1)"),
        )
    }

    pub(crate) fn with_program(mut self, name: &str, path: &str) -> Self {
        self.host.programs.insert(name.to_string(), PathBuf::from(path));
        self
    }

    pub(crate) fn without_program(mut self, name: &str) -> Self {
        self.host.programs.remove(name);
        self
    }

    /// Responses match on command-line prefix; the newest registration wins.
    pub(crate) fn with_response(mut self, prefix: &str, out: RunOutput) -> Self {
        self.process.responses.insert(0, (prefix.to_string(), out));
        self
    }

    pub(crate) fn with_path(mut self, path: &str) -> Self {
        self.host.paths.insert(PathBuf::from(path));
        self
    }

    /// `path` exists and resolves to `target` once symlinks are followed.
    pub(crate) fn with_link(mut self, path: &str, target: &str) -> Self {
        self.host
            .canonical
            .insert(Utf8PathBuf::from(path), Utf8PathBuf::from(target));
        self
    }

    pub(crate) fn with_build_code(mut self, code: i32) -> Self {
        self.process.build_code = code;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.process.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn streamed(&self) -> Vec<String> {
        self.process.streamed.lock().expect("streamed lock").clone()
    }

    pub(crate) fn created(&self) -> Vec<PathBuf> {
        self.host.created.lock().expect("created lock").clone()
    }
}

impl Effects for FakeEffects {
    fn process(&self) -> &dyn ProcessRunner {
        &self.process
    }

    fn host(&self) -> &dyn HostSystem {
        &self.host
    }
}
