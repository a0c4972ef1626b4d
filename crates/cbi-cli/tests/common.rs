#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::assert::Assert;
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// A scratch build root with stand-in `buildah` and `reg` executables.
pub struct Workspace {
    pub temp: TempDir,
    pub root: PathBuf,
    pub binfmt: PathBuf,
    pub bud_log: PathBuf,
}

impl Workspace {
    pub fn new(prefix: &str) -> Self {
        let temp = tempfile::Builder::new()
            .prefix(prefix)
            .tempdir()
            .expect("tempdir");
        let root = temp.path().join("project");
        let binfmt = temp.path().join("binfmt_misc");
        let bin = temp.path().join("bin");
        for dir in [&root, &binfmt, &bin] {
            fs::create_dir_all(dir).expect("create dir");
        }
        let bud_log = temp.path().join("bud.log");
        write_script(
            &bin.join("buildah"),
            &format!(
                "#!/bin/sh\n\
                 case \"$1\" in\n\
                 --version) echo \"buildah version ${{FAKE_BUILDAH_VERSION:-1.23.1}} (image-spec 1.0.1)\" ;;\n\
                 bud) printf '%s\\n' \"$@\" > '{}'; exit ${{FAKE_BUILD_EXIT:-0}} ;;\n\
                 *) exit 2 ;;\n\
                 esac\n",
                bud_log.display()
            ),
        );
        write_script(
            &bin.join("reg"),
            "#!/bin/sh\n\
             if [ -n \"$FAKE_REG_DIGEST\" ]; then echo \"$FAKE_REG_DIGEST\"; exit 0; fi\n\
             echo 'manifest unknown' >&2\n\
             exit 1\n",
        );
        Self {
            temp,
            root,
            binfmt,
            bud_log,
        }
    }

    pub fn enable_emulation(&self, uname: &str) {
        fs::write(self.binfmt.join(format!("qemu-{uname}")), "enabled\n").expect("marker");
    }

    pub fn touch(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("archive dir");
        }
        fs::write(path, b"archive").expect("archive");
    }

    /// Place a symlink at `relative` under the root pointing at `target`.
    #[cfg(unix)]
    pub fn link(&self, relative: &str, target: &Path) {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("link dir");
        }
        std::os::unix::fs::symlink(target, path).expect("symlink");
    }

    pub fn cbi(&self) -> Command {
        let bin = self.temp.path().join("bin");
        let mut cmd = cargo_bin_cmd!("cbi");
        cmd.current_dir(&self.root)
            .env_clear()
            .env("PATH", "/usr/bin:/bin")
            .env("CBI_BUILDAH", bin.join("buildah"))
            .env("CBI_REG", bin.join("reg"))
            .env("CBI_BINFMT_DIR", &self.binfmt)
            .env("CBI_CLANG_VERSION", "17")
            .env("NO_COLOR", "1");
        cmd
    }

    pub fn bud_args(&self) -> Vec<String> {
        fs::read_to_string(&self.bud_log)
            .expect("bud log")
            .lines()
            .map(ToOwned::to_owned)
            .collect()
    }
}

/// `uname -m` of the test host when cbi can build on it.
pub fn host_uname() -> Option<&'static str> {
    match std::env::consts::ARCH {
        "x86_64" => Some("x86_64"),
        "aarch64" => Some("aarch64"),
        _ => None,
    }
}

pub fn foreign_uname(host: &str) -> &'static str {
    if host == "x86_64" {
        "aarch64"
    } else {
        "x86_64"
    }
}

pub fn parse_json(assert: &Assert) -> Value {
    serde_json::from_slice(&assert.get_output().stdout).expect("valid json")
}

pub fn stderr_text(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).into_owned()
}

#[cfg(unix)]
fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    fs::write(path, body).expect("write script");
    let mut perms = fs::metadata(path).expect("metadata").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod");
}

#[cfg(not(unix))]
fn write_script(path: &Path, body: &str) {
    fs::write(path, body).expect("write script");
}
