use std::path::PathBuf;

use camino::Utf8PathBuf;
use cbi_domain::BuildPlan;
use serde::Serialize;

/// Fixed inputs of the image build that do not come from the plan.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub program: PathBuf,
    pub image: String,
    pub context: Utf8PathBuf,
    pub containerfile: Option<Utf8PathBuf>,
}

/// The single `buildah bud` invocation for a plan.
#[derive(Debug, Clone, Serialize)]
pub struct BuildCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl BuildCommand {
    /// Serialize a plan into builder arguments. The plan is consumed here.
    #[must_use]
    pub fn from_plan(plan: BuildPlan, settings: &BuildSettings) -> Self {
        let mut args = vec!["bud".to_string()];
        for arch in plan.platforms() {
            args.push("--platform".to_string());
            args.push(arch.platform().to_string());
        }
        args.push("--squash".to_string());
        args.push("--no-cache".to_string());
        args.push("--pull-always".to_string());
        args.push("--build-arg".to_string());
        args.push(format!("CLANG_BUILD={}", plan.clang_build_mode()));
        if !plan.archive_spec().is_empty() {
            args.push("--build-arg".to_string());
            args.push(format!("CLANG_ARCHIVES={}", plan.archive_spec().to_build_arg()));
        }
        if let Some(file) = &settings.containerfile {
            args.push("--file".to_string());
            args.push(file.to_string());
        }
        args.push("--manifest".to_string());
        args.push(settings.image.clone());
        args.push(settings.context.to_string());
        Self {
            program: settings.program.to_string_lossy().to_string(),
            args,
        }
    }

    /// One-line, shell-quoted form for logs and `--dry-run`.
    #[must_use]
    pub fn render(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(shell_quote)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn shell_quote(word: &str) -> String {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "-_./:=@,+%".contains(ch));
    if plain {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
