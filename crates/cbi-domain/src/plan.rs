use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::{ArchitectureId, ClangBuildMode};

/// Per-architecture compiler archive locations, relative to the build root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArchiveSpec {
    entries: BTreeMap<ArchitectureId, Utf8PathBuf>,
}

impl ArchiveSpec {
    pub(crate) fn insert(&mut self, arch: ArchitectureId, path: Utf8PathBuf) {
        self.entries.insert(arch, path);
    }

    pub fn get(&self, arch: ArchitectureId) -> Option<&Utf8Path> {
        self.entries.get(&arch).map(Utf8PathBuf::as_path)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArchitectureId, &Utf8Path)> {
        self.entries
            .iter()
            .map(|(arch, path)| (*arch, path.as_path()))
    }

    /// Space-joined `uname:path` pairs ordered by uname spelling.
    pub fn to_build_arg(&self) -> String {
        let mut pairs: Vec<(&str, &Utf8Path)> = self
            .entries
            .iter()
            .map(|(arch, path)| (arch.uname(), path.as_path()))
            .collect();
        pairs.sort_by(|left, right| left.0.cmp(right.0));
        pairs
            .into_iter()
            .map(|(name, path)| format!("{name}:{path}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A validated build configuration. Only the resolver constructs one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildPlan {
    platforms: Vec<ArchitectureId>,
    multiarch_enabled: bool,
    clang_build_mode: ClangBuildMode,
    archive_spec: ArchiveSpec,
}

impl BuildPlan {
    pub(crate) fn new(
        platforms: Vec<ArchitectureId>,
        multiarch_enabled: bool,
        clang_build_mode: ClangBuildMode,
        archive_spec: ArchiveSpec,
    ) -> Self {
        debug_assert!(!platforms.is_empty());
        Self {
            platforms,
            multiarch_enabled,
            clang_build_mode,
            archive_spec,
        }
    }

    pub fn platforms(&self) -> &[ArchitectureId] {
        &self.platforms
    }

    pub fn multiarch_enabled(&self) -> bool {
        self.multiarch_enabled
    }

    pub fn clang_build_mode(&self) -> ClangBuildMode {
        self.clang_build_mode
    }

    pub fn archive_spec(&self) -> &ArchiveSpec {
        &self.archive_spec
    }
}
