use serde::Serialize;
use strum::{Display, EnumString};

/// How the optimized compiler is handled during the image build.
///
/// Names are matched exactly; `install` or `Install` are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum ClangBuildMode {
    #[strum(serialize = "SKIP")]
    #[serde(rename = "SKIP")]
    Skip,
    #[strum(serialize = "INSTALL")]
    #[serde(rename = "INSTALL")]
    Install,
    #[strum(serialize = "INSTALL_FROM")]
    #[serde(rename = "INSTALL_FROM")]
    InstallFrom,
}

impl ClangBuildMode {
    pub const NAMES: [&'static str; 3] = ["SKIP", "INSTALL", "INSTALL_FROM"];

    pub fn uses_archives(self) -> bool {
        matches!(self, ClangBuildMode::Install | ClangBuildMode::InstallFrom)
    }
}
