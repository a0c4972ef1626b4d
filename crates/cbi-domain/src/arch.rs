use std::fmt;

use serde::Serialize;

/// CPU architectures a toolchain image can be built for.
///
/// Each variant carries two spellings: the `uname -m` name used on the
/// command line and in archive lists, and the OCI platform string handed to
/// the image builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum ArchitectureId {
    #[serde(rename = "x86_64")]
    Amd64,
    #[serde(rename = "aarch64")]
    Arm64,
}

impl ArchitectureId {
    /// Every architecture the image supports, in build order.
    pub const SUPPORTED: [ArchitectureId; 2] = [ArchitectureId::Amd64, ArchitectureId::Arm64];

    pub fn uname(self) -> &'static str {
        match self {
            ArchitectureId::Amd64 => "x86_64",
            ArchitectureId::Arm64 => "aarch64",
        }
    }

    pub fn platform(self) -> &'static str {
        match self {
            ArchitectureId::Amd64 => "linux/amd64",
            ArchitectureId::Arm64 => "linux/arm64",
        }
    }

    pub fn from_uname(raw: &str) -> Option<Self> {
        Self::SUPPORTED
            .into_iter()
            .find(|arch| arch.uname() == raw.trim())
    }
}

impl fmt::Display for ArchitectureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uname())
    }
}
