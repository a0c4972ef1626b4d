use clap::{ArgAction, Parser};

pub const CBI_HELP_TEMPLATE: &str =
    "{before-help}\nUsage:\n    {usage}\n\nOptions:\n{options}\n{after-help}";

pub const CBI_BEFORE_HELP: &str = concat!(
    "cbi ",
    env!("CARGO_PKG_VERSION"),
    " – compiler toolchain image builder\n\n",
    "Checks buildah and reg, refuses to overwrite a published image, resolves\n",
    "the target platforms and clang archives, then runs one `buildah bud`.\n",
);

pub const CBI_AFTER_HELP: &str = concat!(
    "\x1b[1;36mExamples\x1b[0m\n",
    "  cbi --disable-multiarch\n",
    "  cbi --clang-build-mode INSTALL\n",
    "  cbi --clang-build-mode INSTALL_FROM \\\n",
    "      --clang-archive-x86_64 clang-archives/clang-x86_64.tar.gz \\\n",
    "      --clang-archive-aarch64 clang-archives/clang-aarch64.tar.gz\n\n",
    "\x1b[1;36mEnvironment\x1b[0m\n",
    "  CBI_IMAGE, CBI_CLANG_VERSION, CBI_BUILD_ROOT, CBI_CONTEXT, CBI_CONTAINERFILE,\n",
    "  CBI_ARCHIVE_DIR, CBI_BINFMT_DIR, CBI_BUILDAH, CBI_REG, CBI_SKIP_REGISTRY_CHECK\n",
);

#[derive(Parser, Debug)]
#[command(
    name = "cbi",
    author,
    version,
    before_help = CBI_BEFORE_HELP,
    after_help = CBI_AFTER_HELP,
    help_template = CBI_HELP_TEMPLATE
)]
#[allow(clippy::struct_excessive_bools)]
pub struct CbiCli {
    #[arg(
        long,
        value_name = "SKIP|INSTALL|INSTALL_FROM",
        default_value = "SKIP",
        help = "Skip the optimized clang, build and export it, or import prebuilt archives"
    )]
    pub clang_build_mode: String,
    #[arg(
        long = "clang-archive-x86_64",
        value_name = "PATH",
        help = "x86_64 clang archive (INSTALL_FROM input, INSTALL output)"
    )]
    pub clang_archive_x86_64: Option<String>,
    #[arg(
        long = "clang-archive-aarch64",
        value_name = "PATH",
        help = "aarch64 clang archive (INSTALL_FROM input, INSTALL output)"
    )]
    pub clang_archive_aarch64: Option<String>,
    #[arg(long, help = "Build for the host architecture only")]
    pub disable_multiarch: bool,
    #[arg(long, help = "Validate and print the buildah command without running it")]
    pub dry_run: bool,
    #[arg(long, help = "Emit {status,message,details} JSON envelopes")]
    pub json: bool,
    #[arg(short, long, help = "Suppress human output (errors still print to stderr)")]
    pub quiet: bool,
    #[arg(short, long, action = ArgAction::Count, help = "Increase logging (-vv reaches trace)")]
    pub verbose: u8,
    #[arg(long, help = "Force trace logging regardless of -v/-q")]
    pub trace: bool,
    #[arg(long, help = "Disable colored human output")]
    pub no_color: bool,
}
