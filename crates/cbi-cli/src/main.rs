use std::collections::BTreeMap;

use atty::Stream;
use cbi_core::{
    format_status_message, prepare_build, to_json_response, ArchitectureId, BuildRequest,
    CommandStatus, Config, ExecutionOutcome, PlanRequest, SystemEffects, CBI_VERSION,
};
use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;

mod cli;
mod style;

use cli::CbiCli;
use style::Style;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = match CbiCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => exit_for_parse_error(&err),
    };
    init_tracing(cli.trace, cli.verbose, cli.quiet);
    tracing::debug!(version = CBI_VERSION, "cbi starting");

    let config = Config::from_env().map_err(|err| eyre!("{err:#}"))?;
    let effects = SystemEffects::new();
    let request = build_request(&cli);
    let outcome = prepare_build(&effects, &config, &request);
    let code = emit_output(&cli, &outcome)?;

    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

// Help and version exit 0; any other parse problem prints usage and exits 1.
fn exit_for_parse_error(err: &clap::Error) -> ! {
    let _ = err.print();
    std::process::exit(i32::from(err.use_stderr()));
}

fn init_tracing(trace: bool, verbose: u8, quiet: bool) {
    let level = if trace {
        "trace"
    } else if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = format!("cbi={level},cbi_core={level},cbi_domain={level}");
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn build_request(cli: &CbiCli) -> BuildRequest {
    let mut archive_paths = BTreeMap::new();
    for (arch, raw) in [
        (ArchitectureId::Amd64, &cli.clang_archive_x86_64),
        (ArchitectureId::Arm64, &cli.clang_archive_aarch64),
    ] {
        if let Some(path) = raw {
            archive_paths.insert(arch, path.clone());
        }
    }
    BuildRequest {
        plan: PlanRequest {
            clang_build_mode: cli.clang_build_mode.clone(),
            archive_paths,
            disable_multiarch: cli.disable_multiarch,
        },
        dry_run: cli.dry_run,
    }
}

fn emit_output(cli: &CbiCli, outcome: &ExecutionOutcome) -> Result<i32> {
    let code = outcome.exit_code();
    let style = Style::new(cli.no_color, atty::is(Stream::Stdout));

    if cli.json {
        let payload = to_json_response(outcome);
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(code);
    }

    let message = format_status_message(&outcome.message);
    if outcome.status == CommandStatus::Ok {
        if !cli.quiet {
            println!("{}", style.status(&outcome.status, &message));
            if let Some(table) = render_plan_table(&style, &outcome.details) {
                println!("{table}");
            }
        }
    } else {
        eprintln!("{}", style.status(&outcome.status, &message));
        if let Some(hint) = outcome.hint() {
            eprintln!("{}", style.info(&format!("Hint: {hint}")));
        }
    }

    Ok(code)
}

struct PlatformRow {
    arch: String,
    platform: String,
    archive: String,
}

fn render_plan_table(style: &Style, details: &Value) -> Option<String> {
    let plan = details.get("plan")?;
    let platforms = plan.get("platforms")?.as_array()?;
    let archives = plan.get("archive_spec").and_then(Value::as_object);

    let mut rows = Vec::new();
    for entry in platforms {
        let uname = entry.as_str()?;
        let arch = ArchitectureId::from_uname(uname)?;
        rows.push(PlatformRow {
            arch: uname.to_string(),
            platform: arch.platform().to_string(),
            archive: archives
                .and_then(|map| map.get(uname))
                .and_then(Value::as_str)
                .unwrap_or("-")
                .to_string(),
        });
    }
    if rows.is_empty() {
        return None;
    }
    Some(format_platform_table(style, &rows))
}

fn format_platform_table(style: &Style, rows: &[PlatformRow]) -> String {
    let headers = ["Arch", "Platform", "Clang archive"];
    let mut widths = [headers[0].len(), headers[1].len(), headers[2].len()];
    for row in rows {
        widths[0] = widths[0].max(row.arch.len());
        widths[1] = widths[1].max(row.platform.len());
        widths[2] = widths[2].max(row.archive.len());
    }

    let header_line = format!(
        "{:<width0$}  {:<width1$}  {:<width2$}",
        headers[0],
        headers[1],
        headers[2],
        width0 = widths[0],
        width1 = widths[1],
        width2 = widths[2],
    );

    let mut lines = Vec::new();
    lines.push(style.table_header(header_line.trim_end()));
    lines.push(format!(
        "{:-<width0$}  {:-<width1$}  {:-<width2$}",
        "",
        "",
        "",
        width0 = widths[0],
        width1 = widths[1],
        width2 = widths[2],
    ));
    for row in rows {
        let line = format!(
            "{:<width0$}  {:<width1$}  {:<width2$}",
            row.arch,
            row.platform,
            row.archive,
            width0 = widths[0],
            width1 = widths[1],
            width2 = widths[2],
        );
        lines.push(line.trim_end().to_string());
    }
    lines.join("\n")
}
