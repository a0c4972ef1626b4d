//! `cbi build`: preflight, plan, and the single builder invocation.

use cbi_domain::{
    resolve_build_plan, ArchitectureId, ClangBuildMode, DefaultArchive, PlanEnvironment,
    PlanRequest,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::command::{BuildCommand, BuildSettings};
use crate::config::Config;
use crate::effects::Effects;
use crate::errors::PrepError;
use crate::outcome::ExecutionOutcome;
use crate::preflight::{check_tools, detect_host, ensure_image_unpublished, HostPlanProbe};

#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub plan: PlanRequest,
    pub dry_run: bool,
}

/// Validate everything, then run (or print) the image build.
///
/// Validation failures come back as user errors; a failing builder comes back
/// as a failure carrying its exit code.
pub fn prepare_build(
    effects: &dyn Effects,
    config: &Config,
    request: &BuildRequest,
) -> ExecutionOutcome {
    match run_build(effects, config, request) {
        Ok(outcome) => outcome,
        Err(err) => {
            debug!(code = err.code(), "{err}");
            err.into_outcome()
        }
    }
}

fn run_build(
    effects: &dyn Effects,
    config: &Config,
    request: &BuildRequest,
) -> Result<ExecutionOutcome, PrepError> {
    let tools = check_tools(effects, config)?;
    ensure_image_unpublished(effects, &tools.reg, config)?;
    let host = detect_host(effects)?;

    let env = PlanEnvironment {
        host,
        supported: ArchitectureId::SUPPORTED.to_vec(),
        build_root: config.build_root.clone(),
        working_dir: config.working_dir.clone(),
        default_archive: DefaultArchive {
            directory: config.archive_dir.clone(),
            clang_version: config.clang_version.clone(),
            image_id: config.image.clone(),
        },
    };
    let probe = HostPlanProbe::new(effects.host(), config);
    let plan = resolve_build_plan(&request.plan, &env, &probe)?;
    info!(
        host = %host,
        platforms = ?plan.platforms(),
        mode = %plan.clang_build_mode(),
        multiarch = plan.multiarch_enabled(),
        "resolved build plan"
    );
    let plan_details = serde_json::to_value(&plan)
        .map_err(|err| PrepError::Host(anyhow::Error::new(err).context("failed to encode plan")))?;

    if plan.clang_build_mode() == ClangBuildMode::Install && !request.dry_run {
        for (_, path) in plan.archive_spec().iter() {
            if let Some(parent) = config.build_root.join(path).parent() {
                effects
                    .host()
                    .create_dir_all(parent.as_std_path())
                    .map_err(PrepError::Host)?;
            }
        }
    }

    let settings = BuildSettings {
        program: tools.buildah.program.clone(),
        image: config.image.clone(),
        context: config.context.clone(),
        containerfile: config.containerfile.clone(),
    };
    let command = BuildCommand::from_plan(plan, &settings);
    let rendered = command.render();
    let mut details = json!({
        "image": config.image,
        "plan": plan_details,
        "command": command,
        "dry_run": request.dry_run,
    });

    if request.dry_run {
        info!("dry run; not invoking {}", tools.buildah.name);
        insert(&mut details, "rendered", Value::String(rendered.clone()));
        return Ok(ExecutionOutcome::success(
            format!("would run {rendered}"),
            details,
        ));
    }

    info!(command = %rendered, "starting image build");
    let output = effects
        .process()
        .run_command_streaming(&command.program, &command.args, config.build_root.as_std_path())
        .map_err(PrepError::Host)?;
    insert(&mut details, "exit_code", Value::from(output.code));
    if output.success() {
        Ok(ExecutionOutcome::success(
            format!("built {}", config.image),
            details,
        ))
    } else {
        debug!(code = output.code, "image build failed");
        Ok(ExecutionOutcome::failure(
            format!("{} exited with status {}", tools.buildah.name, output.code),
            details,
        ))
    }
}

fn insert(details: &mut Value, key: &str, value: Value) {
    if let Value::Object(map) = details {
        map.insert(key.to_string(), value);
    }
}
