use std::process::ExitCode;

use engine::run_headless;
use tracing::{error, info};

use super::bootstrap::AppWiring;
use super::gameplay::{FlapScript, GameEventLogBehavior, TracingRenderer};

pub(crate) fn run(app: AppWiring) -> ExitCode {
    let AppWiring {
        config,
        mut runtime,
        level_id,
    } = app;

    if let Err(err) = runtime.change_level(level_id) {
        error!(level_id, error = %err, "level_load_failed");
        return ExitCode::FAILURE;
    }

    let mut input = FlapScript::demo();
    let mut renderer = TracingRenderer::default();
    let result = run_headless(&config, &mut runtime, &mut input, &mut renderer);
    if let Some(log) = runtime
        .levels()
        .active_level()
        .and_then(|level| level.scene().root().get_behavior::<GameEventLogBehavior>("events"))
    {
        info!(events = ?log.seen(), "game_events_seen");
    }
    runtime.shutdown();

    match result {
        Ok(summary) => {
            info!(
                frames = summary.frames,
                ticks = summary.ticks,
                sprites_drawn = renderer.sprites_drawn(),
                texts_drawn = renderer.texts_drawn(),
                "run_finished"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "loop_failed");
            ExitCode::FAILURE
        }
    }
}
