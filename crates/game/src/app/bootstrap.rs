use std::env;

use engine::{resolve_app_paths, AppError, AppPaths, Builders, LoopConfig, MessageBus, Runtime};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::gameplay;

pub(crate) const LEVEL_ID_ENV_VAR: &str = "SKYHOP_LEVEL_ID";
pub(crate) const MAX_FRAMES_ENV_VAR: &str = "SKYHOP_MAX_FRAMES";
pub(crate) const DEFAULT_LEVEL_ID: u32 = 1;
const DEFAULT_LEVEL_FILE: &str = "skyhop.json";

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) runtime: Runtime,
    pub(crate) level_id: u32,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Skyhop Startup ===");

    let paths = resolve_app_paths()?;
    info!(
        root = %paths.root.display(),
        assets_dir = %paths.assets_dir.display(),
        levels_dir = %paths.levels_dir.display(),
        "startup"
    );

    let config = LoopConfig {
        max_render_fps: Some(60),
        max_frames: parse_u64(MAX_FRAMES_ENV_VAR, env::var(MAX_FRAMES_ENV_VAR).ok()),
        ..LoopConfig::default()
    };
    let level_id = level_id_from(env::var(LEVEL_ID_ENV_VAR).ok());
    let runtime = build_runtime(&paths, &config, level_id);

    Ok(AppWiring {
        config,
        runtime,
        level_id,
    })
}

/// Builtin plus game builders, the demo level under `level_id` and the simulated loader.
fn build_runtime(paths: &AppPaths, config: &LoopConfig, level_id: u32) -> Runtime {
    let mut builders = Builders::with_builtin();
    gameplay::register_builders(&mut builders);
    let mut runtime = Runtime::new(
        builders,
        MessageBus::with_budget(config.normal_messages_per_update),
    );
    runtime.register_level(level_id, paths.level_file(DEFAULT_LEVEL_FILE));
    let loader = gameplay::SimulatedAssetLoader::demo();
    info!(pending_assets = loader.pending_len(), "asset_loader_started");
    runtime.add_asset_source(Box::new(loader));
    runtime
}

fn level_id_from(raw: Option<String>) -> u32 {
    parse_u64(LEVEL_ID_ENV_VAR, raw)
        .and_then(|value| match u32::try_from(value) {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(env_var = LEVEL_ID_ENV_VAR, value, "level id out of range; using default");
                None
            }
        })
        .unwrap_or(DEFAULT_LEVEL_ID)
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_u64(var: &'static str, raw: Option<String>) -> Option<u64> {
    let raw = raw?;
    match raw.trim().parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(env_var = var, value = raw.as_str(), "invalid env var value; using default");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn level_id_falls_back_to_the_default() {
        assert_eq!(level_id_from(None), DEFAULT_LEVEL_ID);
        assert_eq!(level_id_from(Some("two".to_string())), DEFAULT_LEVEL_ID);
        assert_eq!(level_id_from(Some("4294967296".to_string())), DEFAULT_LEVEL_ID);
        assert_eq!(level_id_from(Some(" 2 ".to_string())), 2);
    }

    #[test]
    fn demo_level_is_registered_under_the_requested_id() {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..");
        let paths = AppPaths::from_root(root);
        let mut runtime = build_runtime(&paths, &LoopConfig::default(), 2);

        runtime.change_level(2).expect("level 2 loads");
        let level = runtime.levels().active_level().expect("active level");
        assert_eq!(level.name(), "skyhop");
        assert!(runtime.change_level(DEFAULT_LEVEL_ID).is_err());
    }
}
