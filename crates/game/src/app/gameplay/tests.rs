use std::ops::Range;
use std::path::PathBuf;

use engine::app::{InputSource, MOUSE_DOWN, MOUSE_UP};
use engine::assets::{AssetLoaded, AssetSource};
use engine::collision::collision_entry_code;
use engine::behaviors::{PlayerBehavior, ScrollBehavior, PLAYER_DIED};
use engine::components::AnimatedSpriteComponent;
use engine::world::GAME_READY;
use engine::{BuildError, Builders, InputSnapshot, Level, LevelState, MessageBus, Runtime};
use serde_json::json;

use super::*;

const DT: f32 = 1.0 / 60.0;

fn demo_level_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../assets/levels/skyhop.json")
}

fn demo_runtime() -> Runtime {
    let mut builders = Builders::with_builtin();
    register_builders(&mut builders);
    let mut runtime = Runtime::new(builders, MessageBus::new());
    runtime.register_level(1, demo_level_path());
    runtime.add_asset_source(Box::new(SimulatedAssetLoader::demo()));
    runtime.change_level(1).expect("demo level loads");
    runtime
}

fn simulate(runtime: &mut Runtime, script: &mut FlapScript, frames: Range<u64>) {
    for frame in frames {
        let input = script.poll(frame);
        runtime.tick(DT, &input);
    }
}

fn level(runtime: &Runtime) -> &Level {
    runtime.levels().active_level().expect("active level")
}

fn is_visible(runtime: &Runtime, name: &str) -> bool {
    level(runtime)
        .scene()
        .get_entity_by_name(name)
        .expect("entity")
        .is_visible()
}

#[test]
fn demo_level_builds_every_entity() {
    let runtime = demo_runtime();
    let level = level(&runtime);
    assert_eq!(level.state(), LevelState::Updating);
    assert_eq!(level.name(), "skyhop");
    assert_eq!(level.scene().entity_count(), 10);
    for name in ["background", "pipeTop", "pipeBottom", "ground", "bird", "startButton"] {
        assert!(level.scene().get_entity_by_name(name).is_some(), "{name}");
    }
    assert_eq!(runtime.collisions().len(), 4);
}

#[test]
fn scripted_run_starts_flies_and_dies_on_the_ground() {
    let mut runtime = demo_runtime();
    let mut script = FlapScript::demo();

    simulate(&mut runtime, &mut script, 0..120);
    assert!(!is_visible(&runtime, "startButton"));
    assert!(!is_visible(&runtime, "gameOver"));
    let player = level(&runtime)
        .scene()
        .root()
        .get_behavior::<PlayerBehavior>("player")
        .expect("player");
    assert!(player.is_alive());
    let sprite = level(&runtime)
        .scene()
        .get_component::<AnimatedSpriteComponent>("birdSprite")
        .expect("bird sprite");
    assert!(sprite.is_texture_loaded());

    simulate(&mut runtime, &mut script, 120..480);
    let scene = level(&runtime).scene();
    let player = scene
        .root()
        .get_behavior::<PlayerBehavior>("player")
        .expect("player");
    assert!(!player.is_alive());
    assert!(is_visible(&runtime, "gameOver"));
    let pipes = scene
        .root()
        .get_behavior::<ScrollBehavior>("pipeScroll")
        .expect("pipe scroll");
    assert!(!pipes.is_scrolling());

    let events = scene
        .root()
        .get_behavior::<GameEventLogBehavior>("events")
        .expect("event log");
    assert_eq!(events.seen(), [GAME_READY, "START_GAME", PLAYER_DIED]);
}

#[test]
fn shutdown_releases_every_subscription() {
    let mut runtime = demo_runtime();
    let mut script = FlapScript::demo();
    simulate(&mut runtime, &mut script, 0..120);

    let bird_entry = collision_entry_code("birdCollision");
    let codes = [
        MOUSE_DOWN,
        MOUSE_UP,
        "START_GAME",
        PLAYER_DIED,
        GAME_READY,
        bird_entry.as_str(),
    ];
    for code in codes {
        assert!(runtime.bus().subscriber_count(code) > 0, "{code} before shutdown");
    }

    runtime.shutdown();
    for code in codes {
        assert_eq!(runtime.bus().subscriber_count(code), 0, "{code} after shutdown");
    }
    assert!(runtime.collisions().is_empty());
}

#[test]
fn rendering_skips_hidden_text() {
    let mut runtime = demo_runtime();
    let mut renderer = TracingRenderer::default();
    runtime.render(&mut renderer);
    assert_eq!(renderer.texts_drawn(), 2);

    runtime.tick(DT, &InputSnapshot::empty());
    let mut renderer = TracingRenderer::default();
    runtime.render(&mut renderer);
    assert_eq!(renderer.texts_drawn(), 1, "game over text hides on GAME_READY");
    assert_eq!(renderer.sprites_drawn(), 6);
}

#[test]
fn simulated_loader_releases_assets_after_their_latency() {
    let mut loader = SimulatedAssetLoader::default();
    loader.queue(AssetLoaded::image("fast", 8, 8), 1);
    loader.queue(AssetLoaded::image("slow", 8, 8), 3);

    let first: Vec<String> = loader.drain_loaded().into_iter().map(|a| a.name).collect();
    assert_eq!(first, vec!["fast".to_string()]);
    assert!(loader.drain_loaded().is_empty());
    let third: Vec<String> = loader.drain_loaded().into_iter().map(|a| a.name).collect();
    assert_eq!(third, vec!["slow".to_string()]);
    assert_eq!(loader.pending_len(), 0);
}

#[test]
fn flap_script_presses_then_releases_on_each_beat() {
    let mut script = FlapScript::new(2, 10, 25).with_quit_at(40);
    assert!(!script.poll(0).left_pressed());
    assert!(script.poll(2).left_pressed());
    assert!(script.poll(3).left_released());
    assert!(script.poll(12).left_pressed());
    assert!(!script.poll(22).left_released());
    assert!(!script.poll(32).left_pressed(), "no flaps after the stop frame");
    assert!(!script.poll(39).quit_requested());
    assert!(script.poll(40).quit_requested());
}

#[test]
fn game_event_log_is_registered_next_to_the_builtins() {
    let mut builders = Builders::with_builtin();
    register_builders(&mut builders);
    assert!(builders.behaviors.contains("gameEventLog"));
    assert!(builders.behaviors.contains("player"));

    let Err(err) = builders
        .behaviors
        .build(&json!({ "type": "gameEventLog", "name": "log", "messages": "GAME_READY" }))
    else {
        panic!("messages must be a list");
    };
    assert!(matches!(
        err,
        BuildError::InvalidRecord { ref path, .. } if path == "messages"
    ));
}
