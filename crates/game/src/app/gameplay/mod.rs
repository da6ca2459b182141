mod assets;
mod events;
mod renderer;
mod script;

pub(crate) use assets::SimulatedAssetLoader;
pub(crate) use events::GameEventLogBehavior;
pub(crate) use renderer::TracingRenderer;
pub(crate) use script::FlapScript;

use engine::Builders;

/// Adds the game's own record types next to the engine built-ins.
pub(crate) fn register_builders(builders: &mut Builders) {
    builders
        .behaviors
        .register(events::GAME_EVENT_LOG_TYPE, events::build);
}

#[cfg(test)]
mod tests;
