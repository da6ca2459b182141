use engine::assets::{AssetLoaded, AssetSource};
use tracing::debug;

/// Stands in for an asynchronous texture loader: each asset becomes ready after
/// a fixed number of polls.
#[derive(Debug, Default)]
pub(crate) struct SimulatedAssetLoader {
    pending: Vec<(u32, AssetLoaded)>,
}

impl SimulatedAssetLoader {
    /// Sheet sizes of the demo level's animated textures.
    pub(crate) fn demo() -> Self {
        let mut loader = Self::default();
        loader.queue(AssetLoaded::image("bird", 102, 24), 3);
        loader
    }

    pub(crate) fn queue(&mut self, asset: AssetLoaded, polls_until_ready: u32) {
        debug!(asset = %asset.name, polls_until_ready, "asset_load_started");
        self.pending.push((polls_until_ready, asset));
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl AssetSource for SimulatedAssetLoader {
    fn drain_loaded(&mut self) -> Vec<AssetLoaded> {
        let mut ready = Vec::new();
        self.pending.retain_mut(|(remaining, asset)| {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                ready.push(asset.clone());
                false
            } else {
                true
            }
        });
        ready
    }
}
