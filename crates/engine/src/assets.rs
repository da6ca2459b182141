use crate::message::{Message, Sender};

/// Code prefix of the notification an asset loader posts when an asset is ready.
pub const ASSET_LOADED_PREFIX: &str = "MESSAGE_ASSET_LOADER_ASSET_LOADED::";

pub fn asset_loaded_code(name: &str) -> String {
    format!("{ASSET_LOADED_PREFIX}{name}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Image { width: u32, height: u32 },
    Json,
    Text,
}

/// Context payload of an asset-loaded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetLoaded {
    pub name: String,
    pub kind: AssetKind,
}

impl AssetLoaded {
    pub fn image(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            kind: AssetKind::Image { width, height },
        }
    }

    pub fn code(&self) -> String {
        asset_loaded_code(&self.name)
    }

    /// Normal-priority, like every loader notification.
    pub fn into_message(self) -> Message {
        Message::new(self.code(), Sender::System("asset_loader")).with_context(self)
    }
}

/// Loader boundary polled once per tick; returns the assets that finished since the last poll.
pub trait AssetSource {
    fn drain_loaded(&mut self) -> Vec<AssetLoaded>;
}
