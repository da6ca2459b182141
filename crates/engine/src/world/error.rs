use std::path::PathBuf;

use thiserror::Error;

use crate::content::{BuildError, LevelParseError};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("behavior '{behavior}' requires component '{component}' on its owner")]
    MissingSiblingComponent { behavior: String, component: String },
    #[error("frame {frame} is out of range for '{component}' ({frame_count} frames)")]
    FrameOutOfRange {
        component: String,
        frame: usize,
        frame_count: usize,
    },
    #[error(transparent)]
    Build(#[from] BuildError),
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: LevelParseError,
    },
    #[error("failed to build level '{level}': {source}")]
    Build {
        level: String,
        #[source]
        source: BuildError,
    },
    #[error("failed to load level '{level}': {source}")]
    Scene {
        level: String,
        #[source]
        source: SceneError,
    },
    #[error("no level registered with id {id}")]
    UnknownLevel { id: u32 },
}
