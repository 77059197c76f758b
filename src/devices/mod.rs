//! Frame source implementations

pub mod mock;
pub mod replay;

use crate::config::CameraConfig;
use crate::core::FrameSource;
use crate::error::{Error, Result};
use mock::MockCamera;
use replay::ReplayCamera;
use std::sync::Arc;

/// Create a frame source based on configuration
pub fn create_camera(config: &CameraConfig) -> Result<Arc<dyn FrameSource>> {
    match config.source.as_str() {
        "mock" => {
            let camera = MockCamera::new(config);
            Ok(Arc::new(camera))
        }
        "replay" => {
            let dir = config.replay_dir.as_deref().ok_or_else(|| {
                Error::Config("replay source requires camera.replay_dir".to_string())
            })?;
            let camera = ReplayCamera::open(dir, config.buffer_count)?;
            Ok(Arc::new(camera))
        }
        other => Err(Error::UnknownSource(other.to_string())),
    }
}
