use std::sync::Arc;

use log::{info, warn};

use crate::engine::{SceneEngine, SessionConfig, TrackingMode};

/// Owns the engine tracking session for the lifetime of the view.
///
/// The camera/tracking session is process-wide sensor state, so acquisition
/// is scoped: `start` runs the session, `stop` pauses it, and dropping the
/// manager pauses it on any teardown path that forgot to.
pub struct SessionManager {
    engine: Arc<dyn SceneEngine>,
    mode: Option<TrackingMode>,
}

impl SessionManager {
    pub fn new(engine: Arc<dyn SceneEngine>) -> Self {
        Self { engine, mode: None }
    }

    /// Configures the richest tracking mode the hardware supports and runs
    /// the session.  Returns the mode that was chosen.
    ///
    /// Calling `start` while a session is already running is tolerated with a
    /// warning; the running session is left untouched.
    pub fn start(&mut self) -> TrackingMode {
        if let Some(mode) = self.mode {
            warn!("start requested while a session is already running");
            return mode;
        }

        let config = if self.engine.supports_world_tracking() {
            SessionConfig::world_tracking()
        } else {
            // Policy branch, not an error: older hardware still gets a session.
            info!("world tracking unsupported; degrading to orientation tracking");
            SessionConfig::orientation_only()
        };
        self.engine.run_session(config);
        self.mode = Some(config.tracking);
        config.tracking
    }

    /// Pauses the session.  Safe to call any number of times, including
    /// before `start` was ever called.
    pub fn stop(&mut self) {
        if self.mode.take().is_some() {
            self.engine.pause_session();
        }
    }

    pub fn is_started(&self) -> bool {
        self.mode.is_some()
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.stop();
    }
}
