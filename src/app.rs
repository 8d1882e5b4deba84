use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use glam::Vec2;
use log::error;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::{NodeId, PlaneAnchor, PlaneEvents, SceneEngine, TrackingMode};
use crate::overlay::OverlayBuilder;
use crate::placement::PlacementController;
use crate::roll::RollAnimator;
use crate::session::SessionManager;

/// Wires the session, placement, overlay and roll components over one shared
/// engine handle.
///
/// This is the whole user-facing surface of the demo: tap gestures plus the
/// "roll" and "clear" toolbar actions, with `start`/`stop` tracking the
/// view's visibility.  The engine delivers plane events through the
/// [`PlaneEvents`] impl.
pub struct DiceApp<R: Rng> {
    session: SessionManager,
    placement: PlacementController,
    overlay: OverlayBuilder,
    roller: RollAnimator<R>,
}

impl DiceApp<StdRng> {
    /// Builds the app with an entropy-seeded roll generator.
    ///
    /// Fails when the die template asset cannot be loaded; that error is
    /// fatal for the demo and callers are expected to abort on it.
    pub fn new(engine: Arc<dyn SceneEngine>, die_asset: &Path) -> Result<Self> {
        Self::with_rng(engine, die_asset, StdRng::from_entropy())
    }
}

impl<R: Rng> DiceApp<R> {
    /// Builds the app with an injected roll generator.
    pub fn with_rng(engine: Arc<dyn SceneEngine>, die_asset: &Path, rng: R) -> Result<Self> {
        let placement = PlacementController::new(Arc::clone(&engine), die_asset)?;
        Ok(Self {
            session: SessionManager::new(Arc::clone(&engine)),
            overlay: OverlayBuilder::new(Arc::clone(&engine)),
            roller: RollAnimator::new(engine, rng),
            placement,
        })
    }

    /// Starts tracking; call when the view becomes visible.
    pub fn start(&mut self) -> TrackingMode {
        self.session.start()
    }

    /// Pauses tracking; safe on every teardown path.
    pub fn stop(&mut self) {
        self.session.stop()
    }

    /// Tap gesture on the rendered view.
    pub fn handle_tap(&mut self, point: Vec2) -> Result<Option<NodeId>> {
        self.placement.handle_tap(point, &mut self.roller)
    }

    /// Toolbar "roll": re-rolls every placed die.
    pub fn roll_all(&mut self) {
        self.roller.roll_all(self.placement.dice());
    }

    /// Toolbar "clear": removes every placed die.
    pub fn clear_all(&mut self) {
        self.placement.clear_all();
    }

    /// Placed dice in placement order.
    pub fn dice(&self) -> &[NodeId] {
        self.placement.dice()
    }
}

impl<R: Rng> PlaneEvents for DiceApp<R> {
    fn plane_anchor_added(&mut self, anchor: &PlaneAnchor) {
        if !self.session.is_started() {
            error!("plane event delivered before the session started");
            return;
        }
        self.overlay.plane_anchor_added(anchor);
    }
}
