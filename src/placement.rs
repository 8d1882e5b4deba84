use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use glam::{Vec2, Vec3};
use log::{debug, info};
use rand::Rng;

use crate::engine::{Aabb, HitTestFilter, NodeId, SceneEngine, TemplateId};
use crate::roll::RollAnimator;

/// Places dice on detected planes and owns the list of placed dice.
///
/// Every handle in the list refers to a node attached to the scene graph;
/// scene detach and list removal only ever happen together.
pub struct PlacementController {
    engine: Arc<dyn SceneEngine>,
    template: TemplateId,
    bounds: Aabb,
    dice: Vec<NodeId>,
}

impl std::fmt::Debug for PlacementController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementController")
            .field("template", &self.template)
            .field("bounds", &self.bounds)
            .field("dice", &self.dice)
            .finish_non_exhaustive()
    }
}

impl PlacementController {
    /// Loads the die template exactly once and caches it for every later
    /// placement.
    ///
    /// A missing or invalid template asset is a fatal configuration error:
    /// the demo is unusable without it, so the error is surfaced here rather
    /// than on each tap, and callers are expected to abort on it.
    pub fn new(engine: Arc<dyn SceneEngine>, asset_path: &Path) -> Result<Self> {
        let template = engine
            .load_template(asset_path)
            .with_context(|| format!("failed to load die template {}", asset_path.display()))?;
        let bounds = engine
            .template_bounds(template)
            .context("die template has no bounding box")?;
        Ok(Self {
            engine,
            template,
            bounds,
            dice: Vec::new(),
        })
    }

    /// Handles a tap in view space.
    ///
    /// A tap that lands on a detected plane instantiates a die resting on the
    /// surface, registers it and rolls it once; a tap that misses every plane
    /// is a silent no-op.  Returns the placed die, if any.
    pub fn handle_tap<R: Rng>(
        &mut self,
        point: Vec2,
        roller: &mut RollAnimator<R>,
    ) -> Result<Option<NodeId>> {
        let Some(hit) = self
            .engine
            .hit_test(point, HitTestFilter::ExistingPlaneUsingExtent)
        else {
            debug!("tap at ({:.0}, {:.0}) missed every detected plane", point.x, point.y);
            return Ok(None);
        };

        let die = self
            .engine
            .instantiate(self.template)
            .context("failed to instantiate the cached die template")?;

        // Lift by half the bounding-box height so the die rests on the
        // surface instead of being bisected by it.
        let lift = self.bounds.height() * 0.5;
        let position = hit.world_position + Vec3::new(0.0, lift, 0.0);
        self.engine.set_position(die, position);

        self.dice.push(die);
        self.engine.attach(self.engine.root_node(), die);
        roller.roll(die);

        info!(
            "placed die {:?} at ({:.3}, {:.3}, {:.3})",
            die, position.x, position.y, position.z
        );
        Ok(Some(die))
    }

    /// Detaches every placed die from the scene and empties the list.
    ///
    /// Safe to call when the list is already empty.
    pub fn clear_all(&mut self) {
        if self.dice.is_empty() {
            return;
        }
        info!("clearing {} placed dice", self.dice.len());
        for die in self.dice.drain(..) {
            self.engine.detach(die);
        }
    }

    /// Placed dice in placement order.
    pub fn dice(&self) -> &[NodeId] {
        &self.dice
    }

    pub fn len(&self) -> usize {
        self.dice.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dice.is_empty()
    }
}
