use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;
use log::debug;

use crate::engine::{Geometry, Material, NodeDesc, NodeId, PlaneAnchor, SceneEngine};

/// Texture applied to detected-plane overlays.
pub const GRID_TEXTURE: &str = "grid.png";

/// Builds grid overlays for newly detected planes.
pub struct OverlayBuilder {
    engine: Arc<dyn SceneEngine>,
    texture: String,
}

impl OverlayBuilder {
    pub fn new(engine: Arc<dyn SceneEngine>) -> Self {
        Self::with_texture(engine, GRID_TEXTURE)
    }

    pub fn with_texture(engine: Arc<dyn SceneEngine>, texture: impl Into<String>) -> Self {
        Self {
            engine,
            texture: texture.into(),
        }
    }

    /// Creates a flat grid surface matching the plane's measured extent and
    /// hangs it off the anchor's own node, so later anchor corrections move
    /// the overlay along without this code re-running.
    pub fn plane_anchor_added(&self, anchor: &PlaneAnchor) -> NodeId {
        let desc = NodeDesc {
            name: format!("plane-overlay-{}", anchor.id.0),
            geometry: Geometry::Plane {
                width: anchor.extent.x,
                depth: anchor.extent.y,
            },
            material: Material::textured(self.texture.as_str()),
            position: Vec3::new(anchor.center.x, 0.0, anchor.center.y),
            // Plane geometry stands upright; lay it flat on the surface.
            rotation: Vec3::new(-FRAC_PI_2, 0.0, 0.0),
        };
        let overlay = self.engine.spawn_node(desc);
        self.engine.attach(anchor.node, overlay);
        debug!(
            "grid overlay {:?} covers anchor {:?} ({:.2} x {:.2})",
            overlay, anchor.id, anchor.extent.x, anchor.extent.y
        );
        overlay
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnchorId;
    use crate::sim::SimEngine;
    use glam::Vec2;

    #[test]
    fn overlay_matches_the_plane_extent_and_lies_flat() {
        let engine = Arc::new(SimEngine::new());
        let anchor_node = engine.spawn_node(NodeDesc {
            name: "anchor".into(),
            geometry: Geometry::Plane { width: 0.0, depth: 0.0 },
            material: Material::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        });
        engine.attach(engine.root_node(), anchor_node);

        let handle: Arc<dyn SceneEngine> = engine.clone();
        let builder = OverlayBuilder::new(handle);
        let anchor = PlaneAnchor {
            id: AnchorId(1),
            center: Vec2::new(0.1, -0.2),
            extent: Vec2::new(0.5, 0.8),
            node: anchor_node,
        };

        let overlay = builder.plane_anchor_added(&anchor);

        assert_eq!(
            engine.node_geometry(overlay),
            Some(Geometry::Plane { width: 0.5, depth: 0.8 })
        );
        assert_eq!(engine.parent_of(overlay), Some(anchor_node));
        // Positioned at the anchor's center offset with no vertical lift,
        // rotated a quarter turn to lie flat.
        assert_eq!(engine.node_position(overlay), Some(Vec3::new(0.1, 0.0, -0.2)));
        assert_eq!(
            engine.node_rotation(overlay),
            Some(Vec3::new(-FRAC_PI_2, 0.0, 0.0))
        );
    }
}
