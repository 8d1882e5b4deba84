use std::path::Path;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Handle to a node in the engine's scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Handle to a die template cached inside the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateId(pub u32);

/// Identity of a tracked plane anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnchorId(pub u64);

/// Axis-aligned box enclosing a node's geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Builds a box of the given dimensions centered on the origin.
    pub fn from_size(size: Vec3) -> Self {
        let half = size * 0.5;
        Self {
            min: -half,
            max: half,
        }
    }

    /// Vertical span of the box.
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// Result of projecting a view-space point onto a tracked surface.
///
/// Consumed immediately after the query; never retained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitResult {
    pub world_position: Vec3,
    pub world_orientation: Vec3,
}

/// Payload of a plane-detection event.
///
/// `center` and `extent` are the (x, z) offset and size of the surface
/// relative to `node`, the anchor's own scene-graph node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaneAnchor {
    pub id: AnchorId,
    pub center: Vec2,
    pub extent: Vec2,
    pub node: NodeId,
}

/// Tracking fidelity the session runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Six degree-of-freedom world tracking.
    WorldTracking,
    /// Rotation-only fallback for hardware without world tracking.
    OrientationOnly,
}

/// Configuration handed to the engine when a session starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub tracking: TrackingMode,
    pub detect_horizontal_planes: bool,
}

impl SessionConfig {
    /// World tracking with horizontal plane detection enabled.
    pub const fn world_tracking() -> Self {
        Self {
            tracking: TrackingMode::WorldTracking,
            detect_horizontal_planes: true,
        }
    }

    /// Orientation-only tracking; plane detection is unavailable in this mode.
    pub const fn orientation_only() -> Self {
        Self {
            tracking: TrackingMode::OrientationOnly,
            detect_horizontal_planes: false,
        }
    }
}

/// Restricts which surfaces a hit test may report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitTestFilter {
    /// Only planes already detected, using their measured extent.
    ExistingPlaneUsingExtent,
}

/// Geometry attached to a scene node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Geometry {
    /// Flat rectangle in the node's local XY plane.
    Plane { width: f32, depth: f32 },
    /// Solid box, used for instantiated dice.
    Box { size: Vec3 },
}

/// Surface appearance of a scene node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    pub texture: Option<String>,
    pub color: Option<Vec3>,
}

impl Material {
    pub fn textured(path: impl Into<String>) -> Self {
        Self {
            texture: Some(path.into()),
            color: None,
        }
    }

    pub fn colored(color: Vec3) -> Self {
        Self {
            texture: None,
            color: Some(color),
        }
    }
}

/// Everything needed to build a new scene node in one call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDesc {
    pub name: String,
    pub geometry: Geometry,
    pub material: Material,
    pub position: Vec3,
    /// Euler rotation in radians, applied XYZ.
    pub rotation: Vec3,
}

/// Errors surfaced at the engine capability boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("die template {path} could not be loaded")]
    TemplateMissing { path: String },
    #[error("die template {path} is invalid: {reason}")]
    TemplateInvalid { path: String, reason: String },
    #[error("unknown template handle")]
    UnknownTemplate,
    #[error("unknown scene node")]
    UnknownNode,
}

/// Capability surface of the AR/scene engine.
///
/// Camera tracking, plane detection, hit-testing math, rendering and
/// animation scheduling all live behind this trait; the rest of the crate is
/// a handler layer that never looks past it.  Handles are shared as
/// `Arc<dyn SceneEngine>` so each component receives the engine at
/// construction instead of reaching into a singleton.
pub trait SceneEngine: Send + Sync {
    /// Whether the hardware supports six degree-of-freedom world tracking.
    fn supports_world_tracking(&self) -> bool;

    /// Begins (or reconfigures) the tracking session.
    fn run_session(&self, config: SessionConfig);

    /// Pauses the tracking session; a no-op when no session is running.
    fn pause_session(&self);

    /// Projects a view-space point onto a tracked surface.
    ///
    /// An empty result is the normal outcome of tapping empty space, not an
    /// error.
    fn hit_test(&self, point: Vec2, filter: HitTestFilter) -> Option<HitResult>;

    /// Loads and caches a die template asset.
    fn load_template(&self, path: &Path) -> Result<TemplateId, EngineError>;

    /// Bounding box of a cached template's geometry.
    fn template_bounds(&self, template: TemplateId) -> Result<Aabb, EngineError>;

    /// Stamps out a fresh node from a cached template.
    fn instantiate(&self, template: TemplateId) -> Result<NodeId, EngineError>;

    /// Builds a geometry node from a description; the node starts detached.
    fn spawn_node(&self, desc: NodeDesc) -> NodeId;

    /// Root of the scene graph.
    fn root_node(&self) -> NodeId;

    /// Attaches `child` under `parent`, re-parenting if necessary.
    fn attach(&self, parent: NodeId, child: NodeId);

    /// Detaches a node from its parent; a no-op when already detached.
    fn detach(&self, child: NodeId);

    fn set_position(&self, node: NodeId, position: Vec3);

    /// Applies a timed rotation by the given Euler angles, fire-and-forget.
    ///
    /// The engine schedules the animation on its own; callers never observe
    /// or block on completion.
    fn animate_rotation(&self, node: NodeId, by: Vec3, duration_secs: f32);
}

/// Handler interface the engine invokes from its event-delivery context.
///
/// Callbacks are serialized by the engine, so implementations need no
/// internal locking.
pub trait PlaneEvents {
    /// A new horizontal plane anchor was detected and given a scene node.
    fn plane_anchor_added(&mut self, anchor: &PlaneAnchor);
}
