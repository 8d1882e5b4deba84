use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::{Vec2, Vec3};
use log::{debug, info, warn};
use parking_lot::RwLock;

use crate::asset::DieTemplate;
use crate::engine::{
    Aabb, AnchorId, EngineError, Geometry, HitResult, HitTestFilter, Material, NodeDesc, NodeId,
    PlaneAnchor, PlaneEvents, SceneEngine, SessionConfig, TemplateId,
};

const ROOT: NodeId = NodeId(0);

/// Rectangular region of the view, used to map taps onto staged planes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl ScreenRect {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Description of a horizontal surface the simulator will "detect".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneSpec {
    /// World-space point reported for hits on this plane.
    pub world_position: Vec3,
    /// Center offset of the surface relative to its anchor, (x, z).
    pub center: Vec2,
    /// Measured extent of the surface, (x, z).
    pub extent: Vec2,
    /// View-space region that maps taps onto this plane.
    pub screen: ScreenRect,
}

/// Record of a fire-and-forget rotation action, kept for inspection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAction {
    pub node: NodeId,
    pub by: Vec3,
    pub duration_secs: f32,
}

#[derive(Debug, Clone)]
struct NodeRecord {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    position: Vec3,
    rotation: Vec3,
    geometry: Option<Geometry>,
    material: Material,
}

impl NodeRecord {
    fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            geometry: None,
            material: Material::default(),
        }
    }
}

#[derive(Debug, Clone)]
struct DetectedPlane {
    anchor: AnchorId,
    spec: PlaneSpec,
}

/// Deterministic in-memory stand-in for the platform AR/scene stack.
///
/// Performs no tracking or rendering: planes are staged by the embedding
/// scenario and "detected" when the event queue is pumped, which mirrors the
/// callback delivery order of a real engine closely enough to exercise the
/// handler layer end to end.  Interior state sits behind `RwLock`s so one
/// engine value can be shared as `Arc<dyn SceneEngine>` across components.
pub struct SimEngine {
    world_tracking: bool,
    nodes: RwLock<HashMap<NodeId, NodeRecord>>,
    templates: RwLock<Vec<DieTemplate>>,
    session: RwLock<Option<SessionConfig>>,
    staged: RwLock<Vec<(AnchorId, PlaneSpec)>>,
    detected: RwLock<Vec<DetectedPlane>>,
    animations: RwLock<Vec<RotationAction>>,
    next_node: AtomicU64,
    next_anchor: AtomicU64,
}

impl SimEngine {
    /// Engine with full world-tracking support.
    pub fn new() -> Self {
        Self::with_capabilities(true)
    }

    /// Engine reporting hardware without world tracking, for the fallback path.
    pub fn orientation_only() -> Self {
        Self::with_capabilities(false)
    }

    fn with_capabilities(world_tracking: bool) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT, NodeRecord::named("root"));
        Self {
            world_tracking,
            nodes: RwLock::new(nodes),
            templates: RwLock::new(Vec::new()),
            session: RwLock::new(None),
            staged: RwLock::new(Vec::new()),
            detected: RwLock::new(Vec::new()),
            animations: RwLock::new(Vec::new()),
            next_node: AtomicU64::new(1),
            next_anchor: AtomicU64::new(1),
        }
    }

    /// Queues a plane for detection; the event fires on the next
    /// [`pump_events`](Self::pump_events) while a session is running.
    pub fn stage_plane(&self, spec: PlaneSpec) -> AnchorId {
        let anchor = AnchorId(self.next_anchor.fetch_add(1, Ordering::Relaxed));
        self.staged.write().push((anchor, spec));
        anchor
    }

    /// Delivers every staged plane-detection event to the handler, once each.
    ///
    /// Each event creates the anchor's scene node under the root before the
    /// handler runs, so handlers can attach children to it immediately.
    /// Returns the number of events delivered.
    pub fn pump_events(&self, handler: &mut dyn PlaneEvents) -> usize {
        if self.session.read().is_none() {
            debug!("no session running; keeping {} staged plane(s)", self.staged.read().len());
            return 0;
        }

        let staged: Vec<(AnchorId, PlaneSpec)> = self.staged.write().drain(..).collect();
        let delivered = staged.len();
        for (anchor, spec) in staged {
            let node = self.insert_node({
                let mut record = NodeRecord::named(format!("anchor-{}", anchor.0));
                record.position = spec.world_position;
                record
            });
            self.attach(ROOT, node);
            self.detected.write().push(DetectedPlane { anchor, spec });

            let event = PlaneAnchor {
                id: anchor,
                center: spec.center,
                extent: spec.extent,
                node,
            };
            debug!("delivering plane anchor {:?}", anchor);
            // Locks must be released here: the handler calls back into the
            // engine to build its overlay.
            handler.plane_anchor_added(&event);
        }
        delivered
    }

    /// Rotation actions triggered so far, oldest first.
    pub fn animations(&self) -> Vec<RotationAction> {
        self.animations.read().clone()
    }

    /// Anchors whose detection events have been delivered.
    pub fn detected_anchors(&self) -> Vec<AnchorId> {
        self.detected.read().iter().map(|plane| plane.anchor).collect()
    }

    /// Config of the running session, if any.
    pub fn session_config(&self) -> Option<SessionConfig> {
        *self.session.read()
    }

    pub fn node_name(&self, node: NodeId) -> Option<String> {
        self.nodes.read().get(&node).map(|record| record.name.clone())
    }

    pub fn node_position(&self, node: NodeId) -> Option<Vec3> {
        self.nodes.read().get(&node).map(|record| record.position)
    }

    pub fn node_rotation(&self, node: NodeId) -> Option<Vec3> {
        self.nodes.read().get(&node).map(|record| record.rotation)
    }

    pub fn node_geometry(&self, node: NodeId) -> Option<Geometry> {
        self.nodes.read().get(&node).and_then(|record| record.geometry)
    }

    pub fn parent_of(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.read().get(&node).and_then(|record| record.parent)
    }

    pub fn children_of(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .read()
            .get(&node)
            .map(|record| record.children.clone())
            .unwrap_or_default()
    }

    /// Whether the node is reachable from the scene root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        let nodes = self.nodes.read();
        let mut current = node;
        loop {
            if current == ROOT {
                return true;
            }
            match nodes.get(&current).and_then(|record| record.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn insert_node(&self, record: NodeRecord) -> NodeId {
        let id = NodeId(self.next_node.fetch_add(1, Ordering::Relaxed));
        self.nodes.write().insert(id, record);
        id
    }

    fn unlink(nodes: &mut HashMap<NodeId, NodeRecord>, child: NodeId) {
        let Some(parent) = nodes.get(&child).and_then(|record| record.parent) else {
            return;
        };
        if let Some(record) = nodes.get_mut(&parent) {
            record.children.retain(|&existing| existing != child);
        }
        if let Some(record) = nodes.get_mut(&child) {
            record.parent = None;
        }
    }
}

impl Default for SimEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneEngine for SimEngine {
    fn supports_world_tracking(&self) -> bool {
        self.world_tracking
    }

    fn run_session(&self, config: SessionConfig) {
        info!("session running ({:?})", config.tracking);
        *self.session.write() = Some(config);
    }

    fn pause_session(&self) {
        if self.session.write().take().is_some() {
            info!("session paused");
        } else {
            debug!("pause requested with no session running");
        }
    }

    fn hit_test(&self, point: Vec2, filter: HitTestFilter) -> Option<HitResult> {
        let HitTestFilter::ExistingPlaneUsingExtent = filter;
        self.detected
            .read()
            .iter()
            .find(|plane| plane.spec.screen.contains(point))
            .map(|plane| HitResult {
                world_position: plane.spec.world_position,
                world_orientation: Vec3::ZERO,
            })
    }

    fn load_template(&self, path: &Path) -> Result<TemplateId, EngineError> {
        let xml = std::fs::read_to_string(path).map_err(|_| EngineError::TemplateMissing {
            path: path.display().to_string(),
        })?;
        let template = DieTemplate::from_xml(&xml).map_err(|err| EngineError::TemplateInvalid {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        let mut templates = self.templates.write();
        templates.push(template);
        let id = TemplateId(templates.len() as u32 - 1);
        info!("cached die template {:?} from {}", id, path.display());
        Ok(id)
    }

    fn template_bounds(&self, template: TemplateId) -> Result<Aabb, EngineError> {
        self.templates
            .read()
            .get(template.0 as usize)
            .map(DieTemplate::bounds)
            .ok_or(EngineError::UnknownTemplate)
    }

    fn instantiate(&self, template: TemplateId) -> Result<NodeId, EngineError> {
        let (name, size, color) = {
            let templates = self.templates.read();
            let template = templates
                .get(template.0 as usize)
                .ok_or(EngineError::UnknownTemplate)?;
            (template.name.clone(), template.size, template.color)
        };
        let mut record = NodeRecord::named(name);
        record.geometry = Some(Geometry::Box { size });
        record.material = Material::colored(color);
        Ok(self.insert_node(record))
    }

    fn spawn_node(&self, desc: NodeDesc) -> NodeId {
        let record = NodeRecord {
            name: desc.name,
            parent: None,
            children: Vec::new(),
            position: desc.position,
            rotation: desc.rotation,
            geometry: Some(desc.geometry),
            material: desc.material,
        };
        self.insert_node(record)
    }

    fn root_node(&self) -> NodeId {
        ROOT
    }

    fn attach(&self, parent: NodeId, child: NodeId) {
        let mut nodes = self.nodes.write();
        if !nodes.contains_key(&parent) || !nodes.contains_key(&child) {
            warn!("attach skipped: unknown node handle");
            return;
        }
        Self::unlink(&mut nodes, child);
        if let Some(record) = nodes.get_mut(&parent) {
            record.children.push(child);
        }
        if let Some(record) = nodes.get_mut(&child) {
            record.parent = Some(parent);
        }
    }

    fn detach(&self, child: NodeId) {
        let mut nodes = self.nodes.write();
        Self::unlink(&mut nodes, child);
    }

    fn set_position(&self, node: NodeId, position: Vec3) {
        match self.nodes.write().get_mut(&node) {
            Some(record) => record.position = position,
            None => warn!("set_position skipped: unknown node handle"),
        }
    }

    fn animate_rotation(&self, node: NodeId, by: Vec3, duration_secs: f32) {
        {
            let mut nodes = self.nodes.write();
            let Some(record) = nodes.get_mut(&node) else {
                warn!("animation skipped: unknown node handle");
                return;
            };
            // The simulation has no clock; the final pose lands immediately.
            record.rotation += by;
        }
        debug!(
            "rotate {:?} by ({:.3}, {:.3}, {:.3}) over {:.1}s",
            node, by.x, by.y, by.z, duration_secs
        );
        self.animations.write().push(RotationAction {
            node,
            by,
            duration_secs,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CollectEvents(Vec<PlaneAnchor>);

    impl PlaneEvents for CollectEvents {
        fn plane_anchor_added(&mut self, anchor: &PlaneAnchor) {
            self.0.push(*anchor);
        }
    }

    fn table_plane() -> PlaneSpec {
        PlaneSpec {
            world_position: Vec3::new(0.0, 0.0, -0.5),
            center: Vec2::ZERO,
            extent: Vec2::new(0.6, 0.4),
            screen: ScreenRect::new(Vec2::ZERO, Vec2::new(640.0, 360.0)),
        }
    }

    #[test]
    fn staged_planes_are_not_hittable_before_detection() {
        let engine = SimEngine::new();
        engine.run_session(SessionConfig::world_tracking());
        engine.stage_plane(table_plane());
        assert!(engine
            .hit_test(Vec2::new(320.0, 180.0), HitTestFilter::ExistingPlaneUsingExtent)
            .is_none());
    }

    #[test]
    fn pump_delivers_each_plane_once_and_creates_its_anchor_node() {
        let engine = SimEngine::new();
        engine.run_session(SessionConfig::world_tracking());
        engine.stage_plane(table_plane());

        let mut events = CollectEvents(Vec::new());
        assert_eq!(engine.pump_events(&mut events), 1);
        assert_eq!(engine.pump_events(&mut events), 0);
        assert_eq!(events.0.len(), 1);
        assert_eq!(engine.detected_anchors(), vec![events.0[0].id]);

        let anchor_node = events.0[0].node;
        assert_eq!(engine.parent_of(anchor_node), Some(engine.root_node()));
        assert_eq!(engine.node_position(anchor_node), Some(Vec3::new(0.0, 0.0, -0.5)));
    }

    #[test]
    fn pump_is_inert_without_a_session() {
        let engine = SimEngine::new();
        engine.stage_plane(table_plane());
        let mut events = CollectEvents(Vec::new());
        assert_eq!(engine.pump_events(&mut events), 0);

        // The staged plane survives until a session delivers it.
        engine.run_session(SessionConfig::world_tracking());
        assert_eq!(engine.pump_events(&mut events), 1);
    }

    #[test]
    fn hit_test_reports_the_plane_world_position() {
        let engine = SimEngine::new();
        engine.run_session(SessionConfig::world_tracking());
        engine.stage_plane(table_plane());
        engine.pump_events(&mut CollectEvents(Vec::new()));

        let hit = engine
            .hit_test(Vec2::new(100.0, 100.0), HitTestFilter::ExistingPlaneUsingExtent)
            .unwrap();
        assert_eq!(hit.world_position, Vec3::new(0.0, 0.0, -0.5));
        assert!(engine
            .hit_test(Vec2::new(1000.0, 500.0), HitTestFilter::ExistingPlaneUsingExtent)
            .is_none());
    }

    #[test]
    fn attach_reparents_and_detach_unlinks() {
        let engine = SimEngine::new();
        let node = engine.spawn_node(NodeDesc {
            name: "probe".into(),
            geometry: Geometry::Plane { width: 1.0, depth: 1.0 },
            material: Material::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        });
        assert!(!engine.is_attached(node));

        engine.attach(engine.root_node(), node);
        assert!(engine.is_attached(node));
        assert_eq!(engine.children_of(engine.root_node()), vec![node]);

        let other = engine.spawn_node(NodeDesc {
            name: "holder".into(),
            geometry: Geometry::Plane { width: 1.0, depth: 1.0 },
            material: Material::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        });
        engine.attach(engine.root_node(), other);
        engine.attach(other, node);
        assert_eq!(engine.parent_of(node), Some(other));
        assert!(!engine.children_of(engine.root_node()).contains(&node));

        engine.detach(node);
        assert!(!engine.is_attached(node));
        assert!(engine.children_of(other).is_empty());

        // detaching again is a no-op
        engine.detach(node);
    }

    #[test]
    fn missing_template_file_is_reported() {
        let engine = SimEngine::new();
        let err = engine
            .load_template(Path::new("does-not-exist.xml"))
            .unwrap_err();
        assert!(matches!(err, EngineError::TemplateMissing { .. }));
    }
}
