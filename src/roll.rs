use std::f32::consts::FRAC_PI_2;
use std::sync::Arc;

use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::engine::{NodeId, SceneEngine};

/// Duration of one roll animation, in seconds.
pub const ROLL_DURATION: f32 = 0.5;

/// Applies randomized quarter-turn rolls to placed dice.
///
/// Generic over the random generator so tests can inject a seeded one; no
/// determinism is promised otherwise.
pub struct RollAnimator<R: Rng> {
    engine: Arc<dyn SceneEngine>,
    rng: R,
}

impl RollAnimator<StdRng> {
    /// Animator seeded from OS entropy.
    pub fn from_entropy(engine: Arc<dyn SceneEngine>) -> Self {
        Self::new(engine, StdRng::from_entropy())
    }

    /// Animator with a fixed seed, for reproducible sessions.
    pub fn seeded(engine: Arc<dyn SceneEngine>, seed: u64) -> Self {
        Self::new(engine, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RollAnimator<R> {
    pub fn new(engine: Arc<dyn SceneEngine>, rng: R) -> Self {
        Self { engine, rng }
    }

    /// Spins a die by a random quarter-turn multiple around X and Z.
    ///
    /// Each axis turns by one of 90, 180, 270 or 360 degrees; a zero turn is
    /// impossible.  The animation is fire-and-forget.
    pub fn roll(&mut self, die: NodeId) {
        let x = self.quarter_turns();
        let z = self.quarter_turns();
        debug!("rolling {:?} by ({:.3}, 0, {:.3})", die, x, z);
        self.engine
            .animate_rotation(die, Vec3::new(x, 0.0, z), ROLL_DURATION);
    }

    /// Rolls every die in the slice, each independently.
    pub fn roll_all(&mut self, dice: &[NodeId]) {
        for &die in dice {
            self.roll(die);
        }
    }

    fn quarter_turns(&mut self) -> f32 {
        self.rng.gen_range(1..=4) as f32 * FRAC_PI_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Geometry, Material, NodeDesc};
    use crate::sim::SimEngine;

    fn probe_node(engine: &SimEngine) -> NodeId {
        engine.spawn_node(NodeDesc {
            name: "die".into(),
            geometry: Geometry::Box { size: Vec3::splat(0.02) },
            material: Material::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
        })
    }

    fn is_quarter_multiple(angle: f32) -> bool {
        (1..=4).any(|k| (angle - k as f32 * FRAC_PI_2).abs() < 1e-6)
    }

    #[test]
    fn rolls_are_quarter_turns_and_never_zero() {
        let engine = Arc::new(SimEngine::new());
        let die = probe_node(&engine);
        let handle: Arc<dyn SceneEngine> = engine.clone();
        let mut roller = RollAnimator::seeded(handle, 42);

        for _ in 0..64 {
            roller.roll(die);
        }

        let actions = engine.animations();
        assert_eq!(actions.len(), 64);
        for action in actions {
            assert!(is_quarter_multiple(action.by.x), "x = {}", action.by.x);
            assert!(is_quarter_multiple(action.by.z), "z = {}", action.by.z);
            assert_eq!(action.by.y, 0.0);
            assert_eq!(action.duration_secs, ROLL_DURATION);
        }
    }

    #[test]
    fn roll_all_triggers_one_action_per_die() {
        let engine = Arc::new(SimEngine::new());
        let dice = [probe_node(&engine), probe_node(&engine), probe_node(&engine)];
        let handle: Arc<dyn SceneEngine> = engine.clone();
        let mut roller = RollAnimator::seeded(handle, 7);

        roller.roll_all(&dice);

        let actions = engine.animations();
        assert_eq!(actions.len(), 3);
        for (die, action) in dice.iter().zip(&actions) {
            assert_eq!(*die, action.node);
        }
    }

    #[test]
    fn roll_all_on_no_dice_does_nothing() {
        let engine = Arc::new(SimEngine::new());
        let handle: Arc<dyn SceneEngine> = engine.clone();
        let mut roller = RollAnimator::seeded(handle, 1);
        roller.roll_all(&[]);
        assert!(engine.animations().is_empty());
    }
}
