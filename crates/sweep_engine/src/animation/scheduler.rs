//! Frame scheduler
//!
//! Owns the active animation list and runs the per-frame pipeline:
//!
//! 1. **Cleanup**: drop finished animations together with their entities
//! 2. **First pass**: apply launches, integrate velocity and gravity, move entities
//! 3. **Cull**: broad-phase candidate mask for every collision source
//! 4. **Resolve loop**: detect for every source, then resolve every contact,
//!    until a sweep finds nothing or the iteration cap is reached
//! 5. **Last pass**: time to live, end conditions, visibility
//!
//! All detection in an iteration finishes before any resolver moves an
//! entity, so every closest-hit choice sees the same snapshot.

use std::collections::HashMap;

use log::{debug, error, trace, warn};

use super::diagnostics::FrameReport;
use super::record::{Animation, AnimationKind, CollisionResponse};
use super::state::AnimationState;
use crate::core::PhysicsConfig;
use crate::foundation::math::{Point3, Vec3};
use crate::foundation::time::Clock;
use crate::physics::broad_phase::cull_candidates;
use crate::physics::collision::ShapeKind;
use crate::physics::narrow_phase::{DetectionStats, NarrowPhase, Segment, SweepPath, SweepSource};
use crate::physics::resolver::{self, ResolveContext};
use crate::physics::PhysicsError;
use crate::scene::{Entity, EntityId, Scene};

/// Runs every animation through the frame pipeline
pub struct Scheduler {
    config: PhysicsConfig,
    animations: Vec<Animation>,
    last_launch: Option<Animation>,
}

impl Scheduler {
    /// Create a scheduler; the configuration is validated first
    pub fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        config.validate()?;
        Ok(Self {
            config,
            animations: Vec::new(),
            last_launch: None,
        })
    }

    /// Tuning in use
    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Add an animation. A launched animation is also remembered for
    /// [`Scheduler::replay_last`].
    pub fn push(&mut self, animation: Animation) {
        if animation.state() == AnimationState::Restart && animation.launch_params().is_some() {
            self.last_launch = Some(animation.clone());
        }
        debug!("animation '{}' ({}) added", animation.label, animation.kind.name());
        self.animations.push(animation);
    }

    /// Number of animations
    pub fn len(&self) -> usize {
        self.animations.len()
    }

    /// True when no animation is scheduled
    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    /// Animations in scheduling order
    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    /// Animation driving `target`
    pub fn find(&self, target: EntityId) -> Option<&Animation> {
        self.animations.iter().find(|a| a.target == target)
    }

    /// Mutable animation driving `target`
    pub fn find_mut(&mut self, target: EntityId) -> Option<&mut Animation> {
        self.animations.iter_mut().find(|a| a.target == target)
    }

    /// Remove every animation and its entity. Returns how many were removed.
    pub fn clear(&mut self, scene: &mut Scene) -> usize {
        let count = self.animations.len();
        for animation in self.animations.drain(..) {
            scene.remove_entity(animation.target);
        }
        debug!("cleared {} animations", count);
        count
    }

    /// Launch the most recently launched animation again on a copy of `template`.
    ///
    /// Returns the new entity, or `None` when nothing was launched yet.
    pub fn replay_last(&mut self, scene: &mut Scene, template: EntityId) -> Result<Option<EntityId>, PhysicsError> {
        let Some(snapshot) = &self.last_launch else {
            return Ok(None);
        };
        let target = scene.clone_entity(template, format!("{} (replay)", snapshot.label))?;
        let mut animation = snapshot.clone();
        animation.target = target;
        debug!("replaying '{}'", animation.label);
        self.animations.push(animation);
        Ok(Some(target))
    }

    /// Pull the frame delta from `clock` and step
    pub fn tick(&mut self, scene: &mut Scene, clock: &mut dyn Clock) -> FrameReport {
        let delta_time = clock.tick();
        self.step(scene, delta_time)
    }

    /// Advance every animation by `delta_time` seconds
    pub fn step(&mut self, scene: &mut Scene, delta_time: f32) -> FrameReport {
        let mut report = FrameReport {
            removed: self.cleanup(scene),
            active: self.animations.len() as u32,
            converged: true,
            ..Default::default()
        };
        if !delta_time.is_finite() || delta_time <= 0.0 {
            warn!("ignoring frame with delta time {}", delta_time);
            return report;
        }

        self.first_pass(scene, delta_time);
        self.cull(scene, &mut report);
        self.resolve_loop(scene, delta_time, &mut report);
        self.last_pass(scene, delta_time);

        trace!("frame: {}", report);
        report
    }

    fn cleanup(&mut self, scene: &mut Scene) -> u32 {
        let mut removed = 0;
        self.animations.retain(|animation| {
            if !animation.state().is_terminal() {
                return true;
            }
            scene.remove_entity(animation.target);
            trace!("removed finished animation '{}'", animation.label);
            removed += 1;
            false
        });
        removed
    }

    fn first_pass(&mut self, scene: &mut Scene, delta_time: f32) {
        for animation in &mut self.animations {
            animation.reset_collisions();
            let Some(entity) = scene.get_mut(animation.target) else {
                warn!("animation '{}': {}", animation.label, PhysicsError::MissingEntity(animation.target));
                animation.motion.delta_length = -1.0;
                animation.done();
                continue;
            };
            integrate(animation, entity, delta_time, &self.config);
        }
    }

    fn cull(&mut self, scene: &Scene, report: &mut FrameReport) {
        for animation in &mut self.animations {
            let source = animation.state().is_running()
                && animation.response != CollisionResponse::None
                && animation.motion.is_source()
                && scene.get(animation.target).is_some_and(|e| e.collision_enabled);
            if source {
                let reach = animation.motion.delta_length;
                report.candidate_pairs += cull_candidates(scene, animation.target, reach, &mut animation.candidates) as u32;
            } else {
                animation.candidates.clear();
            }
        }
    }

    fn resolve_loop(&mut self, scene: &mut Scene, delta_time: f32, report: &mut FrameReport) {
        let by_target: HashMap<EntityId, usize> = self
            .animations
            .iter()
            .enumerate()
            .map(|(index, animation)| (animation.target, index))
            .collect();

        report.converged = false;
        while report.iterations < self.config.max_iterations {
            report.iterations += 1;

            let detector = NarrowPhase::new(&self.config);
            for animation in &mut self.animations {
                animation.hits.clear();
                animation.target_hits.clear();
                if !detectable(animation) {
                    continue;
                }
                let path = match animation.kind {
                    AnimationKind::Particle(_) | AnimationKind::Probe => SweepPath::Segments(&animation.segments),
                    AnimationKind::Base | AnimationKind::Transform => SweepPath::Body {
                        delta: animation.motion.delta,
                        delta_length: animation.motion.delta_length,
                    },
                };
                let source = SweepSource {
                    entity: animation.target,
                    path,
                    last_position: animation.motion.last_position,
                    velocity: animation.motion.velocity,
                    last_hit: animation.motion.last_hit,
                    ignored: &animation.ignored,
                };
                let mut stats = DetectionStats::default();
                detector.detect(scene, &source, &animation.candidates, &mut animation.hits, &mut stats);
                report.absorb(&stats);
            }

            self.forward_target_hits(&by_target);

            let mut found = false;
            for animation in &mut self.animations {
                if animation.hits.is_empty() && animation.target_hits.is_empty() {
                    continue;
                }
                found = true;
                let Some(entity) = scene.get_mut(animation.target) else {
                    continue;
                };
                match resolve(animation, entity, delta_time, &self.config, report) {
                    Ok(resolved) => report.contacts_resolved += resolved,
                    Err(e) => abort(animation, entity, e, report),
                }
            }

            if !found {
                report.converged = true;
                break;
            }
        }

        if !report.converged {
            debug!(
                "resolve loop stopped at {} iterations with contacts pending",
                self.config.max_iterations
            );
        }
    }

    /// Hand each struck animation the record of the source that hit it
    fn forward_target_hits(&mut self, by_target: &HashMap<EntityId, usize>) {
        let forwarded: Vec<_> = self
            .animations
            .iter()
            .filter_map(|animation| {
                let hit = animation.hits.closest()?;
                if hit.source_kind != ShapeKind::Sphere || hit.marker.kind != ShapeKind::Sphere {
                    return None;
                }
                let index = *by_target.get(&hit.marker.entity)?;
                Some((index, hit.clone()))
            })
            .collect();

        for (index, hit) in forwarded {
            let struck = &mut self.animations[index];
            if struck.target_response && struck.state().is_running() && !struck.aborted {
                struck.target_hits.push(hit);
            }
        }
    }

    fn last_pass(&mut self, scene: &mut Scene, delta_time: f32) {
        for animation in &mut self.animations {
            if !animation.state().is_running() {
                continue;
            }
            let Some(entity) = scene.get_mut(animation.target) else {
                continue;
            };

            let mut expired = false;
            if animation.ttl >= 0.0 {
                animation.ttl -= delta_time;
                expired = animation.ttl < 0.0;
            }
            if let Some(condition) = animation.end_condition {
                expired |= condition(animation, entity);
            }

            if expired {
                let end_state = animation.end_state;
                animation.set_state(end_state);
                entity.visible = false;
                debug!("animation '{}' ended in {:?}", animation.label, end_state);
            }
        }
    }
}

fn detectable(animation: &Animation) -> bool {
    animation.state().is_running()
        && !animation.aborted
        && animation.response != CollisionResponse::None
        && animation.motion.delta_length > 0.0
        && !animation.candidates.is_empty()
}

/// First pass for one animation
fn integrate(animation: &mut Animation, entity: &mut Entity, delta_time: f32, config: &PhysicsConfig) {
    if animation.state() == AnimationState::Restart {
        if let Some(params) = animation.launch_params().copied() {
            entity.set_position(params.position);
            animation.motion.velocity = params.velocity;
            animation.motion.angular_velocity = params.angular_velocity;
            animation.ttl = params.ttl;
        }
        let motion = &mut animation.motion;
        motion.last_position = entity.position();
        motion.delta = Vec3::zeros();
        motion.delta_length = -1.0;
        motion.last_hit = None;
        entity.visible = true;
        entity.reset_matrix();
        animation.set_state(AnimationState::Play);
        debug!("animation '{}' launched at {:?}", animation.label, entity.position());
        return;
    }

    if !animation.state().is_running() {
        animation.motion.delta_length = -1.0;
        return;
    }

    let motion = &mut animation.motion;
    let start_matrix = *entity.world_matrix();
    motion.last_position = entity.position();
    motion.last_hit = None;
    motion.delta = motion.velocity * delta_time;
    motion.frame_gravity = config.gravity * motion.gravity_scale * delta_time;
    entity.transform.rotate_by(motion.angular_velocity * delta_time);
    entity.set_position(motion.last_position + motion.delta);

    match &mut animation.kind {
        AnimationKind::Transform => {
            motion.frame_gravity = 0.0;
            motion.delta_length = -1.0;
            entity.reset_matrix();
        }
        AnimationKind::Base => {
            motion.velocity.y -= motion.frame_gravity;
            motion.delta_length = if animation.response == CollisionResponse::None {
                -1.0
            } else {
                motion.delta.magnitude()
            };
            entity.reset_matrix();
        }
        AnimationKind::Particle(system) => {
            motion.velocity.y -= motion.frame_gravity;
            let removed = system.compact();
            if removed > 0 {
                trace!("animation '{}' dropped {} particles", animation.label, removed);
            }
            let starts: Vec<Vec3> = system
                .positions()
                .iter()
                .map(|p| start_matrix.transform_point(&Point3::from(*p)).coords)
                .collect();

            entity.cull_distance = system.advance(delta_time);
            entity.shapes_mut().set_points(system.positions().iter().copied());
            entity.reset_matrix();

            animation.segments = starts
                .iter()
                .zip(entity.world_shapes().points())
                .enumerate()
                .map(|(index, (start, end))| Segment {
                    start: *start,
                    vector: end - start,
                    source_kind: ShapeKind::Point,
                    source_index: index,
                    active: true,
                })
                .collect();
            motion.delta_length = longest(&animation.segments).max(motion.delta.magnitude());
        }
        AnimationKind::Probe => {
            entity.reset_matrix();
            animation.segments = entity
                .world_shapes()
                .edges()
                .iter()
                .enumerate()
                .map(|(index, edge)| Segment {
                    start: edge.origin,
                    vector: edge.vector,
                    source_kind: ShapeKind::Edge,
                    source_index: index,
                    active: true,
                })
                .collect();
            motion.delta_length = if animation.segments.is_empty() {
                -1.0
            } else {
                longest(&animation.segments)
            };
        }
    }
}

fn longest(segments: &[Segment]) -> f32 {
    segments.iter().map(|s| s.vector.magnitude()).fold(0.0, f32::max)
}

/// Resolve the contacts found for one animation this iteration
fn resolve(
    animation: &mut Animation,
    entity: &mut Entity,
    delta_time: f32,
    config: &PhysicsConfig,
    report: &mut FrameReport,
) -> Result<u32, PhysicsError> {
    let source_hit = animation.hits.closest().cloned();
    let target_hit = animation.target_hits.closest().cloned();

    let struck_first = match (&source_hit, &target_hit) {
        (Some(source), Some(target)) => target.t0 < source.t0,
        (None, Some(_)) => true,
        _ => false,
    };
    if struck_first {
        if let Some(hit) = target_hit {
            let mut ctx = ResolveContext {
                label: &animation.label,
                motion: &mut animation.motion,
                entity,
                delta_time,
                config,
            };
            resolver::nudge(&mut ctx, &hit)?;
            if config.record_contact_points {
                report.contact_points.push(hit.point);
            }
            return Ok(1);
        }
    }

    let Some(hit) = source_hit else {
        return Ok(0);
    };
    if config.record_contact_points {
        report.contact_points.extend(animation.hits.iter().map(|h| h.point));
    }

    let mut ctx = ResolveContext {
        label: &animation.label,
        motion: &mut animation.motion,
        entity,
        delta_time,
        config,
    };
    match animation.response {
        CollisionResponse::Bounce => resolver::bounce(&mut ctx, &hit).map(|_| 1),
        CollisionResponse::Slide => resolver::slide(&mut ctx, &hit).map(|_| 1),
        CollisionResponse::Mark => {
            let particles = match &mut animation.kind {
                AnimationKind::Particle(system) => Some(system),
                _ => None,
            };
            Ok(resolver::mark(
                &animation.hits,
                particles,
                &mut animation.segments,
                &mut animation.ignored,
                &mut animation.contacts,
            ))
        }
        CollisionResponse::None => Ok(0),
    }
}

/// Drop the animation's remaining displacement for this frame
fn abort(animation: &mut Animation, entity: &mut Entity, e: PhysicsError, report: &mut FrameReport) {
    error!("animation '{}' aborted for this frame: {}", animation.label, e);
    match e {
        PhysicsError::Geometry(_) => report.degenerate_inputs += 1,
        _ => report.invariant_violations += 1,
    }
    animation.aborted = true;
    animation.hits.clear();
    animation.target_hits.clear();
    animation.motion.delta = Vec3::zeros();
    animation.motion.delta_length = 0.0;
    entity.set_position(animation.motion.last_position);
    entity.reset_matrix();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::record::LaunchParams;
    use crate::foundation::time::FixedTimestep;
    use crate::physics::collision::CollisionShapes;
    use approx::assert_relative_eq;

    fn ball(scene: &mut Scene, position: Vec3, radius: f32) -> EntityId {
        let mut shapes = CollisionShapes::new();
        shapes.push_sphere(Vec3::zeros(), radius);
        scene.add_entity(Entity::new("ball").with_position(position).with_shapes(shapes))
    }

    #[test]
    fn test_restart_applies_launch_then_plays() {
        let mut scene = Scene::new();
        let id = ball(&mut scene, Vec3::zeros(), 1.0);
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        let launch = LaunchParams::new(Vec3::new(0.0, 10.0, 0.0), Vec3::new(1.0, 0.0, 0.0)).with_ttl(5.0);
        scheduler.push(Animation::base(id, Vec3::zeros(), 0.0).with_launch(launch));

        scheduler.step(&mut scene, 0.5);
        let animation = scheduler.find(id).unwrap();
        assert_eq!(animation.state(), AnimationState::Play);
        assert_relative_eq!(scene.get(id).unwrap().position(), Vec3::new(0.0, 10.0, 0.0));

        scheduler.step(&mut scene, 0.5);
        assert_relative_eq!(scene.get(id).unwrap().position(), Vec3::new(0.5, 10.0, 0.0));
    }

    #[test]
    fn test_ttl_expiry_removes_animation_and_entity() {
        let mut scene = Scene::new();
        let id = ball(&mut scene, Vec3::zeros(), 1.0);
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        scheduler.push(
            Animation::transform(id, Vec3::x(), Vec3::zeros())
                .with_ttl(0.25)
                .with_launch(LaunchParams::new(Vec3::zeros(), Vec3::x()).with_ttl(0.25)),
        );

        let mut clock = FixedTimestep::new(0.1);
        for _ in 0..3 {
            scheduler.tick(&mut scene, &mut clock);
        }
        assert_eq!(scheduler.find(id).unwrap().state(), AnimationState::Done);
        assert!(!scene.get(id).unwrap().visible);

        let report = scheduler.tick(&mut scene, &mut clock);
        assert_eq!(report.removed, 1);
        assert!(scheduler.is_empty());
        assert!(scene.get(id).is_none());
    }

    #[test]
    fn test_end_state_pause_keeps_entity() {
        let mut scene = Scene::new();
        let id = ball(&mut scene, Vec3::zeros(), 1.0);
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        let mut animation = Animation::transform(id, Vec3::x(), Vec3::zeros())
            .with_ttl(0.05)
            .with_end_state(AnimationState::Pause);
        animation.play();
        scheduler.push(animation);

        scheduler.step(&mut scene, 0.1);
        scheduler.step(&mut scene, 0.1);
        assert_eq!(scheduler.find(id).unwrap().state(), AnimationState::Pause);
        assert_relative_eq!(scene.get(id).unwrap().position(), Vec3::new(0.1, 0.0, 0.0));
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_end_condition_finishes_animation() {
        fn below_ground(_: &Animation, entity: &Entity) -> bool {
            entity.position().y < 0.0
        }

        let mut scene = Scene::new();
        let id = ball(&mut scene, Vec3::new(0.0, 0.5, 0.0), 1.0);
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        let mut animation = Animation::transform(id, Vec3::new(0.0, -1.0, 0.0), Vec3::zeros())
            .with_end_condition(below_ground);
        animation.play();
        scheduler.push(animation);

        scheduler.step(&mut scene, 0.25);
        assert_eq!(scheduler.find(id).unwrap().state(), AnimationState::Play);
        scheduler.step(&mut scene, 0.5);
        assert_eq!(scheduler.find(id).unwrap().state(), AnimationState::Done);
    }

    #[test]
    fn test_paused_animation_does_not_move() {
        let mut scene = Scene::new();
        let id = ball(&mut scene, Vec3::zeros(), 1.0);
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        let mut animation = Animation::base(id, Vec3::x(), 1.0);
        animation.play();
        animation.pause();
        scheduler.push(animation);

        scheduler.step(&mut scene, 1.0);
        assert_relative_eq!(scene.get(id).unwrap().position(), Vec3::zeros());

        scheduler.find_mut(id).unwrap().resume();
        scheduler.step(&mut scene, 1.0);
        assert_relative_eq!(scene.get(id).unwrap().position().x, 1.0);
    }

    #[test]
    fn test_clear_and_replay() {
        let mut scene = Scene::new();
        let template = ball(&mut scene, Vec3::zeros(), 1.0);
        let thrown = scene.clone_entity(template, "thrown").unwrap();
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        assert_eq!(scheduler.replay_last(&mut scene, template).unwrap(), None);

        let launch = LaunchParams::new(Vec3::new(5.0, 5.0, 5.0), Vec3::zeros());
        scheduler.push(Animation::base(thrown, Vec3::zeros(), 1.0).with_launch(launch));
        let replay = scheduler.replay_last(&mut scene, template).unwrap().unwrap();
        assert_eq!(scheduler.len(), 2);

        scheduler.step(&mut scene, 0.1);
        assert_relative_eq!(scene.get(replay).unwrap().position(), Vec3::new(5.0, 5.0, 5.0));

        assert_eq!(scheduler.clear(&mut scene), 2);
        assert!(scene.get(thrown).is_none());
        assert!(scene.get(replay).is_none());
        assert!(scene.get(template).is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PhysicsConfig::default().with_max_iterations(0);
        assert!(matches!(Scheduler::new(config), Err(PhysicsError::Config(_))));
    }

    #[test]
    fn test_non_positive_delta_is_ignored() {
        let mut scene = Scene::new();
        let id = ball(&mut scene, Vec3::zeros(), 1.0);
        let mut scheduler = Scheduler::new(PhysicsConfig::default()).unwrap();
        let mut animation = Animation::base(id, Vec3::x(), 1.0);
        animation.play();
        scheduler.push(animation);

        let report = scheduler.step(&mut scene, f32::NAN);
        assert_eq!(report.iterations, 0);
        assert_relative_eq!(scene.get(id).unwrap().position(), Vec3::zeros());
    }
}
