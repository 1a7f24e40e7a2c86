//! Animation record
//!
//! An [`Animation`] drives one scene entity. Its behaviour per frame is picked
//! by [`AnimationKind`] and its reaction to contacts by [`CollisionResponse`];
//! the scheduler dispatches on both, so no per-instance callbacks exist.

use log::debug;

use super::particles::ParticleSystem;
use super::state::AnimationState;
use crate::foundation::math::Vec3;
use crate::physics::hit::{ClosestHit, HitBuffer, HitMarker};
use crate::physics::narrow_phase::Segment;
use crate::scene::{Entity, EntityId};

/// Predicate checked in the last pass; returning true ends the animation
pub type EndCondition = fn(&Animation, &Entity) -> bool;

/// Ends a particle animation once every particle has been marked
pub fn particles_exhausted(animation: &Animation, _entity: &Entity) -> bool {
    animation.particles_state().is_some_and(|p| p.active_count() == 0)
}

/// What an animation does every frame
#[derive(Debug, Clone, PartialEq)]
pub enum AnimationKind {
    /// Constant linear and angular velocity; never a collision source
    Transform,
    /// Velocity with gravity; swept sphere collision
    Base,
    /// Entity motion plus independent particles tested as points
    Particle(ParticleSystem),
    /// Entity edges tested as segments every frame; contacts are recorded, not resolved
    Probe,
}

impl AnimationKind {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            AnimationKind::Transform => "transform",
            AnimationKind::Base => "base",
            AnimationKind::Particle(_) => "particle",
            AnimationKind::Probe => "probe",
        }
    }
}

/// Reaction of a source animation to its closest contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionResponse {
    /// Not a collision source
    #[default]
    None,
    /// Reflect with drag
    Bounce,
    /// Reflect and shed speed, pushing out when started inside
    Slide,
    /// Deactivate struck particles, or record the contact
    Mark,
}

/// Initial conditions applied when an animation is (re)launched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParams {
    /// Start position of the entity
    pub position: Vec3,
    /// Start velocity
    pub velocity: Vec3,
    /// Angular velocity (scaled axis, radians per second)
    pub angular_velocity: Vec3,
    /// Time to live in seconds; negative means forever
    pub ttl: f32,
}

impl LaunchParams {
    /// Launch from `position` with `velocity`, no spin, living forever
    pub fn new(position: Vec3, velocity: Vec3) -> Self {
        Self {
            position,
            velocity,
            angular_velocity: Vec3::zeros(),
            ttl: -1.0,
        }
    }

    /// Set time to live
    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set angular velocity
    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }
}

/// Mutable motion state handed to every pass and resolver
#[derive(Debug, Clone, PartialEq)]
pub struct Motion {
    /// Linear velocity
    pub velocity: Vec3,
    /// Angular velocity (scaled axis per second)
    pub angular_velocity: Vec3,
    /// Multiplier on the configured gravity
    pub gravity_scale: f32,
    /// Gravity velocity change applied this frame
    pub frame_gravity: f32,
    /// Entity position at the start of the current sweep
    pub last_position: Vec3,
    /// Planned displacement this frame
    pub delta: Vec3,
    /// Length of `delta`; -1 when not a collision source this frame
    pub delta_length: f32,
    /// Contact resolved in the previous iteration
    pub last_hit: Option<HitMarker>,
}

impl Default for Motion {
    fn default() -> Self {
        Self {
            velocity: Vec3::zeros(),
            angular_velocity: Vec3::zeros(),
            gravity_scale: 0.0,
            frame_gravity: 0.0,
            last_position: Vec3::zeros(),
            delta: Vec3::zeros(),
            delta_length: -1.0,
            last_hit: None,
        }
    }
}

impl Motion {
    /// True when the broad phase should consider this motion
    pub fn is_source(&self) -> bool {
        self.delta_length > -1.0
    }
}

/// Per-object animation state
#[derive(Debug, Clone)]
pub struct Animation {
    /// Label used in logs
    pub label: String,
    /// Entity driven by this animation
    pub target: EntityId,
    /// Per-frame behaviour
    pub kind: AnimationKind,
    /// Reaction when this animation strikes something
    pub response: CollisionResponse,
    /// React when another animation strikes this one
    pub target_response: bool,
    /// State entered when the time to live runs out
    pub end_state: AnimationState,
    /// Remaining time to live; negative means forever
    pub ttl: f32,
    /// Motion state
    pub motion: Motion,
    /// Optional end predicate
    pub end_condition: Option<EndCondition>,
    state: AnimationState,
    launch: Option<LaunchParams>,
    pub(crate) candidates: Vec<bool>,
    pub(crate) hits: HitBuffer,
    pub(crate) target_hits: HitBuffer,
    pub(crate) ignored: Vec<HitMarker>,
    pub(crate) segments: Vec<Segment>,
    pub(crate) contacts: Vec<ClosestHit>,
    pub(crate) aborted: bool,
}

impl Animation {
    fn new(label: impl Into<String>, target: EntityId, kind: AnimationKind, response: CollisionResponse) -> Self {
        Self {
            label: label.into(),
            target,
            kind,
            response,
            target_response: false,
            end_state: AnimationState::Done,
            ttl: -1.0,
            motion: Motion::default(),
            end_condition: None,
            state: AnimationState::Reset,
            launch: None,
            candidates: Vec::new(),
            hits: HitBuffer::new(),
            target_hits: HitBuffer::new(),
            ignored: Vec::new(),
            segments: Vec::new(),
            contacts: Vec::new(),
            aborted: false,
        }
    }

    /// Constant velocity and spin, no gravity, no collision
    pub fn transform(target: EntityId, velocity: Vec3, angular_velocity: Vec3) -> Self {
        let mut animation = Self::new("transform", target, AnimationKind::Transform, CollisionResponse::None);
        animation.motion.velocity = velocity;
        animation.motion.angular_velocity = angular_velocity;
        animation
    }

    /// Ballistic body with gravity; bounces and reacts when struck
    pub fn base(target: EntityId, velocity: Vec3, gravity_scale: f32) -> Self {
        let mut animation = Self::new("base", target, AnimationKind::Base, CollisionResponse::Bounce);
        animation.motion.velocity = velocity;
        animation.motion.gravity_scale = gravity_scale;
        animation.target_response = true;
        animation
    }

    /// Particle spray; struck particles are deactivated
    pub fn particles(target: EntityId, particles: ParticleSystem, velocity: Vec3, gravity_scale: f32) -> Self {
        let mut animation = Self::new("particles", target, AnimationKind::Particle(particles), CollisionResponse::Mark);
        animation.motion.velocity = velocity;
        animation.motion.gravity_scale = gravity_scale;
        animation
    }

    /// Edge probe recording what its edges cross
    pub fn probe(target: EntityId) -> Self {
        Self::new("probe", target, AnimationKind::Probe, CollisionResponse::Mark)
    }

    /// Set the log label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the collision response
    pub fn with_response(mut self, response: CollisionResponse) -> Self {
        self.response = response;
        self
    }

    /// React (or not) when struck by another animation
    pub fn with_target_response(mut self, enabled: bool) -> Self {
        self.target_response = enabled;
        self
    }

    /// Set the time to live (negative means forever)
    pub fn with_ttl(mut self, ttl: f32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the state entered when the time to live runs out
    pub fn with_end_state(mut self, end_state: AnimationState) -> Self {
        self.end_state = end_state;
        self
    }

    /// Set the end predicate
    pub fn with_end_condition(mut self, condition: EndCondition) -> Self {
        self.end_condition = Some(condition);
        self
    }

    /// Request a launch; applied by the next first pass
    pub fn with_launch(mut self, params: LaunchParams) -> Self {
        self.launch(params);
        self
    }

    /// Current state
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Move to `next` if the lifecycle allows it; returns whether it changed
    pub fn set_state(&mut self, next: AnimationState) -> bool {
        if self.state == next || !self.state.can_transition_to(next) {
            return false;
        }
        debug!("animation '{}': {:?} -> {:?}", self.label, self.state, next);
        self.state = next;
        true
    }

    /// Queue launch parameters and enter Restart
    pub fn launch(&mut self, params: LaunchParams) -> bool {
        if !self.state.can_transition_to(AnimationState::Restart) {
            return false;
        }
        self.launch = Some(params);
        self.set_state(AnimationState::Restart);
        true
    }

    /// Parameters of the most recent launch
    pub fn launch_params(&self) -> Option<&LaunchParams> {
        self.launch.as_ref()
    }

    /// Start in place without launch parameters
    pub fn play(&mut self) -> bool {
        self.set_state(AnimationState::Play)
    }

    /// Freeze
    pub fn pause(&mut self) -> bool {
        self.state == AnimationState::Play && self.set_state(AnimationState::Pause)
    }

    /// Unfreeze
    pub fn resume(&mut self) -> bool {
        self.state == AnimationState::Pause && self.set_state(AnimationState::Play)
    }

    /// Back to Reset
    pub fn reset(&mut self) -> bool {
        self.set_state(AnimationState::Reset)
    }

    /// Finish; removed with its entity at the next cleanup
    pub fn done(&mut self) -> bool {
        self.set_state(AnimationState::Done)
    }

    /// Particle state, if this is a particle animation
    pub fn particles_state(&self) -> Option<&ParticleSystem> {
        match &self.kind {
            AnimationKind::Particle(particles) => Some(particles),
            _ => None,
        }
    }

    /// Contacts recorded this frame by the Mark response
    pub fn contacts(&self) -> &[ClosestHit] {
        &self.contacts
    }

    /// Closest contact found in the latest detection sweep
    pub fn closest_hit(&self) -> Option<&ClosestHit> {
        self.hits.closest()
    }

    /// Clear per-frame collision bookkeeping
    pub(crate) fn reset_collisions(&mut self) {
        self.hits.clear();
        self.target_hits.clear();
        self.ignored.clear();
        self.contacts.clear();
        self.aborted = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn id() -> EntityId {
        EntityId::from(KeyData::from_ffi(1))
    }

    #[test]
    fn test_lifecycle_methods() {
        let mut animation = Animation::base(id(), Vec3::zeros(), 1.0);
        assert_eq!(animation.state(), AnimationState::Reset);
        assert!(!animation.pause());

        assert!(animation.launch(LaunchParams::new(Vec3::y(), Vec3::x()).with_ttl(2.0)));
        assert_eq!(animation.state(), AnimationState::Restart);
        assert_eq!(animation.launch_params().unwrap().ttl, 2.0);

        assert!(animation.play());
        assert!(animation.pause());
        assert!(!animation.pause());
        assert!(animation.resume());
        assert!(animation.done());
        assert!(!animation.launch(LaunchParams::new(Vec3::zeros(), Vec3::zeros())));
        assert!(!animation.resume());
    }

    #[test]
    fn test_factories_pick_responses() {
        assert_eq!(Animation::transform(id(), Vec3::x(), Vec3::zeros()).response, CollisionResponse::None);
        assert_eq!(Animation::base(id(), Vec3::x(), 1.0).response, CollisionResponse::Bounce);
        let spray = Animation::particles(id(), ParticleSystem::new(), Vec3::zeros(), 0.0);
        assert_eq!(spray.response, CollisionResponse::Mark);
        assert!(spray.particles_state().is_some());
        assert_eq!(Animation::probe(id()).kind.name(), "probe");
        assert!(!Motion::default().is_source());
    }

    #[test]
    fn test_particles_exhausted() {
        let entity = Entity::new("spray");
        let mut spray = Animation::particles(id(), ParticleSystem::from_particles([(Vec3::zeros(), Vec3::x())]), Vec3::zeros(), 0.0);
        assert!(!particles_exhausted(&spray, &entity));
        if let AnimationKind::Particle(system) = &mut spray.kind {
            system.mark(0);
        }
        assert!(particles_exhausted(&spray, &entity));
        assert!(!particles_exhausted(&Animation::probe(id()), &entity));
    }
}
