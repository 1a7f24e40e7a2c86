//! Collision response
//!
//! Turns the winning [`ClosestHit`] of a detection sweep into a velocity and
//! position correction. Every resolver that re-integrates position adds this
//! frame's gravity back before reflecting and removes it again afterwards, so
//! gravity is counted once per frame however many contacts are resolved.

use log::trace;

use crate::animation::{Motion, ParticleSystem};
use crate::core::PhysicsConfig;
use crate::foundation::math::{reflect, try_normalize, Vec3};
use crate::physics::collision::ShapeKind;
use crate::physics::error::{GeometryError, PhysicsError};
use crate::physics::hit::{ClosestHit, HitBuffer, HitMarker};
use crate::physics::narrow_phase::Segment;
use crate::scene::Entity;

/// Explicit mutable state handed to a resolver
pub struct ResolveContext<'a> {
    /// Animation label, for errors
    pub label: &'a str,
    /// Motion of the animation being resolved
    pub motion: &'a mut Motion,
    /// Entity driven by the animation
    pub entity: &'a mut Entity,
    /// Frame delta in seconds
    pub delta_time: f32,
    /// Tuning
    pub config: &'a PhysicsConfig,
}

impl ResolveContext<'_> {
    fn violation(&self, detail: String) -> PhysicsError {
        PhysicsError::InvariantViolation {
            animation: self.label.to_string(),
            detail,
        }
    }

    /// Fraction of the frame left after contact, validated
    fn remainder(&self, hit: &ClosestHit) -> Result<f32, PhysicsError> {
        let epsilon = self.config.t0_epsilon;
        if !hit.t0.is_finite() || hit.t0 < -epsilon || hit.t0 > 1.0 + epsilon {
            return Err(self.violation(format!("t0 {} outside [0, 1]", hit.t0)));
        }
        let remainder = 1.0 - hit.t0;
        if remainder < -epsilon {
            return Err(self.violation(format!("remaining fraction {} is negative", remainder)));
        }
        Ok(remainder.max(0.0))
    }

    /// Re-integrate from `start` over `fraction` of the frame
    fn reintegrate(&mut self, start: Vec3, fraction: f32) {
        let motion = &mut *self.motion;
        motion.last_position = start;
        motion.delta = motion.velocity * (self.delta_time * fraction);
        motion.delta_length = motion.delta.magnitude();
        self.entity.set_position(start + motion.delta);
        self.entity.reset_matrix();
    }
}

fn unit_normal(hit: &ClosestHit) -> Result<Vec3, PhysicsError> {
    try_normalize(&hit.normal).ok_or(PhysicsError::Geometry(GeometryError::Degenerate("contact normal")))
}

/// Reflect with drag and re-integrate the rest of the frame from the contact.
///
/// On upward-facing contacts a rebound slower than one frame of gravity is
/// treated as resting: gravity along the normal is removed and the normal
/// speed is clamped at zero. Tangential speed is kept, so bodies still roll
/// down slopes without being launched off them.
pub fn bounce(ctx: &mut ResolveContext<'_>, hit: &ClosestHit) -> Result<(), PhysicsError> {
    let remainder = ctx.remainder(hit)?;
    let normal = unit_normal(hit)?;

    ctx.motion.last_hit = Some(hit.marker);
    let frame_gravity = ctx.motion.frame_gravity;
    ctx.motion.velocity.y += frame_gravity;

    if normal.dot(&ctx.motion.delta) < 0.0 {
        let velocity = &mut ctx.motion.velocity;
        *velocity = reflect(velocity, &normal) * ctx.config.bounce_drag;
        if normal.y > 0.0 && velocity.dot(&normal) < frame_gravity {
            *velocity -= normal * (frame_gravity * normal.y);
            let normal_speed = velocity.dot(&normal);
            if normal_speed < 0.0 {
                *velocity -= normal * normal_speed;
            }
        }
        ctx.reintegrate(hit.point, remainder);
    }

    ctx.motion.velocity.y -= frame_gravity;
    trace!("'{}' bounced off {:?} at t0 {:.4}", ctx.label, hit.marker.kind, hit.t0);
    Ok(())
}

/// Slide response.
///
/// Started inside (negative distance): restart from the contact point with a
/// push-out velocity covering the penetration, over the share of the frame
/// the penetration did not use. Crossed the surface: reflect, shed
/// `slide_deceleration * dt` of speed, and consume the rest of the frame.
pub fn slide(ctx: &mut ResolveContext<'_>, hit: &ClosestHit) -> Result<(), PhysicsError> {
    let remainder = ctx.remainder(hit)?;
    let normal = unit_normal(hit)?;

    ctx.motion.last_hit = Some(hit.marker);
    let frame_gravity = ctx.motion.frame_gravity;
    ctx.motion.velocity.y += frame_gravity;

    if hit.distance < 0.0 {
        let penetration = -hit.distance;
        ctx.motion.velocity += normal * (penetration / ctx.delta_time);
        let fraction = if ctx.motion.delta_length > 0.0 {
            (1.0 - penetration / ctx.motion.delta_length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        ctx.reintegrate(hit.point, fraction);
    } else if normal.dot(&ctx.motion.delta) < 0.0 {
        let velocity = &mut ctx.motion.velocity;
        *velocity = reflect(velocity, &normal);
        let speed = velocity.magnitude();
        if speed > 0.0 {
            let slowed = (speed - ctx.config.slide_deceleration * ctx.delta_time).max(0.0);
            *velocity *= slowed / speed;
        }
        ctx.reintegrate(hit.point, remainder);
    }

    ctx.motion.velocity.y -= frame_gravity;
    trace!("'{}' slid on {:?} at t0 {:.4}", ctx.label, hit.marker.kind, hit.t0);
    Ok(())
}

/// Response of an animation struck by another one: pushed away from the
/// striker in proportion to the striking speed, then dragged
pub fn nudge(ctx: &mut ResolveContext<'_>, hit: &ClosestHit) -> Result<(), PhysicsError> {
    let normal = unit_normal(hit)?;
    let strike = hit.striking_velocity.magnitude();

    let velocity = &mut ctx.motion.velocity;
    *velocity += normal * (-ctx.config.target_nudge * strike);
    *velocity *= ctx.config.bounce_drag;

    let start = ctx.motion.last_position;
    ctx.reintegrate(start, 1.0);
    if ctx.motion.delta_length < f32::EPSILON {
        ctx.motion.delta_length = f32::EPSILON;
    }
    trace!("'{}' nudged by a {:.2} u/s strike", ctx.label, strike);
    Ok(())
}

/// Mark response: deactivate every struck particle and record the contacts.
///
/// Non-particle contacts are remembered in `ignored` so the same shape is
/// not reported again this frame. Returns the number of contacts consumed.
pub fn mark(
    hits: &HitBuffer,
    mut particles: Option<&mut ParticleSystem>,
    segments: &mut [Segment],
    ignored: &mut Vec<HitMarker>,
    contacts: &mut Vec<ClosestHit>,
) -> u32 {
    let mut consumed = 0;
    for hit in hits.iter() {
        match (hit.source_kind, particles.as_deref_mut()) {
            (ShapeKind::Point, Some(system)) => {
                system.mark(hit.source_index);
                if let Some(segment) = segments.get_mut(hit.source_index) {
                    segment.active = false;
                }
            }
            _ => {
                if !ignored.contains(&hit.marker) {
                    ignored.push(hit.marker);
                }
            }
        }
        contacts.push(hit.clone());
        consumed += 1;
    }
    consumed
}
