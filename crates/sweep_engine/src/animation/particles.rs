//! Particle state for point-source animations
//!
//! Particle positions are offsets from the owning entity's origin. Particles
//! struck this frame are deactivated in place and compacted out at the start
//! of the next first pass, keeping the survivors in their original order.

use crate::foundation::math::Vec3;

/// Parallel arrays of particle state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSystem {
    active: Vec<bool>,
    positions: Vec<Vec3>,
    velocities: Vec<Vec3>,
    speeds: Vec<f32>,
}

impl ParticleSystem {
    /// Empty system
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(offset, velocity)` pairs
    pub fn from_particles(particles: impl IntoIterator<Item = (Vec3, Vec3)>) -> Self {
        let mut system = Self::new();
        for (position, velocity) in particles {
            system.emit(position, velocity);
        }
        system
    }

    /// Add one active particle
    pub fn emit(&mut self, position: Vec3, velocity: Vec3) {
        self.active.push(true);
        self.positions.push(position);
        self.speeds.push(velocity.magnitude());
        self.velocities.push(velocity);
    }

    /// Number of particles, including ones deactivated this frame
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when no particles remain
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Particles still flying
    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    /// Whether particle `index` is active
    pub fn is_active(&self, index: usize) -> bool {
        self.active.get(index).copied().unwrap_or(false)
    }

    /// Offsets from the entity origin
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Per-particle velocities
    pub fn velocities(&self) -> &[Vec3] {
        &self.velocities
    }

    /// Per-particle speeds, cached at emission
    pub fn speeds(&self) -> &[f32] {
        &self.speeds
    }

    /// Deactivate a particle; false if it was already inactive or out of range
    pub fn mark(&mut self, index: usize) -> bool {
        match self.active.get_mut(index) {
            Some(active) if *active => {
                *active = false;
                true
            }
            _ => false,
        }
    }

    /// Drop deactivated particles, preserving the order of the rest.
    /// Returns how many were removed.
    pub fn compact(&mut self) -> usize {
        let before = self.len();
        let mut keep = self.active.iter().copied();
        self.positions.retain(|_| keep.next().unwrap_or(false));
        let mut keep = self.active.iter().copied();
        self.velocities.retain(|_| keep.next().unwrap_or(false));
        let mut keep = self.active.iter().copied();
        self.speeds.retain(|_| keep.next().unwrap_or(false));
        self.active.retain(|a| *a);
        before - self.len()
    }

    /// Move every particle by its velocity and return the new cull distance
    /// (length of the largest absolute offset on each axis)
    pub fn advance(&mut self, delta_time: f32) -> f32 {
        let mut extent = Vec3::zeros();
        for (position, velocity) in self.positions.iter_mut().zip(&self.velocities) {
            *position += velocity * delta_time;
            extent = extent.zip_map(&*position, |e, p| e.max(p.abs()));
        }
        extent.magnitude()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_compact_preserves_order() {
        let mut system = ParticleSystem::from_particles(
            (0..5).map(|i| (Vec3::new(i as f32, 0.0, 0.0), Vec3::new(0.0, i as f32, 0.0))),
        );
        assert!(system.mark(1));
        assert!(system.mark(3));
        assert!(!system.mark(3));
        assert!(!system.mark(42));
        assert_eq!(system.active_count(), 3);

        assert_eq!(system.compact(), 2);
        let xs: Vec<f32> = system.positions().iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
        let ys: Vec<f32> = system.velocities().iter().map(|v| v.y).collect();
        assert_eq!(ys, vec![0.0, 2.0, 4.0]);
        assert_eq!(system.speeds(), &[0.0, 2.0, 4.0]);
        assert!((0..3).all(|i| system.is_active(i)));
    }

    #[test]
    fn test_advance_reports_extent() {
        let mut system = ParticleSystem::from_particles([
            (Vec3::zeros(), Vec3::new(3.0, 0.0, 0.0)),
            (Vec3::zeros(), Vec3::new(0.0, -4.0, 0.0)),
        ]);
        let cull = system.advance(1.0);
        assert_relative_eq!(cull, 5.0);
        assert_relative_eq!(system.positions()[1], Vec3::new(0.0, -4.0, 0.0));
    }
}
