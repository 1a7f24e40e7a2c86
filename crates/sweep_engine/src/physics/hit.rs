//! Closest-hit records
//!
//! A [`HitBuffer`] collects the contacts one animation found during a single
//! detection sweep. It never grows past [`MAX_CONTACTS`]: once full, a new
//! record evicts the farthest one only if it is closer.

use crate::core::MAX_CONTACTS;
use crate::foundation::math::Vec3;
use crate::physics::collision::ShapeKind;
use crate::scene::EntityId;

/// Identity of a struck shape, used to skip re-detecting a resolved contact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitMarker {
    /// Entity owning the struck shape
    pub entity: EntityId,
    /// Kind of the struck shape
    pub kind: ShapeKind,
    /// Index of the struck shape within its kind
    pub index: usize,
}

/// One swept-test contact
#[derive(Debug, Clone, PartialEq)]
pub struct ClosestHit {
    /// Struck shape
    pub marker: HitMarker,
    /// Fraction of this frame's displacement travelled before contact, in `[0, 1]`
    pub t0: f32,
    /// Signed travel distance to contact; negative when the source started inside
    pub distance: f32,
    /// Contact normal pointing toward the source (not necessarily unit length)
    pub normal: Vec3,
    /// Source entity position at contact (segment point for point and edge sources)
    pub point: Vec3,
    /// Shape kind on the moving side
    pub source_kind: ShapeKind,
    /// Shape (or particle) index on the moving side
    pub source_index: usize,
    /// Velocity of the source when it struck, read by target-side responses
    pub striking_velocity: Vec3,
}

/// Fixed-capacity store of hit records that keeps the closest ones
#[derive(Debug, Clone)]
pub struct HitBuffer {
    hits: Vec<ClosestHit>,
    dropped: usize,
}

impl Default for HitBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HitBuffer {
    /// Empty buffer with room for [`MAX_CONTACTS`] records
    pub fn new() -> Self {
        Self {
            hits: Vec::with_capacity(MAX_CONTACTS),
            dropped: 0,
        }
    }

    /// Add a record; returns false if it was discarded for being the farthest
    pub fn push(&mut self, hit: ClosestHit) -> bool {
        if self.hits.len() < MAX_CONTACTS {
            self.hits.push(hit);
            return true;
        }

        self.dropped += 1;
        // Latest farthest record goes first so earlier ties survive
        let farthest = self
            .hits
            .iter()
            .enumerate()
            .fold(0, |best, (i, h)| if h.t0 >= self.hits[best].t0 { i } else { best });
        if hit.t0 < self.hits[farthest].t0 {
            // Remove and append keeps the remaining records in encounter order
            self.hits.remove(farthest);
            self.hits.push(hit);
            true
        } else {
            false
        }
    }

    /// Record with the smallest t0; the first one pushed wins ties
    pub fn closest(&self) -> Option<&ClosestHit> {
        self.hits
            .iter()
            .fold(None, |best: Option<&ClosestHit>, h| match best {
                Some(b) if b.t0 <= h.t0 => Some(b),
                _ => Some(h),
            })
    }

    /// All buffered records in encounter order
    pub fn iter(&self) -> impl Iterator<Item = &ClosestHit> {
        self.hits.iter()
    }

    /// Number of buffered records
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True when nothing was found
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Records discarded since the last clear
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Forget every record
    pub fn clear(&mut self) {
        self.hits.clear();
        self.dropped = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn hit(index: usize, t0: f32) -> ClosestHit {
        ClosestHit {
            marker: HitMarker {
                entity: EntityId::from(KeyData::from_ffi(1)),
                kind: ShapeKind::Sphere,
                index,
            },
            t0,
            distance: t0,
            normal: Vec3::y(),
            point: Vec3::zeros(),
            source_kind: ShapeKind::Sphere,
            source_index: 0,
            striking_velocity: Vec3::zeros(),
        }
    }

    #[test]
    fn test_closest_prefers_first_on_ties() {
        let mut buffer = HitBuffer::new();
        buffer.push(hit(0, 0.5));
        buffer.push(hit(1, 0.2));
        buffer.push(hit(2, 0.2));
        assert_eq!(buffer.closest().unwrap().marker.index, 1);
    }

    #[test]
    fn test_full_buffer_keeps_closest() {
        let mut buffer = HitBuffer::new();
        for i in 0..MAX_CONTACTS {
            assert!(buffer.push(hit(i, 0.1 * (i + 1) as f32)));
        }
        assert!(!buffer.push(hit(100, 0.95)));
        assert!(buffer.push(hit(101, 0.05)));

        assert_eq!(buffer.len(), MAX_CONTACTS);
        assert_eq!(buffer.dropped(), 2);
        assert_eq!(buffer.closest().unwrap().marker.index, 101);
        assert!(buffer.iter().all(|h| h.marker.index != MAX_CONTACTS - 1));

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.closest().is_none());
    }
}
