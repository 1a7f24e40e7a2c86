//! Randomized checks of pipeline invariants

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{add_ball, add_floor};
use crate::animation::{Animation, LaunchParams, Scheduler};
use crate::core::PhysicsConfig;
use crate::foundation::math::Vec3;
use crate::foundation::time::FixedTimestep;
use crate::physics::broad_phase::cull_candidates;
use crate::physics::hit::HitBuffer;
use crate::physics::narrow_phase::{DetectionStats, NarrowPhase, SweepPath, SweepSource};
use crate::scene::Scene;

fn random_vec(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

#[test]
fn test_broad_phase_keeps_every_narrow_phase_hit() {
    let config = PhysicsConfig::default();
    let mut rng = StdRng::seed_from_u64(7);

    for _ in 0..50 {
        let mut scene = Scene::new();
        for i in 0..20 {
            let position = random_vec(&mut rng, 30.0);
            let radius = rng.gen_range(0.5..4.0);
            add_ball(&mut scene, &format!("rock {i}"), position, radius);
        }
        let start = random_vec(&mut rng, 30.0);
        let delta = random_vec(&mut rng, 25.0);
        let source = add_ball(&mut scene, "shot", start + delta, rng.gen_range(0.0..2.0));

        let mut mask = Vec::new();
        cull_candidates(&scene, source, delta.magnitude(), &mut mask);

        let sweep = SweepSource {
            entity: source,
            path: SweepPath::Body {
                delta,
                delta_length: delta.magnitude(),
            },
            last_position: start,
            velocity: delta,
            last_hit: None,
            ignored: &[],
        };
        let everything = vec![true; scene.len()];
        let mut hits = HitBuffer::new();
        let mut stats = DetectionStats::default();
        NarrowPhase::new(&config).detect(&scene, &sweep, &everything, &mut hits, &mut stats);

        for hit in hits.iter() {
            let index = scene.index_of(hit.marker.entity).unwrap();
            assert!(mask[index], "culled entity was hit at t0 {}", hit.t0);
            assert!((0.0..=1.0).contains(&hit.t0));
        }
    }
}

#[test]
fn test_ball_rain_stays_finite_and_bounded() {
    let config = PhysicsConfig::default();
    let max_iterations = config.max_iterations;
    let mut rng = StdRng::seed_from_u64(32);

    let mut scene = Scene::new();
    add_floor(&mut scene);
    let mut scheduler = Scheduler::new(config).unwrap();
    let mut balls = Vec::new();
    for i in 0..32 {
        let id = add_ball(&mut scene, &format!("ball {i}"), Vec3::zeros(), 1.0);
        let position = Vec3::new(rng.gen_range(-8.0..8.0), rng.gen_range(5.0..40.0), rng.gen_range(-8.0..8.0));
        let velocity = Vec3::new(rng.gen_range(-3.0..3.0), 0.0, rng.gen_range(-3.0..3.0));
        scheduler.push(Animation::base(id, Vec3::zeros(), 1.0).with_launch(LaunchParams::new(position, velocity)));
        balls.push(id);
    }

    let mut clock = FixedTimestep::new(1.0 / 30.0);
    let mut contacts = 0;
    for _ in 0..300 {
        let report = scheduler.tick(&mut scene, &mut clock);
        assert!(report.iterations <= max_iterations);
        assert_eq!(report.invariant_violations, 0);
        contacts += report.contacts_resolved;

        for animation in scheduler.animations() {
            assert!(animation.motion.delta_length.is_finite());
            assert!(animation.motion.velocity.iter().all(|v| v.is_finite()));
        }
        for id in &balls {
            let position = scene.get(*id).unwrap().position();
            assert!(position.iter().all(|v| v.is_finite()));
        }
    }
    assert!(contacts > 0);
}
