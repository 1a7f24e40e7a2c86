//! Headless demo: thrown balls, a ball rain and a pellet spray bouncing
//! through a small scene of planes, spheres and an edge probe.
//!
//! Usage: `sweep_demo [config.toml | config.ron]`

use nalgebra::UnitQuaternion;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sweep_engine::animation::particles_exhausted;
use sweep_engine::debug::CollisionDebugVisualizer;
use sweep_engine::foundation::logging;
use sweep_engine::prelude::*;

const TARGET_COUNT: usize = 5;
const TARGET_SPACING: f32 = 30.0;
const TARGET_RADIUS: f32 = 8.0;
const THROW_COUNT: usize = 3;
const THROW_SPEED: f32 = 120.0;
const BALL_RADIUS: f32 = 2.0;
const RAIN_COUNT: usize = 32;
const PELLET_COUNT: usize = 24;
const PELLET_SPEED: f32 = 150.0;
const FRAMES: u32 = 600;
const REPORT_EVERY: u32 = 60;

struct Demo {
    scene: Scene,
    scheduler: Scheduler,
    ball_template: EntityId,
    rng: StdRng,
    frame: u32,
}

impl Demo {
    fn new(config: PhysicsConfig) -> Result<Self, PhysicsError> {
        let mut scene = Scene::new();
        build_scene(&mut scene)?;

        let mut shapes = CollisionShapes::new();
        shapes.push_sphere(Vec3::zeros(), BALL_RADIUS);
        let ball_template = scene.add_entity(
            Entity::new("ball template")
                .with_shapes(shapes)
                .with_collision(false)
                .with_visible(false),
        );

        Ok(Self {
            scene,
            scheduler: Scheduler::new(config)?,
            ball_template,
            rng: StdRng::seed_from_u64(0x5eed),
            frame: 0,
        })
    }

    /// Copy of the ball template, ready to be launched
    fn spawn_ball(&mut self, name: String) -> Result<EntityId, PhysicsError> {
        let id = self.scene.clone_entity(self.ball_template, name)?;
        if let Some(entity) = self.scene.get_mut(id) {
            entity.collision_enabled = true;
        }
        Ok(id)
    }

    fn throw_balls(&mut self) -> Result<(), PhysicsError> {
        for i in 0..THROW_COUNT {
            let id = self.spawn_ball(format!("throw {i}"))?;
            let aim = Vec3::new(self.rng.gen_range(-0.2..0.2), self.rng.gen_range(0.0..0.3), -1.0).normalize();
            let launch = LaunchParams::new(Vec3::new(0.0, 20.0, 100.0), aim * THROW_SPEED).with_ttl(8.0);
            self.scheduler
                .push(Animation::base(id, Vec3::zeros(), 1.0).with_label(format!("throw {i}")).with_launch(launch));
        }
        log::info!("Threw {} balls", THROW_COUNT);
        Ok(())
    }

    fn ball_rain(&mut self) -> Result<(), PhysicsError> {
        for i in 0..RAIN_COUNT {
            let id = self.spawn_ball(format!("rain {i}"))?;
            let position = Vec3::new(
                self.rng.gen_range(-60.0..60.0),
                self.rng.gen_range(60.0..120.0),
                self.rng.gen_range(-60.0..60.0),
            );
            let velocity = Vec3::new(self.rng.gen_range(-5.0..5.0), 0.0, self.rng.gen_range(-5.0..5.0));
            let spin = Vec3::new(0.0, self.rng.gen_range(-2.0..2.0), 0.0);
            let launch = LaunchParams::new(position, velocity)
                .with_angular_velocity(spin)
                .with_ttl(20.0);
            let response = if i % 4 == 0 { CollisionResponse::Slide } else { CollisionResponse::Bounce };
            self.scheduler.push(
                Animation::base(id, Vec3::zeros(), 1.0)
                    .with_label(format!("rain {i}"))
                    .with_response(response)
                    .with_launch(launch),
            );
        }
        log::info!("Started a {} ball rain", RAIN_COUNT);
        Ok(())
    }

    fn pellet_spray(&mut self) {
        let origin = Vec3::new(0.0, 30.0, 80.0);
        let particles = ParticleSystem::from_particles((0..PELLET_COUNT).map(|_| {
            let direction = Vec3::new(
                self.rng.gen_range(-0.15..0.15),
                self.rng.gen_range(-0.15..0.15),
                -1.0,
            )
            .normalize();
            (Vec3::zeros(), direction * PELLET_SPEED)
        }));

        let mut shapes = CollisionShapes::new();
        for _ in 0..PELLET_COUNT {
            shapes.push_point(Vec3::zeros());
        }
        let id = self
            .scene
            .add_entity(Entity::new("pellets").with_position(origin).with_shapes(shapes));
        let mut animation = Animation::particles(id, particles, Vec3::zeros(), 0.5)
            .with_label("pellets")
            .with_ttl(3.0)
            .with_end_condition(particles_exhausted);
        animation.play();
        self.scheduler.push(animation);
        log::info!("Fired {} pellets", PELLET_COUNT);
    }

    fn run_frames(&mut self, clock: &mut dyn Clock, frames: u32, overlay: &mut CollisionDebugVisualizer) {
        for _ in 0..frames {
            let report = self.scheduler.tick(&mut self.scene, clock);
            overlay.capture(&self.scene, &report);
            self.frame += 1;
            if self.frame % REPORT_EVERY == 0 || !report.converged {
                log::info!("frame {}: {}", self.frame, report);
            }
        }
    }
}

/// Row of target spheres, three tilted ground planes, two finite walls and
/// a spinning edge probe
fn build_scene(scene: &mut Scene) -> Result<(), PhysicsError> {
    for i in 0..TARGET_COUNT {
        let x = (i as f32 - (TARGET_COUNT as f32 - 1.0) / 2.0) * TARGET_SPACING;
        let mut shapes = CollisionShapes::new();
        shapes.push_sphere(Vec3::zeros(), TARGET_RADIUS);
        scene.add_entity(
            Entity::new(format!("target {i}"))
                .with_position(Vec3::new(x, 10.0, -40.0))
                .with_shapes(shapes),
        );
    }

    for (name, x, tilt) in [("ground", 0.0, 0.0), ("ramp east", 50.0, 0.5), ("ramp west", -50.0, -0.5)] {
        let normal = UnitQuaternion::from_euler_angles(0.0, 0.0, tilt) * Vec3::y();
        let mut shapes = CollisionShapes::new();
        shapes.push_infinite_plane(normal, 0.0)?;
        scene.add_entity(Entity::new(name).with_position(Vec3::new(x, -50.0, 0.0)).with_shapes(shapes));
    }

    let mut walls = CollisionShapes::new();
    walls.push_finite_plane(Vec3::new(-25.0, 10.0, 25.0), Vec3::z(), Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0))?;
    walls.push_finite_plane(Vec3::new(25.0, -10.0, 0.0), Vec3::x(), Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 20.0, 0.0))?;
    scene.add_entity(Entity::new("walls").with_shapes(walls));

    Ok(())
}

fn add_probe(demo: &mut Demo) {
    let mut edges = CollisionShapes::new();
    edges.push_edge(Vec3::new(-15.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0));
    edges.push_edge(Vec3::new(0.0, -15.0, 0.0), Vec3::new(0.0, 30.0, 0.0));
    let id = demo
        .scene
        .add_entity(Entity::new("probe").with_position(Vec3::new(0.0, 10.0, 20.0)).with_shapes(edges));
    let mut animation = Animation::probe(id).with_label("probe");
    animation.motion.angular_velocity = Vec3::new(0.0, 0.0, 1.0);
    animation.play();
    demo.scheduler.push(animation);
}

fn load_config() -> Result<SimulationConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => SimulationConfig::load_from_file(&path),
        None => Ok(SimulationConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    logging::init(&config.log_level);
    log::info!("Starting sweep demo");

    let mut demo = Demo::new(config.physics.clone())?;
    add_probe(&mut demo);

    let mut overlay = CollisionDebugVisualizer::new();
    let mut fixed;
    let mut wall_clock;
    let clock: &mut dyn Clock = match config.fixed_delta {
        Some(delta) => {
            fixed = FixedTimestep::new(delta);
            &mut fixed
        }
        None => {
            wall_clock = Timer::new();
            &mut wall_clock
        }
    };

    demo.throw_balls()?;
    demo.run_frames(clock, FRAMES / 4, &mut overlay);

    demo.ball_rain()?;
    demo.pellet_spray();
    demo.run_frames(clock, FRAMES / 2, &mut overlay);

    if let Some(id) = demo.scheduler.replay_last(&mut demo.scene, demo.ball_template)? {
        if let Some(entity) = demo.scene.get_mut(id) {
            entity.collision_enabled = true;
        }
        log::info!("Replaying the last throw");
    }
    demo.run_frames(clock, FRAMES / 4, &mut overlay);

    log::info!(
        "{} animations alive, {} debug shapes in the last overlay",
        demo.scheduler.len(),
        overlay.debug_draw().shape_count()
    );
    let removed = demo.scheduler.clear(&mut demo.scene);
    log::info!("Cleared {} animations, {} entities left", removed, demo.scene.len());
    Ok(())
}
