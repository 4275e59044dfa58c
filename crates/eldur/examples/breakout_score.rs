//! Headless Breakout scoring — a ball sweeps a row of bricks.
//!
//! Demonstrates plugins, resources, events between systems, stage ordering
//! and stopping the app from inside a system. Run with
//! `RUST_LOG=info cargo run --example breakout_score`.

use eldur::prelude::*;

#[derive(Debug, Clone)]
struct Ball {
    velocity: Vec2,
}

#[derive(Debug, Clone)]
struct Brick {
    points: u32,
}

/// Sent when the ball breaks a brick.
#[derive(Debug, Clone)]
struct BrickHit {
    points: u32,
}

#[derive(Debug, Default)]
struct Score(u32);

const BRICK_HALF_WIDTH: f32 = 20.0;

fn main() -> eldur::Result<()> {
    env_logger::init();

    let config = AppConfig::default()
        .with_title("breakout score")
        .with_fixed_delta(1.0 / 60.0)
        .with_frame_limit(600);

    App::with_config(config)
        .add_plugins((ScorePlugin, AnimationPlugin, DiagnosticsPlugin))
        .add_startup_system(setup)
        .add_system(Stage::PreUpdate, move_ball)
        .add_update_system(collide)
        .add_system(Stage::Last, check_cleared)
        .run()
}

// ── Score plugin ─────────────────────────────────────────────────────────

struct ScorePlugin;

impl Plugin for ScorePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(Score::default())
            .add_event::<BrickHit>()
            .add_system(Stage::PostUpdate, tally_score);
    }
}

fn tally_score(ctx: &mut Context) -> SystemResult {
    for hit in ctx.events.drain::<BrickHit>()? {
        let score = ctx.resource_mut::<Score>()?;
        score.0 += hit.points;
        log::info!("brick broken for {} points, score {}", hit.points, score.0);
    }
    Ok(())
}

// ── Game systems ─────────────────────────────────────────────────────────

fn setup(ctx: &mut Context) -> SystemResult {
    ctx.create()
        .insert(Transform::from_xy(-200.0, 0.0))
        .insert(Ball {
            velocity: Vec2::new(240.0, 0.0),
        });

    for i in 0..5 {
        ctx.spawn((
            Transform::from_xy(-100.0 + i as f32 * 60.0, 0.0),
            Brick { points: 10 * (i + 1) },
            Tint(Color::rgb(0.9, 0.3, 0.2)),
        ));
    }
    Ok(())
}

fn move_ball(ctx: &mut Context) -> SystemResult {
    let dt = ctx.delta();
    ctx.world.each::<(Ball, Transform)>(|world, entity, (ball, mut transform)| {
        transform.translation += ball.velocity.extend(0.0) * dt;
        world.insert_component(entity, transform);
    })
}

fn collide(ctx: &mut Context) -> SystemResult {
    let Some((_, (_, ball))) = ctx.world.single::<(Ball, Transform)>()? else {
        return Ok(());
    };
    for (brick_entity, (brick, transform)) in ctx.world.query::<(Brick, Transform)>()? {
        if (transform.translation.x - ball.translation.x).abs() < BRICK_HALF_WIDTH {
            ctx.despawn(brick_entity);
            ctx.events.send(BrickHit { points: brick.points })?;

            // Leave a fading ghost where the brick was.
            ctx.spawn((
                transform,
                Tint(Color::WHITE),
                PropertyTween::new(
                    TweenTarget::ColorA,
                    Tween::new(1.0, 0.0, 0.25, EaseFunction::QuadOut),
                ),
            ));
        }
    }
    Ok(())
}

fn check_cleared(ctx: &mut Context) -> SystemResult {
    if ctx.world.entities_with::<Brick>().is_empty() {
        let score = ctx.resource::<Score>()?.0;
        log::info!("all bricks cleared at frame {} with score {score}", ctx.frame());
        ctx.stop();
    }
    Ok(())
}
