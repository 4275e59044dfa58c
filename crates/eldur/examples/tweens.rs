//! Tweens and keyframe clips without a window.
//!
//! Samples a few easing curves, then plays a JSON clip on an entity through
//! the animation plugin and logs its transform each frame. Run with
//! `RUST_LOG=info cargo run --example tweens`.

use std::sync::Arc;

use eldur::prelude::*;

const PULSE: &str = r#"{
    "name": "pulse",
    "repeat": "ping_pong",
    "tracks": {
        "scale": [
            { "time": 0.0, "value": 1.0 },
            { "time": 0.5, "value": 1.5, "ease": "back_out" }
        ],
        "translation": [
            { "time": 0.0, "value": [0.0, 0.0] },
            { "time": 0.5, "value": [32.0, 8.0], "ease": "sine_in_out" }
        ]
    }
}"#;

fn main() -> eldur::Result<()> {
    env_logger::init();

    for ease in [
        EaseFunction::Linear,
        EaseFunction::CubicInOut,
        EaseFunction::ElasticOut,
        EaseFunction::BounceOut,
    ] {
        let tween = Tween::new(0.0, 100.0, 1.0, ease);
        let samples: Vec<String> = (0..=4)
            .map(|i| format!("{:.1}", tween.sample_at(i as f32 * 0.25)))
            .collect();
        log::info!("{ease:?}: {}", samples.join(" "));
    }

    let clip = Arc::new(AnimationClip::from_json(PULSE)?);
    log::info!("loaded clip `{}` ({}s)", clip.name, clip.duration());

    let config = AppConfig::default()
        .with_title("tweens")
        .with_fixed_delta(0.1)
        .with_frame_limit(12);

    let mut app = App::with_config(config);
    app.add_plugins(AnimationPlugin)
        .add_startup_system(move |ctx| {
            ctx.spawn((Transform::default(), AnimationPlayer::new(clip.clone())));
            Ok(())
        })
        .add_system(Stage::Last, report);
    app.run()
}

fn report(ctx: &mut Context) -> SystemResult {
    for (entity, (transform,)) in ctx.world.query::<(Transform,)>()? {
        log::info!(
            "frame {:>2} {entity:?}: translation ({:.1}, {:.1}) scale {:.2}",
            ctx.frame(),
            transform.translation.x,
            transform.translation.y,
            transform.scale.x
        );
    }
    Ok(())
}
