use std::time::Duration;

use lodview::{Pipeline, PipelineConfig, Range, Series};

#[tokio::main]
async fn main() -> lodview::Result<()> {
    env_logger::init();

    let temperature = Series::from_values(
        "temperature",
        (0..5_000_000).map(|i| {
            let t = i as f64 * 1e-5;
            t.sin() * 20.0 + (t * 113.0).sin() * 2.0
        }),
    );
    let pressure = Series::from_values(
        "pressure",
        (0..2_000_000).map(|i| ((i / 1000) % 17) as f64),
    );

    let (mut pipeline, mut fine) = Pipeline::builder()
        .config(PipelineConfig {
            debug_overlay: true,
            ..PipelineConfig::default()
        })
        .screen(1280.0, 480.0)
        .series(temperature)
        .series(pressure)
        .build()?;

    let coarse = pipeline.render_coarse()?;
    println!(
        "coarse: {} points (theoretical {})",
        coarse.point_count,
        pipeline.theoretical_points()
    );

    pipeline.set_view(Range::new(400.0, 1200.0))?;
    for _ in 0..10 {
        pipeline.pan_pixels(-12.0)?;
        pipeline.zoom_at_pixel(1.1, 640.0)?;
        tokio::time::sleep(Duration::from_millis(16)).await;
    }
    pipeline.move_end()?;

    if let Some(result) = fine.recv().await {
        println!(
            "fine #{}: window [{:.2}, {:.2}], {} points, {:.4} world units per pixel",
            result.sequence,
            result.window.min,
            result.window.max,
            pipeline.metrics().points(),
            pipeline.world_per_pixel()
        );
        if let Some(debug) = result.debug {
            for entry in debug.entries {
                println!(
                    "  series {}: step {} level bucket {} resample bucket {}",
                    entry.series,
                    entry.step.index(),
                    entry.level_bucket,
                    entry.resample_bucket
                );
            }
        }
    }
    Ok(())
}
