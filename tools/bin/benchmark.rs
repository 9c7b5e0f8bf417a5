//! Fit throughput benchmark: 1080p frames into a 320x240 slot, first on one
//! thread, then spread across worker threads sharing one `FrameFitter`.

use std::thread;
use std::time::{Duration, Instant};

use fast_image_resize::Resizer;
use slotfit::{Frame, FrameFitter, PixelLayout};

fn main() -> anyhow::Result<()> {
    println!("Frame Fit Benchmark");
    println!("═══════════════════");

    let (width, height) = (1920u32, 1080u32);
    let (slot_w, slot_h) = (320, 240);
    let frames = 120;
    let workers = thread::available_parallelism().map(|n| n.get()).unwrap_or(4);

    println!(
        "Fitting {}x{} → {}x{}, {} frames, {} workers",
        width, height, slot_w, slot_h, frames, workers
    );
    println!();

    let frame = gradient_frame(width, height)?;
    let fitter = FrameFitter::default();

    let single = time_single(&fitter, &frame, slot_w, slot_h, frames)?;
    let parallel = time_parallel(&fitter, &frame, slot_w, slot_h, frames, workers)?;

    println!("Results:");
    println!("───────────");
    println!(
        "Single thread: {:.2} ms per frame ({:.2} s total)",
        single.as_secs_f64() * 1000.0 / frames as f64,
        single.as_secs_f64()
    );
    println!(
        "{} workers:    {:.2} ms per frame ({:.2} s total)",
        workers,
        parallel.as_secs_f64() * 1000.0 / frames as f64,
        parallel.as_secs_f64()
    );
    println!(
        "Speedup: {:.1}x",
        single.as_secs_f64() / parallel.as_secs_f64()
    );
    Ok(())
}

fn gradient_frame(width: u32, height: u32) -> anyhow::Result<Frame> {
    let mut data = Vec::with_capacity(width as usize * height as usize * 4);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[
                (x * 255 / width) as u8,
                (y * 255 / height) as u8,
                128,
                255,
            ]);
        }
    }
    Ok(Frame::new(width, height, PixelLayout::Rgba8, data)?)
}

fn time_single(
    fitter: &FrameFitter,
    frame: &Frame,
    w: i32,
    h: i32,
    frames: usize,
) -> anyhow::Result<Duration> {
    let mut resizer = Resizer::new();
    let start = Instant::now();
    for _ in 0..frames {
        fitter.fit_with(&mut resizer, frame, w, h)?;
    }
    Ok(start.elapsed())
}

fn time_parallel(
    fitter: &FrameFitter,
    frame: &Frame,
    w: i32,
    h: i32,
    frames: usize,
    workers: usize,
) -> anyhow::Result<Duration> {
    let per_worker = frames.div_ceil(workers);
    let start = Instant::now();
    thread::scope(|scope| -> anyhow::Result<()> {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || -> slotfit::FitResult<()> {
                    let mut resizer = Resizer::new();
                    for _ in 0..per_worker {
                        fitter.fit_with(&mut resizer, frame, w, h)?;
                    }
                    Ok(())
                })
            })
            .collect();
        for handle in handles {
            handle
                .join()
                .map_err(|_| anyhow::anyhow!("benchmark worker panicked"))??;
        }
        Ok(())
    })?;
    Ok(start.elapsed())
}
