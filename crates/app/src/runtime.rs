use crate::config::AppConfig;
use crate::desktop::UnavailableDesktop;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use vigil_audio::{rms_level, CpalMicStream, MicCoordinator, MicStream, SampleConverter};
use vigil_wake::{EngineStatus, KeywordEngine, WakeWordListener};
use vigil_watch::{
    ChangeSource, CompletionDetector, FileSystemChangeSource, FinishedEvent, VisualChangeSource,
    WindowResolver, WindowSelector,
};

/// Watch a directory tree and report each completed idle cycle until Ctrl-C.
pub async fn watch_path(config: &AppConfig, root: PathBuf) -> anyhow::Result<()> {
    let mut source = FileSystemChangeSource::new("fs", root.clone())
        .with_stability_window(config.stability_window());
    if let Some(globs) = &config.watch.ignore_globs {
        source = source.with_ignore_globs(globs.clone());
    }

    println!("watching {} (Ctrl-C to stop)", root.display());
    run_detector(config, Box::new(source)).await
}

/// Watch one application window for visual activity until Ctrl-C.
pub async fn watch_window(
    config: &AppConfig,
    app: String,
    selector: WindowSelector,
) -> anyhow::Result<()> {
    let resolver = resolver(config);
    let source = VisualChangeSource::new("visual", resolver, app.clone(), selector)
        .with_poll_interval(config.poll_interval());

    println!("watching window of {app} (Ctrl-C to stop)");
    run_detector(config, Box::new(source)).await
}

async fn run_detector(config: &AppConfig, source: Box<dyn ChangeSource>) -> anyhow::Result<()> {
    let mut detector = CompletionDetector::new(source.source_id().to_string(), config.completion());
    let (finished_tx, finished_rx) = tokio::sync::mpsc::unbounded_channel();
    detector.start(source, finished_tx)?;

    let outcome = report_until_interrupted(finished_rx).await;
    detector.stop();

    let snapshot = detector.metrics().snapshot();
    tracing::info!(
        events = snapshot.events_seen,
        finished = snapshot.finished_emitted,
        "watch session ended"
    );
    outcome
}

async fn report_until_interrupted(
    mut finished_rx: UnboundedReceiver<FinishedEvent>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
            event = finished_rx.recv() => {
                match event {
                    Some(event) => print_finished(&event),
                    None => return Ok(()),
                }
            }
        }
    }
}

fn print_finished(event: &FinishedEvent) {
    println!(
        "finished: {} change(s), quiet for {:.1}s",
        event.changed_metadata.len(),
        event.idle_duration_ms as f64 / 1000.0
    );
    for metadata in &event.changed_metadata {
        println!("  {metadata}");
    }
}

/// Enumerate the windows of a running application.
pub fn list_windows(config: &AppConfig, app: &str) -> anyhow::Result<()> {
    let resolver = resolver(config);
    let concrete = resolver.resolve_application(app)?;
    let windows = resolver.list_windows(&concrete)?;
    if windows.is_empty() {
        println!("{concrete}: no windows");
        return Ok(());
    }
    println!("{concrete}:");
    for window in windows {
        println!(
            "  {}. {:?} ({}x{} at {},{})",
            window.index,
            window.title,
            window.bounds.width,
            window.bounds.height,
            window.bounds.x,
            window.bounds.y
        );
    }
    Ok(())
}

fn resolver(config: &AppConfig) -> Arc<WindowResolver> {
    Arc::new(
        WindowResolver::new(Arc::new(UnavailableDesktop))
            .with_aliases(config.visual.aliases.clone()),
    )
}

/// Keyword-spotting engines are external; the standalone binary carries
/// none and reports the capability as unavailable. Embedding hosts hand a
/// real engine to [`WakeWordListener`] directly.
struct NoKeywordEngine;

impl KeywordEngine for NoKeywordEngine {
    fn process(&mut self, _frame: &[i16]) -> Result<Option<usize>, String> {
        Err("no keyword engine".into())
    }
    fn frame_length_samples(&self) -> usize {
        512
    }
    fn sample_rate_hz(&self) -> u32 {
        16_000
    }
    fn status(&self) -> EngineStatus {
        EngineStatus::unavailable("no keyword engine is built into this binary")
    }
}

/// Listen for keyword hits until Ctrl-C.
pub async fn listen(device: Option<String>) -> anyhow::Result<()> {
    let mut listener = WakeWordListener::new(MicCoordinator::new());
    let (hit_tx, mut hit_rx) = tokio::sync::mpsc::unbounded_channel();
    let spec = listener.start(
        Box::new(NoKeywordEngine),
        Box::new(CpalMicStream::new(device)),
        hit_tx,
    )?;
    println!(
        "listening at {} Hz (Ctrl-C to stop)",
        spec.sample_rate_hz
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            hit = hit_rx.recv() => {
                match hit {
                    Some(hit) => println!("keyword detected (index {})", hit.match_index),
                    None => break,
                }
            }
        }
    }
    listener.stop();
    Ok(())
}

/// Meter the microphone for a fixed duration, printing a level bar.
pub async fn mic_check(device: Option<String>, duration: Duration) -> anyhow::Result<()> {
    // f32 peak level smuggled through an AtomicU32 as raw bits.
    let peak_bits = Arc::new(AtomicU32::new(0));
    let handler_peak = peak_bits.clone();
    let mut converter = SampleConverter::new();

    let mut stream = CpalMicStream::new(device);
    let spec = stream.start(Box::new(move |bytes| {
        let samples = converter.convert(bytes);
        let level = rms_level(&samples);
        let current = f32::from_bits(handler_peak.load(Ordering::Relaxed));
        if level > current {
            handler_peak.store(level.to_bits(), Ordering::Relaxed);
        }
    }))?;
    println!(
        "capturing {} Hz, {} channel(s) for {:.0}s",
        spec.sample_rate_hz,
        spec.channels,
        duration.as_secs_f64()
    );

    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    ticker.tick().await;
    let deadline = tokio::time::Instant::now() + duration;
    while tokio::time::Instant::now() < deadline {
        ticker.tick().await;
        let peak = f32::from_bits(peak_bits.swap(0, Ordering::Relaxed));
        let filled = ((peak * 40.0).round() as usize).min(40);
        println!("[{:<40}] {:.2}", "#".repeat(filled), peak);
    }
    stream.stop();
    Ok(())
}
