// Plays a synthetic session back from an in-memory source

use std::sync::Arc;
use std::time::Duration;

use ecg_viewer::{MemorySource, PredictionCounts, Selection, Session, SignalType};
use tracing::{info, Level};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    // 30 s of a crude 1.2 Hz beat at 125 Hz
    let ecg: Vec<f64> = (0..3750)
        .map(|i| {
            let phase = (i as f64 / 125.0 * 1.2).fract();
            if phase < 0.04 { 1.0 } else { 0.0 }
        })
        .collect();

    let mut counts = PredictionCounts::new();
    counts.insert("N".to_string(), 34);
    counts.insert("V".to_string(), 2);
    counts.insert("Q".to_string(), 1);

    let source = Arc::new(
        MemorySource::new()
            .with_records(Vec::new())
            .with_samples("demo", SignalType::Ecg, ecg)
            .with_predictions("demo-pred", counts),
    );
    let session = Session::new(source);

    let report = session
        .consult(&Selection {
            ecg_id: "demo".to_string(),
            bpm_id: String::new(),
            pred_id: "demo-pred".to_string(),
        })
        .await;
    info!("Consult report: {:?}", report);

    for bucket in session.prediction_buckets().await {
        info!("  {} = {} ({})", bucket.label, bucket.count, bucket.color);
    }

    let mut frames = session.playback().subscribe();
    session.playback().play();

    let deadline = tokio::time::sleep(Duration::from_secs(2));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = frames.changed() => {
                if changed.is_err() {
                    break;
                }
                let frame = frames.borrow_and_update();
                if frame.index % 125 == 0 {
                    info!(
                        "index {:>5}  elapsed {}  remaining {}",
                        frame.index, frame.elapsed_label, frame.remaining_label
                    );
                }
            }
        }
    }

    session.playback().pause();
    info!("Paused at index {}", session.playback().index());
}
