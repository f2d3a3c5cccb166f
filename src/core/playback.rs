// Fixed-rate sliding window playback over a loaded series

use serde::Serialize;
use std::sync::{Arc, Mutex, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tracing::{debug, error};

use crate::core::constants::{tick_period, SAMPLE_RATE_HZ, WINDOW_SIZE};
use crate::core::format::{SamplePoint, Series};
use crate::core::lock;

/// Formats seconds as `HH:MM:SS:mmm`. Negative and non-finite input shows as zero.
pub fn format_time(seconds: f64) -> String {
    let t = if seconds.is_finite() && seconds > 0.0 { seconds } else { 0.0 };
    let hours = (t / 3600.0).floor() as u64;
    let minutes = ((t / 60.0) % 60.0).floor() as u64;
    let secs = (t % 60.0).floor() as u64;
    let millis = ((t % 1.0) * 1000.0).floor() as u64;
    format!("{:02}:{:02}:{:02}:{:03}", hours, minutes, secs, millis)
}

/// What a live display needs after each tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackFrame {
    pub index: usize,
    pub is_playing: bool,
    pub window: Vec<SamplePoint>,
    pub elapsed: f64,
    pub remaining: f64,
    pub total_duration: f64,
    pub elapsed_label: String,
    pub remaining_label: String,
}

/// Index and play flag over a source series. Times are derived, never stored.
#[derive(Debug, Clone, Default)]
pub struct PlaybackState {
    source: Arc<Series>,
    index: usize,
    is_playing: bool,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_source(&mut self, source: Arc<Series>) {
        self.source = source;
        self.index = 0;
        self.is_playing = false;
    }

    /// Advances one sample. Not bounded by the source length.
    pub fn tick(&mut self) {
        self.index = self.index.saturating_add(1);
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.is_playing = playing;
    }

    pub fn source(&self) -> &Arc<Series> {
        &self.source
    }

    /// `source[index..index + WINDOW_SIZE]`, shortened at the end of the data.
    pub fn window(&self) -> &[SamplePoint] {
        self.source.window(self.index, WINDOW_SIZE)
    }

    pub fn elapsed(&self) -> f64 {
        (self.index as f64 + WINDOW_SIZE as f64) / SAMPLE_RATE_HZ as f64
    }

    pub fn total_duration(&self) -> f64 {
        self.source.duration()
    }

    pub fn remaining(&self) -> f64 {
        self.total_duration() - self.elapsed()
    }

    pub fn frame(&self) -> PlaybackFrame {
        let elapsed = self.elapsed();
        let remaining = self.remaining();
        PlaybackFrame {
            index: self.index,
            is_playing: self.is_playing,
            window: self.window().to_vec(),
            elapsed,
            remaining,
            total_duration: self.total_duration(),
            elapsed_label: format_time(elapsed),
            remaining_label: format_time(remaining),
        }
    }
}

struct Inner {
    state: PlaybackState,
    // bumped whenever a timer is cancelled; ticks carrying an older value are dropped
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl Inner {
    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer.take() {
            handle.abort();
            self.generation += 1;
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    frames: watch::Sender<PlaybackFrame>,
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.frames.send_replace(inner.state.frame());
    }

    /// Returns false once the calling timer is stale.
    fn tick(&self, generation: u64) -> bool {
        let mut inner = lock(&self.inner);
        if inner.generation != generation || !inner.state.is_playing() {
            return false;
        }
        inner.state.tick();
        self.publish(&inner);
        true
    }
}

async fn run_timer(shared: Weak<Shared>, generation: u64, start: Instant) {
    let period = tick_period();
    let mut ticker = interval_at(start + period, period);
    loop {
        ticker.tick().await;
        let Some(shared) = shared.upgrade() else {
            break;
        };
        if !shared.tick(generation) {
            break;
        }
    }
}

/// Plays a series back at the sample rate, one sample per tick.
///
/// At most one timer runs at a time. `play`, `pause` and `load_source`
/// all go through the same lock, and a tick from a cancelled timer never
/// applies. Timers are spawned on the current Tokio runtime.
pub struct PlaybackEngine {
    shared: Arc<Shared>,
}

impl PlaybackEngine {
    pub fn new() -> Self {
        let (frames, _) = watch::channel(PlaybackState::new().frame());
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: PlaybackState::new(),
                    generation: 0,
                    timer: None,
                }),
                frames,
            }),
        }
    }

    /// Stops playback and starts over at index 0 on `source`.
    pub fn load_source(&self, source: Arc<Series>) {
        let mut inner = lock(&self.shared.inner);
        inner.cancel_timer();
        inner.generation += 1;
        debug!("Playback source loaded ({} samples)", source.len());
        inner.state.load_source(source);
        self.shared.publish(&inner);
    }

    /// Starts the tick timer. No-op while already playing.
    pub fn play(&self) {
        let mut inner = lock(&self.shared.inner);
        if inner.timer.is_some() {
            return;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(e) => {
                error!("Cannot start playback timer: {}", e);
                return;
            }
        };

        let generation = inner.generation;
        let shared = Arc::downgrade(&self.shared);
        inner.timer = Some(runtime.spawn(run_timer(shared, generation, Instant::now())));
        inner.state.set_playing(true);
        debug!("Playback started at index {}", inner.state.index());
        self.shared.publish(&inner);
    }

    /// Stops the tick timer and keeps the index. Safe to call repeatedly.
    pub fn pause(&self) {
        let mut inner = lock(&self.shared.inner);
        if inner.timer.is_none() && !inner.state.is_playing() {
            return;
        }
        inner.cancel_timer();
        inner.state.set_playing(false);
        debug!("Playback paused at index {}", inner.state.index());
        self.shared.publish(&inner);
    }

    pub fn toggle(&self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.shared.inner).state.is_playing()
    }

    pub fn index(&self) -> usize {
        lock(&self.shared.inner).state.index()
    }

    /// Runs `f` on the current window without copying it.
    pub fn with_window<R>(&self, f: impl FnOnce(&[SamplePoint]) -> R) -> R {
        let inner = lock(&self.shared.inner);
        f(inner.state.window())
    }

    pub fn snapshot(&self) -> PlaybackFrame {
        lock(&self.shared.inner).state.frame()
    }

    /// Receiver updated after every tick and transition.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackFrame> {
        self.shared.frames.subscribe()
    }
}

impl Default for PlaybackEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        lock(&self.shared.inner).cancel_timer();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::format::SignalType;
    use std::time::Duration;

    fn series(len: usize) -> Arc<Series> {
        let samples: Vec<f64> = (0..len).map(|i| i as f64).collect();
        Arc::new(Series::from_samples(&samples, SignalType::Ecg))
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(3725.125), "01:02:05:125");
        assert_eq!(format_time(0.0), "00:00:00:000");
        assert_eq!(format_time(10.5), "00:00:10:500");
        assert_eq!(format_time(-3.0), "00:00:00:000");
    }

    #[test]
    fn test_window_and_times_at_each_tick() {
        let mut state = PlaybackState::new();
        state.load_source(series(2000));

        assert_eq!(state.window().len(), WINDOW_SIZE);
        assert_eq!(state.elapsed(), 10.0);
        assert_eq!(state.total_duration(), 16.0);
        assert_eq!(state.remaining(), 6.0);

        for _ in 0..5 {
            state.tick();
        }
        assert_eq!(state.window()[0].value, 5.0);
        assert_eq!(state.window().len(), WINDOW_SIZE);
        assert_eq!(state.elapsed(), 1255.0 / 125.0);
        assert_eq!(state.remaining(), 16.0 - 1255.0 / 125.0);
    }

    #[test]
    fn test_window_shortens_past_the_end() {
        let mut state = PlaybackState::new();
        state.load_source(series(1300));

        for _ in 0..100 {
            state.tick();
        }
        assert_eq!(state.window().len(), 1200);
        assert_eq!(state.window().last().unwrap().value, 1299.0);

        for _ in 0..2000 {
            state.tick();
        }
        assert_eq!(state.index(), 2100);
        assert!(state.window().is_empty());
        assert!(state.remaining() < 0.0);
    }

    #[test]
    fn test_empty_source() {
        let state = PlaybackState::new();
        assert!(state.window().is_empty());
        assert_eq!(state.total_duration(), 0.0);
        let frame = state.frame();
        assert_eq!(frame.remaining_label, "00:00:00:000");
        assert!(!frame.is_playing);
    }

    #[test]
    fn test_load_source_resets() {
        let mut state = PlaybackState::new();
        state.load_source(series(10));
        state.set_playing(true);
        state.tick();
        state.load_source(series(20));
        assert_eq!(state.index(), 0);
        assert!(!state.is_playing());
        assert_eq!(state.source().len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_at_sample_rate() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(5000));
        engine.play();
        assert!(engine.is_playing());

        tokio::time::sleep(Duration::from_millis(84)).await;
        assert_eq!(engine.index(), 10);
        engine.with_window(|w| assert_eq!(w[0].value, 10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_keeps_index() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(5000));
        engine.play();
        tokio::time::sleep(Duration::from_millis(44)).await;
        engine.pause();
        let stopped_at = engine.index();
        assert!(stopped_at > 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(engine.index(), stopped_at);
        assert!(!engine.is_playing());

        // resume continues from the same index
        engine.play();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(engine.index() > stopped_at);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_is_idempotent() {
        let engine = PlaybackEngine::new();
        engine.pause();
        engine.load_source(series(3000));
        engine.play();
        tokio::time::sleep(Duration::from_millis(30)).await;

        engine.pause();
        let once = engine.snapshot();
        engine.pause();
        assert_eq!(engine.snapshot(), once);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_play_keeps_one_timer() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(5000));
        engine.play();
        engine.play();
        tokio::time::sleep(Duration::from_millis(84)).await;
        assert_eq!(engine.index(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_source_stops_old_timer() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(5000));
        engine.play();
        tokio::time::sleep(Duration::from_millis(40)).await;

        engine.load_source(series(3000));
        assert_eq!(engine.index(), 0);
        assert!(!engine.is_playing());

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(engine.index(), 0);
        assert_eq!(engine.snapshot().total_duration, 24.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_toggle() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(2000));
        engine.toggle();
        assert!(engine.is_playing());
        engine.toggle();
        assert!(!engine.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_ticks() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(2000));
        let mut rx = engine.subscribe();
        engine.play();

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_playing);

        rx.changed().await.unwrap();
        let frame = rx.borrow_and_update().clone();
        assert_eq!(frame.index, 1);
        assert_eq!(frame.window.len(), WINDOW_SIZE);
        assert_eq!(frame.elapsed_label, format_time(1251.0 / 125.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_while_playing() {
        let engine = PlaybackEngine::new();
        engine.load_source(series(2000));
        engine.play();
        drop(engine);
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
