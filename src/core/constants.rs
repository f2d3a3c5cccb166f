// Fixed parameters of the recorded sessions

/// Sampling frequency of waveform and classification series.
pub const SAMPLE_RATE_HZ: u32 = 125;

/// Number of samples shown by the playback window (10 s at 125 Hz).
pub const WINDOW_SIZE: usize = 1250;

// Endpoints of the record service
pub const SIGNAL_ENDPOINT: &str = "registro/info";
pub const CATALOG_ENDPOINT: &str = "listar_registros/info";

/// Tick period of the playback timer.
pub fn tick_period() -> std::time::Duration {
    std::time::Duration::from_micros(1_000_000 / SAMPLE_RATE_HZ as u64)
}
