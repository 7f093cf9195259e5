/// Level reported for digital silence: `20 * log10(1e-10)`.
pub const LEVEL_FLOOR_DB: f32 = -200.0;

const RMS_EPSILON: f64 = 1e-10;
const FULL_SCALE: f64 = 32_768.0;

/// RMS loudness of a 16-bit frame in dBFS, clamped to [`LEVEL_FLOOR_DB`, 0].
pub fn level_db(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return LEVEL_FLOOR_DB;
    }
    let energy = samples
        .iter()
        .map(|&s| {
            let normalized = f64::from(s).abs() / FULL_SCALE;
            normalized * normalized
        })
        .sum::<f64>()
        / samples.len() as f64;
    let rms = energy.sqrt().max(RMS_EPSILON);
    let db = 20.0 * rms.log10();
    (db as f32).clamp(LEVEL_FLOOR_DB, 0.0)
}
