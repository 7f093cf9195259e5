use crate::error::PttError;
use std::ops::RangeInclusive;

pub const THRESHOLD_OFFSET_RANGE_DB: RangeInclusive<i32> = 5..=20;
pub const RELEASE_DELAY_RANGE_MS: RangeInclusive<i64> = 0..=2000;
pub const MANUAL_THRESHOLD_RANGE_DB: RangeInclusive<i32> = -60..=0;

pub const DEFAULT_THRESHOLD_OFFSET_DB: i32 = 10;
pub const DEFAULT_RELEASE_DELAY_MS: i64 = 500;
pub const DEFAULT_MANUAL_THRESHOLD_DB: i32 = -30;

/// Session values supplied by the configuration source.
///
/// Passed into every evaluation so the core never reads live UI state. Use
/// [`TriggerSettings::sanitize`] before handing user input to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerSettings {
    /// Added to the noise floor to get the automatic threshold.
    pub threshold_offset_db: i32,
    /// Grace period after the level drops before the key is released.
    pub release_delay_ms: i64,
    /// Forced threshold; overrides calibration while set.
    pub manual_threshold_db: Option<i32>,
    /// Run the state machine but never touch the key.
    pub test_mode: bool,
}

impl Default for TriggerSettings {
    fn default() -> Self {
        Self {
            threshold_offset_db: DEFAULT_THRESHOLD_OFFSET_DB,
            release_delay_ms: DEFAULT_RELEASE_DELAY_MS,
            manual_threshold_db: None,
            test_mode: false,
        }
    }
}

impl TriggerSettings {
    /// Clamp every ranged value to its nearest bound, returning one
    /// `ConfigOutOfRange` warning per adjusted field.
    pub fn sanitize(mut self) -> (Self, Vec<PttError>) {
        let mut warnings = Vec::new();

        self.threshold_offset_db = clamp_field(
            "threshold_offset_db",
            self.threshold_offset_db.into(),
            widen(&THRESHOLD_OFFSET_RANGE_DB),
            &mut warnings,
        ) as i32;
        self.release_delay_ms = clamp_field(
            "release_delay_ms",
            self.release_delay_ms,
            RELEASE_DELAY_RANGE_MS,
            &mut warnings,
        );
        if let Some(manual) = self.manual_threshold_db {
            self.manual_threshold_db = Some(clamp_field(
                "manual_threshold_db",
                manual.into(),
                widen(&MANUAL_THRESHOLD_RANGE_DB),
                &mut warnings,
            ) as i32);
        }

        (self, warnings)
    }

    pub fn offset_db(&self) -> f32 {
        self.threshold_offset_db as f32
    }

    pub fn manual_db(&self) -> Option<f32> {
        self.manual_threshold_db.map(|db| db as f32)
    }

    pub fn release_delay(&self) -> u64 {
        self.release_delay_ms.max(0) as u64
    }
}

fn widen(range: &RangeInclusive<i32>) -> RangeInclusive<i64> {
    i64::from(*range.start())..=i64::from(*range.end())
}

fn clamp_field(
    field: &'static str,
    value: i64,
    range: RangeInclusive<i64>,
    warnings: &mut Vec<PttError>,
) -> i64 {
    let clamped = value.clamp(*range.start(), *range.end());
    if clamped != value {
        warnings.push(PttError::ConfigOutOfRange {
            field,
            value,
            clamped,
        });
    }
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_range() {
        let (settings, warnings) = TriggerSettings::default().sanitize();
        assert!(warnings.is_empty());
        assert_eq!(settings, TriggerSettings::default());
    }

    #[test]
    fn clamps_each_field_to_nearest_bound() {
        let raw = TriggerSettings {
            threshold_offset_db: 42,
            release_delay_ms: -10,
            manual_threshold_db: Some(-90),
            test_mode: true,
        };
        let (settings, warnings) = raw.sanitize();
        assert_eq!(settings.threshold_offset_db, 20);
        assert_eq!(settings.release_delay_ms, 0);
        assert_eq!(settings.manual_threshold_db, Some(-60));
        assert!(settings.test_mode);
        assert_eq!(
            warnings,
            vec![
                PttError::ConfigOutOfRange {
                    field: "threshold_offset_db",
                    value: 42,
                    clamped: 20,
                },
                PttError::ConfigOutOfRange {
                    field: "release_delay_ms",
                    value: -10,
                    clamped: 0,
                },
                PttError::ConfigOutOfRange {
                    field: "manual_threshold_db",
                    value: -90,
                    clamped: -60,
                },
            ]
        );
    }

    #[test]
    fn bounds_themselves_are_accepted() {
        let raw = TriggerSettings {
            threshold_offset_db: 5,
            release_delay_ms: 2000,
            manual_threshold_db: Some(0),
            test_mode: false,
        };
        let (_, warnings) = raw.sanitize();
        assert!(warnings.is_empty());
    }

    #[test]
    fn accessors_convert_units() {
        let settings = TriggerSettings {
            manual_threshold_db: Some(-25),
            ..TriggerSettings::default()
        };
        assert_eq!(settings.offset_db(), 10.0);
        assert_eq!(settings.manual_db(), Some(-25.0));
        assert_eq!(settings.release_delay(), 500);
    }
}
