use anyhow::Result;
use serde_json::json;
use voxptt::audio;
use voxptt::trigger::ThresholdState;
use voxptt::RunSummary;

fn parse_device_list(raw: &str) -> Vec<String> {
    raw.trim()
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

pub(crate) fn list_input_devices() -> Result<()> {
    // VOXPTT_TEST_DEVICES stands in for real hardware in tests.
    let devices = if let Ok(raw) = std::env::var("VOXPTT_TEST_DEVICES") {
        parse_device_list(&raw)
    } else {
        audio::Recorder::list_devices().unwrap_or_else(|err| {
            eprintln!("Failed to list audio input devices: {err}");
            Vec::new()
        })
    };

    if devices.is_empty() {
        println!("No audio input devices detected.");
    } else {
        println!("Available audio input devices:");
        for name in devices {
            println!("  - {name}");
        }
    }
    Ok(())
}

fn threshold_db(threshold: &ThresholdState) -> Option<f32> {
    match threshold {
        ThresholdState::Resolved { db } | ThresholdState::Manual { db } => Some(*db),
        ThresholdState::Uncalibrated | ThresholdState::Calibrating { .. } => None,
    }
}

/// Closing lines printed once monitoring ends.
pub(crate) fn format_summary(summary: &RunSummary, calibrate_only: bool) -> String {
    let mut lines = Vec::new();
    if calibrate_only {
        match (summary.noise_floor_db, threshold_db(&summary.threshold)) {
            (Some(floor), Some(threshold)) => {
                lines.push(format!("Noise floor: {floor:.2} dB"));
                lines.push(format!("Suggested threshold: {threshold:.2} dB"));
                lines.push(format!(
                    "Pass --initial-threshold-db {threshold:.1} to skip calibration next time."
                ));
            }
            _ => lines.push("Calibration did not complete.".to_string()),
        }
    }
    lines.push(format!(
        "Stopped ({}): {} frames, {} activations, {} rejected, {} dropped, {} actuator failures",
        summary.stop_reason.label(),
        summary.frames_processed,
        summary.activations,
        summary.frames_rejected,
        summary.frames_dropped,
        summary.actuator_failures
    ));
    lines.join("\n")
}

pub(crate) fn summary_json(summary: &RunSummary) -> String {
    json!({
        "event": "summary",
        "stop_reason": summary.stop_reason.label(),
        "frames_processed": summary.frames_processed,
        "frames_rejected": summary.frames_rejected,
        "frames_dropped": summary.frames_dropped,
        "activations": summary.activations,
        "actuator_failures": summary.actuator_failures,
        "noise_floor_db": summary.noise_floor_db,
        "threshold": summary.threshold,
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxptt::StopReason;

    fn summary(threshold: ThresholdState) -> RunSummary {
        RunSummary {
            stop_reason: StopReason::CalibrationComplete,
            frames_processed: 100,
            frames_rejected: 0,
            frames_dropped: 2,
            activations: 0,
            actuator_failures: 0,
            threshold,
            noise_floor_db: Some(-52.345),
        }
    }

    #[test]
    fn device_list_ignores_blanks() {
        assert_eq!(
            parse_device_list(" Mic A, ,Mic B "),
            vec!["Mic A".to_string(), "Mic B".to_string()]
        );
        assert!(parse_device_list("   ").is_empty());
    }

    #[test]
    fn calibrate_only_summary_suggests_threshold() {
        let text = format_summary(&summary(ThresholdState::Resolved { db: -42.345 }), true);
        assert!(text.contains("Noise floor: -52.35 dB"));
        assert!(text.contains("Suggested threshold: -42.35 dB"));
        assert!(text.contains("--initial-threshold-db -42.3"));
        assert!(text.contains("Stopped (calibration_complete): 100 frames"));
    }

    #[test]
    fn incomplete_calibration_is_called_out() {
        let text = format_summary(
            &summary(ThresholdState::Calibrating {
                collected: 10,
                required: 100,
            }),
            true,
        );
        assert!(text.starts_with("Calibration did not complete."));
    }

    #[test]
    fn summary_json_is_tagged() {
        let value: serde_json::Value =
            serde_json::from_str(&summary_json(&summary(ThresholdState::Manual { db: -20.0 })))
                .unwrap();
        assert_eq!(value["event"], "summary");
        assert_eq!(value["threshold"]["kind"], "manual");
        assert_eq!(value["frames_dropped"], 2);
    }
}
