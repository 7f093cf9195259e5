use std::process::Command;

fn combined_output(output: &std::process::Output) -> String {
    let mut combined = String::new();
    combined.push_str(&String::from_utf8_lossy(&output.stdout));
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    combined
}

fn voxptt_bin() -> &'static str {
    option_env!("CARGO_BIN_EXE_voxptt").expect("voxptt test binary not built")
}

#[test]
fn voxptt_help_mentions_name() {
    let output = Command::new(voxptt_bin())
        .arg("--help")
        .output()
        .expect("run voxptt --help");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("VoxPTT"));
    assert!(combined.contains("--release-delay-ms"));
}

#[test]
fn voxptt_lists_devices_from_env() {
    let output = Command::new(voxptt_bin())
        .arg("--list-input-devices")
        .env("VOXPTT_TEST_DEVICES", "Desk Mic, Headset")
        .output()
        .expect("run voxptt --list-input-devices");
    assert!(output.status.success());
    let combined = combined_output(&output);
    assert!(combined.contains("Available audio input devices:"));
    assert!(combined.contains("  - Desk Mic"));
    assert!(combined.contains("  - Headset"));
}

#[test]
fn voxptt_reports_empty_device_list() {
    let output = Command::new(voxptt_bin())
        .arg("--list-input-devices")
        .env("VOXPTT_TEST_DEVICES", "")
        .output()
        .expect("run voxptt --list-input-devices");
    assert!(output.status.success());
    assert!(combined_output(&output).contains("No audio input devices detected."));
}

#[test]
fn voxptt_rejects_structural_values() {
    let output = Command::new(voxptt_bin())
        .args(["--frame-size", "8"])
        .env("VOXPTT_NO_LOGS", "true")
        .output()
        .expect("run voxptt --frame-size 8");
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("--frame-size must be between 64 and 16384"));
}
