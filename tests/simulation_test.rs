use std::process::{Command, Output};

fn run_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_braess_sim"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
        .expect("Failed to execute simulation")
}

/// Test that the simulation runs headless and drains
#[test]
fn test_headless_simulation_runs() {
    let output = run_sim(&["--ticks", "500", "--seed", "3"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(
        output.status.success(),
        "Simulation failed to run. stderr: {stderr}"
    );
    assert!(
        stderr.contains("SIMULATION COMPLETE"),
        "Simulation did not complete properly. stderr: {stderr}"
    );
    assert!(stderr.contains("Model stopped"), "Network did not drain. stderr: {stderr}");
}

/// Test that the dashboard is logged and printed
#[test]
fn test_simulation_statistics_reported() {
    let output = run_sim(&["--ticks", "800", "--seed", "4"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    for line in [
        "Total cars departed:",
        "Total cars completed:",
        "route Ab:",
        "route ab:",
        "bridge closed",
    ] {
        assert!(stderr.contains(line), "Missing {line:?} in stderr: {stderr}");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("=== Braess Network Summary ==="));
    assert!(stdout.contains("sn-bridge"));
}

/// Test that the launch limit stops departures
#[test]
fn test_max_cars_limits_departures() {
    let output = run_sim(&["--ticks", "5000", "--seed", "9", "--max-cars", "12"]);
    assert!(output.status.success(), "Simulation failed to run");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Reached 12 departures"), "stderr: {stderr}");
    assert!(stderr.contains("Total cars departed: 12"), "stderr: {stderr}");
    assert!(stderr.contains("Total cars completed: 12"), "stderr: {stderr}");
}

/// Test that routing options are parsed and bad ones rejected
#[test]
fn test_routing_options() {
    let output = run_sim(&[
        "--ticks",
        "300",
        "--seed",
        "2",
        "--routing",
        "random",
        "--timing",
        "periodic",
        "--speed-mode",
        "historical",
        "--selection",
        "probabilistic",
    ]);
    assert!(output.status.success(), "Simulation failed with valid options");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("random / historical / probabilistic"), "stdout: {stdout}");

    let output = run_sim(&["--routing", "sideways"]);
    assert!(!output.status.success());
}

/// Out-of-range tunables are clamped with a warning instead of failing
#[test]
fn test_out_of_range_values_are_clamped() {
    let output = run_sim(&["--ticks", "200", "--seed", "1", "--congestion", "2.5"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("clamped to 1"), "stderr: {stderr}");
}
