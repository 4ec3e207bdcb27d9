use std::{path::PathBuf, process::Command};

fn forest() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/forest.toml")
}

fn wayfarer(args: &[&str]) -> String {
    let output = Command::new(env!("CARGO_BIN_EXE_wayfarer"))
        .args(args)
        .arg("--scenario")
        .arg(forest())
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch wayfarer");

    assert!(
        output.status.success(),
        "wayfarer failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("utf-8 output")
}

#[test]
fn seek_prints_the_path_and_cost() {
    let stdout = wayfarer(&["seek", "--start", "0,0"]);

    assert!(stdout.starts_with("path: 0,0 -> "), "{stdout}");
    assert!(stdout.contains("-> 5,4\n"), "{stdout}");
    assert!(stdout.contains("cost: 9\n"), "{stdout}");
}

#[test]
fn seek_beyond_the_radius_reports_no_path() {
    let stdout = wayfarer(&["seek", "--start", "0,0", "--radius", "3"]);

    assert_eq!(stdout, "no path found\n");
}

#[test]
fn avoid_reports_the_goal_distance() {
    let stdout = wayfarer(&["avoid", "--start", "0,0", "--goal", "predator", "--draw"]);

    assert!(stdout.contains("goal distance: "), "{stdout}");
    assert!(stdout.contains('S'), "{stdout}");
    assert!(stdout.contains('D'), "{stdout}");
}

#[test]
fn avoid_outside_the_map_has_no_refuge() {
    let stdout = wayfarer(&["avoid", "--start", "50,50", "--goal", "predator"]);

    assert_eq!(stdout, "no safe cell found\n");
}
