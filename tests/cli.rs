//! Exit status and argument validation of the `bwprobe` binary

use std::process::{Command, Output};

use tempfile::tempdir;

fn bwprobe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bwprobe"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
        .expect("failed to run bwprobe")
}

#[test]
fn test_out_of_range_sizes_exit_with_failure_and_no_io() {
    let temp_dir = tempdir().unwrap();

    for size in ["0", "-5", "10001"] {
        let target = temp_dir.path().join(format!("bwtest-{}", size));
        let output = bwprobe(&[target.to_str().unwrap(), size]);

        assert_eq!(output.status.code(), Some(1), "size {}", size);
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("File size must be between 1 and 10000 MB"),
            "stderr: {}",
            stderr
        );
        assert!(!target.exists(), "directory created for size {}", size);
    }
}

#[test]
fn test_non_numeric_size_is_rejected() {
    let temp_dir = tempdir().unwrap();
    let target = temp_dir.path().join("bwtest");

    let output = bwprobe(&[target.to_str().unwrap(), "lots"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!target.exists());
}

#[test]
fn test_help_exits_successfully() {
    let output = bwprobe(&["--help"]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("FILE_SIZE_MB"));
}

#[test]
fn test_small_run_prints_summary_and_removes_scratch_file() {
    let temp_dir = tempdir().unwrap();
    let target = temp_dir.path().join("bwtest");

    let output = bwprobe(&[target.to_str().unwrap(), "1", "--no-progress", "--seed", "7"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    for section in [
        "=== Sequential Write Test ===",
        "=== Sequential Read Test ===",
        "=== Random Read Test ===",
        "=== Random Write Test ===",
        "SUMMARY",
        "Sequential Write: ",
        "Random Write:     ",
    ] {
        assert!(stdout.contains(section), "missing {:?} in:\n{}", section, stdout);
    }
    assert!(stdout.contains("Number of random reads: 1000"));

    assert!(target.is_dir());
    assert!(!target.join("test.dat").exists());
}
