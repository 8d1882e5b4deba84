use assert_cmd::prelude::*;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn write_die_asset() -> NamedTempFile {
    let xml = r#"<die>
  <name>Dice</name>
  <size>0.02 0.02 0.02</size>
  <color>210 40 40</color>
</die>
"#;
    let mut tmp = NamedTempFile::new().expect("temp asset");
    tmp.write_all(xml.as_bytes()).expect("write asset");
    tmp
}

#[test]
fn cli_places_rolls_and_clears_dice() {
    let asset = write_die_asset();
    let mut cmd = Command::cargo_bin("ardice").expect("binary exists");
    cmd.arg(asset.path())
        .arg("--seed")
        .arg("7")
        .arg("--taps")
        .arg("320,180;1200,700");
    cmd.assert()
        .success()
        .stdout(contains("Session running (WorldTracking)"))
        .stdout(contains("Detected 2 plane(s)"))
        .stdout(contains("Tap (320, 180) placed a die"))
        .stdout(contains("Tap (1200, 700) missed the detected planes"))
        .stdout(contains("Placed dice: 1"))
        .stdout(contains(" - Dice pos=(0.000, 0.010, -0.500)"))
        .stdout(contains("Placed dice: 0"));
}

#[test]
fn cli_keep_flag_skips_the_clear() {
    let asset = write_die_asset();
    let mut cmd = Command::cargo_bin("ardice").expect("binary exists");
    cmd.arg(asset.path())
        .arg("--seed")
        .arg("7")
        .arg("--taps")
        .arg("320,180")
        .arg("--keep");
    cmd.assert()
        .success()
        .stdout(contains("Placed dice: 1"))
        .stdout(contains("Placed dice: 0").not());
}

#[test]
fn cli_fails_fast_on_a_missing_die_asset() {
    let mut cmd = Command::cargo_bin("ardice").expect("binary exists");
    cmd.arg("no-such-die.xml");
    cmd.assert()
        .failure()
        .stderr(contains("die template"));
}

#[test]
fn cli_rejects_malformed_tap_lists() {
    let asset = write_die_asset();
    let mut cmd = Command::cargo_bin("ardice").expect("binary exists");
    cmd.arg(asset.path()).arg("--taps").arg("nonsense");
    cmd.assert().failure().stderr(contains("invalid tap"));
}
