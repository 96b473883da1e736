use keylight_test_utils::TempSysfs;
use predicates::prelude::*;
use test_case::test_case;

fn keylight_command<I, S>(args: I) -> Result<assert_cmd::Command, Box<dyn std::error::Error>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = assert_cmd::Command::cargo_bin("keylight")?;
    cmd.env_remove("RUST_LOG").args(args);
    Ok(cmd)
}

/// Runs keylight against a fake keyboard, ignoring any system config.
fn keylight_on(
    sysfs: &TempSysfs,
    config_dir: &tempfile::TempDir,
    args: &[&str],
) -> Result<assert_cmd::Command, Box<dyn std::error::Error>> {
    let config_dir = config_dir.path().to_str().unwrap();
    let mut all_args = vec!["--config-dir", config_dir, "--device", sysfs.utf8_path().as_str()];
    all_args.extend_from_slice(args);
    keylight_command(all_args)
}

#[test]
fn run_help() -> Result<(), Box<dyn std::error::Error>> {
    keylight_command(["--help"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn run_version() -> Result<(), Box<dyn std::error::Error>> {
    let version_string = format!("keylight {}", env!("CARGO_PKG_VERSION"));

    keylight_command(["-V"])?
        .assert()
        .success()
        .stdout(predicate::str::starts_with(version_string));
    Ok(())
}

#[test]
fn read_brightness_percentage() -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::rgb_keyboard(255);
    sysfs.file("brightness").with_raw_content("128\n");
    let config_dir = tempfile::tempdir()?;

    keylight_on(&sysfs, &config_dir, &["brightness"])?
        .assert()
        .success()
        .stdout("50\n");
    Ok(())
}

#[test]
fn list_zones_sorted() -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::rgb_keyboard(255);
    let config_dir = tempfile::tempdir()?;

    keylight_on(&sysfs, &config_dir, &["zones"])?
        .assert()
        .success()
        .stdout("center\nleft\nright\n");
    Ok(())
}

#[test]
fn read_zone_colors() -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::rgb_keyboard(255);
    sysfs.file("color_left").with_raw_content("FF0000\n");
    let config_dir = tempfile::tempdir()?;

    keylight_on(&sysfs, &config_dir, &["color"])?
        .assert()
        .success()
        .stdout("center: FFFFFF\nleft: FF0000\nright: FFFFFF\n");
    Ok(())
}

#[test]
fn describe_the_keyboard() -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::rgb_keyboard(255);
    let config_dir = tempfile::tempdir()?;

    keylight_on(&sysfs, &config_dir, &["info"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("kind: rgb"))
        .stdout(predicate::str::contains("max brightness: 255"))
        .stdout(predicate::str::contains("brightness: 127 (50%)"))
        .stdout(predicate::str::contains("zones: 3"));
    Ok(())
}

#[test_case(&["brightness"]; "brightness")]
#[test_case(&["zones"]; "zones")]
#[test_case(&["info"]; "info")]
fn missing_device_is_reported(args: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::new();
    let missing = sysfs.utf8_path().join("no_such_keyboard");
    let config_dir = tempfile::tempdir()?;
    let config_dir = config_dir.path().to_str().unwrap();

    let mut all_args = vec!["--config-dir", config_dir, "--device", missing.as_str()];
    all_args.extend_from_slice(args);
    keylight_command(all_args)?
        .assert()
        .failure()
        .stderr(predicate::str::contains("no_such_keyboard"));
    Ok(())
}

#[test]
fn device_path_from_the_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::rgb_keyboard(100);
    let config_dir = tempfile::tempdir()?;
    std::fs::write(
        config_dir.path().join("keylight.toml"),
        format!("[device]\npath = \"{}\"\n", sysfs.utf8_path()),
    )?;

    keylight_command(["--config-dir", config_dir.path().to_str().unwrap(), "brightness"])?
        .assert()
        .success()
        .stdout("50\n");
    Ok(())
}

#[test]
fn unknown_zone_is_rejected_before_any_write() -> Result<(), Box<dyn std::error::Error>> {
    let sysfs = TempSysfs::rgb_keyboard(255);
    let config_dir = tempfile::tempdir()?;

    keylight_on(&sysfs, &config_dir, &["color", "000000", "--zone", "top"])?
        .assert()
        .failure()
        .stderr(predicate::str::contains("No zone named 'top'"));
    assert_eq!(sysfs.read("color_left"), "FFFFFF\n");
    Ok(())
}
