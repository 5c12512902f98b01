use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn installer_cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("molly-installer").unwrap();
    cmd.env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .env("MOLLY_INSTALLER_CONFIG", home.path().join("no-config.toml"))
        .env("MOLLY_NO_PROGRESS", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    let home = TempDir::new().unwrap();
    installer_cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("uninstall"));
}

#[test]
fn test_verbose_and_quiet_conflict() {
    let home = TempDir::new().unwrap();
    installer_cmd(&home)
        .args(["--verbose", "--quiet", "uninstall"])
        .assert()
        .failure();
}

#[cfg(unix)]
#[test]
fn test_uninstall_command_removes_install_root() {
    let home = TempDir::new().unwrap();
    let root = home.path().join(".dag");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("mollywallet"), b"wallet").unwrap();
    std::fs::write(root.join("wallet.log"), b"log").unwrap();

    installer_cmd(&home)
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("successfully uninstalled"));

    assert!(!root.exists());
}

#[test]
fn test_invalid_config_file_is_reported() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, "fatal_pause_secs = \"ten\"").unwrap();

    installer_cmd(&home)
        .arg("--config")
        .arg(&config)
        .arg("uninstall")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration file"));
}
