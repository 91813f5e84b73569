use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary command isolated from the developer's environment: no `.env`, no user config,
/// an empty config file and a scratch working directory.
fn cli() -> (Command, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "{}\n").unwrap();

    let mut cmd = Command::cargo_bin("yt-infographic").unwrap();
    for var in [
        "APP_ORIGIN",
        "TRANSCRIPT_API_URL",
        "TRANSCRIPT_TIMEOUT_MS",
        "VERCEL",
        "VERCEL_URL",
        "GEMINI_API_KEY",
        "GOOGLE_API_KEY",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path())
        .arg("--no-env-file")
        .arg("--config")
        .arg(&config);
    (cmd, dir)
}

#[test]
fn styles_lists_every_style() {
    let (mut cmd, _dir) = cli();
    cmd.arg("styles")
        .assert()
        .success()
        .stdout(predicate::str::contains("modern"))
        .stdout(predicate::str::contains("corporate"))
        .stdout(predicate::str::contains("colorful"));
}

#[test]
fn invalid_url_fails_before_any_request() {
    let (mut cmd, _dir) = cli();
    cmd.args(["transcript", "not a url"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid YouTube URL format"));
}

#[test]
fn endpoints_default_to_local_service() {
    let (mut cmd, _dir) = cli();
    cmd.arg("endpoints")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. http://localhost:8001/transcript"))
        .stdout(predicate::str::contains("2.").not());
}

#[test]
fn env_file_is_skipped_when_asked() {
    let (mut cmd, dir) = cli();
    std::fs::write(
        dir.path().join(".env"),
        "TRANSCRIPT_API_URL=https://from-env-file.example.com\n",
    )
    .unwrap();

    cmd.arg("endpoints")
        .assert()
        .success()
        .stdout(predicate::str::contains("from-env-file").not());
}

#[test]
fn endpoints_follow_hosted_deployment() {
    let (mut cmd, _dir) = cli();
    cmd.arg("endpoints")
        .env("VERCEL", "1")
        .env("VERCEL_URL", "my-app.vercel.app")
        .env("TRANSCRIPT_API_URL", "https://api.example.com/")
        .assert()
        .success()
        .stdout(predicate::str::contains("1. https://api.example.com/transcript"))
        .stdout(predicate::str::contains("2. https://my-app.vercel.app/api/transcript"))
        .stdout(predicate::str::contains("3. http://localhost:8001/transcript"));
}

#[test]
fn invalid_origin_from_environment_is_rejected_at_load() {
    let (mut cmd, _dir) = cli();
    cmd.arg("endpoints")
        .env("APP_ORIGIN", "not an origin")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid deployment.origin"));
}

#[test]
fn image_requires_a_prompt() {
    let (mut cmd, _dir) = cli();
    cmd.args(["image", "--style", "dark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--prompt"));
}

#[test]
fn image_without_api_key_reports_configuration_error() {
    let (mut cmd, dir) = cli();
    let out = dir.path().join("out");
    cmd.args(["image", "--prompt", "a crab explaining ownership", "-q", "-d"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY environment variable is not set"));
    assert!(!out.exists());
}
