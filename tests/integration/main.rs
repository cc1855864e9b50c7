//! Integration tests for cradle

mod cli_tests {
    use assert_cmd::Command;
    use predicates::prelude::*;
    use tempfile::TempDir;

    fn cradle() -> Command {
        Command::cargo_bin("cradle").unwrap()
    }

    #[test]
    fn help_displays() {
        cradle()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("ephemeral sandboxed process"));
    }

    #[test]
    fn version_displays() {
        cradle()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("cradle"));
    }

    #[test]
    fn run_help_shows_overrides() {
        cradle()
            .args(["run", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--cache-dir"))
            .stdout(predicate::str::contains("--runtime"));
    }

    #[test]
    fn config_path_points_at_toml() {
        cradle()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_prints_defaults() {
        cradle()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("[process]"));
    }

    #[test]
    fn cache_dir_respects_config_file() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let cache = dir.path().join("cache");
        std::fs::write(
            &config,
            format!("[runtime]\ncache_dir = \"{}\"\n", cache.display()),
        )
        .unwrap();

        cradle()
            .args(["--config"])
            .arg(&config)
            .args(["cache", "dir"])
            .assert()
            .success()
            .stdout(predicate::str::contains(cache.display().to_string()));
    }

    #[test]
    fn cache_clear_succeeds_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[runtime]\ncache_dir = \"{}\"\n",
                dir.path().join("cache").display()
            ),
        )
        .unwrap();

        cradle()
            .args(["--config"])
            .arg(&config)
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cache cleared"));
    }

    #[test]
    fn config_verbose_enables_info_logging() {
        let dir = TempDir::new().unwrap();
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(cache.join("bundle")).unwrap();
        std::fs::write(cache.join("rootfs.sha256"), b"digest").unwrap();

        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[general]\nverbose = true\n\n[runtime]\ncache_dir = \"{}\"\n",
                cache.display()
            ),
        )
        .unwrap();

        // info-level "Removed ..." lines only appear when [general].verbose
        // raises the filter above the warn default
        cradle()
            .args(["--config"])
            .arg(&config)
            .args(["cache", "clear"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Removed"));
    }

    #[test]
    fn run_fails_loudly_without_assets() {
        let dir = TempDir::new().unwrap();

        cradle()
            .args(["run", "--cache-dir"])
            .arg(dir.path().join("cache"))
            .arg("--assets")
            .arg(dir.path().join("assets"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("asset"));
    }

    #[test]
    fn run_rejects_missing_external_runtime() {
        let dir = TempDir::new().unwrap();

        cradle()
            .args(["run", "--cache-dir"])
            .arg(dir.path().join("cache"))
            .arg("--assets")
            .arg(dir.path().join("assets"))
            .arg("--runtime")
            .arg(dir.path().join("no-such-runc"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Runtime binary not found"));
    }

    #[test]
    fn status_reports_without_panicking() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[runtime]\ncache_dir = \"{cache}\"\nassets_dir = \"{assets}\"\n",
                cache = dir.path().join("cache").display(),
                assets = dir.path().join("assets").display(),
            ),
        )
        .unwrap();

        cradle()
            .args(["--config"])
            .arg(&config)
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("Cradle System Status"));
    }
}
