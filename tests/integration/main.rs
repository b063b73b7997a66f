//! Integration tests for Packwright

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Command isolated from the user's global and local config
    fn packwright(config: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("packwright");
        cmd.arg("--no-local")
            .arg("--config")
            .arg(config)
            .env_remove("PACKWRIGHT_STATIC_ROOT")
            .env_remove("PACKWRIGHT_STATIC_URL")
            .env_remove("PACKWRIGHT_BUILD_SERVER")
            .env_remove("PACKWRIGHT_MANIFEST")
            .env_remove("PACKWRIGHT_CACHE_DIR");
        cmd
    }

    /// Project with one config file and a matching packwright config
    fn project() -> (TempDir, std::path::PathBuf) {
        let temp = TempDir::new().unwrap();
        let configs = temp.path().join("configs");
        std::fs::create_dir_all(configs.join("basic")).unwrap();
        std::fs::write(configs.join("basic/webpack.config.js"), "module.exports = {};").unwrap();

        let config_path = temp.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "[environment]\nstatic_root = {:?}\nstatic_url = \"/static/\"\nconfig_dirs = [{:?}]\n\n[build_server]\nurl = \"http://127.0.0.1:1\"\nconnect_timeout_secs = 1\n",
                temp.path().join("static").display().to_string(),
                configs.display().to_string(),
            ),
        )
        .unwrap();

        (temp, config_path)
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("packwright")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("frontend bundle build coordinator"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("packwright")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("packwright"));
    }

    #[test]
    fn config_path() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("static_url = \"/static/\""));
    }

    #[test]
    fn config_set_then_show() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["config", "set", "watch.aggregate_timeout_ms", "450"])
            .assert()
            .success();

        packwright(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("aggregate_timeout_ms = 450"));
    }

    #[test]
    fn config_set_unknown_key() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn key_without_context() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["key", "basic/webpack.config.js"])
            .assert()
            .success()
            .stdout("basic/webpack.config.js\n");
    }

    #[test]
    fn key_with_context() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["key", "basic/webpack.config.js", "-x", "foo=bar"])
            .assert()
            .success()
            .stdout(predicate::str::is_match(r"^basic/webpack\.config\.js__[0-9a-f]{32}\n$").unwrap());
    }

    #[test]
    fn key_missing_config() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["key", "missing/webpack.config.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Config file not found"));
    }

    #[test]
    fn build_without_static_root() {
        let temp = TempDir::new().unwrap();
        packwright(&temp.path().join("absent.toml"))
            .args(["build", "basic/webpack.config.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Improperly configured"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn build_with_unreachable_server() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["build", "basic/webpack.config.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Bundling failed"));
    }

    #[test]
    fn build_from_manifest() {
        let (temp, config) = project();
        let manifest = temp.path().join("manifest.json");
        std::fs::write(
            &manifest,
            r#"{"basic/webpack.config.js": {"errors": [], "warnings": [], "hash": "abc123"}}"#,
        )
        .unwrap();

        packwright(&config)
            .args(["config", "set", "manifest.path"])
            .arg(manifest.display().to_string())
            .assert()
            .success();

        packwright(&config)
            .args(["build", "basic/webpack.config.js", "--use-manifest", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"hash\": \"abc123\""));
    }

    #[test]
    fn build_from_manifest_flag() {
        let (temp, config) = project();
        let manifest = temp.path().join("manifest.json");
        std::fs::write(
            &manifest,
            r#"{"basic/webpack.config.js": {"errors": [], "warnings": [], "hash": "fromflag"}}"#,
        )
        .unwrap();

        packwright(&config)
            .arg("--manifest")
            .arg(&manifest)
            .args(["build", "basic/webpack.config.js", "--use-manifest", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"hash\": \"fromflag\""));
    }

    #[test]
    fn key_with_config_dir_flag() {
        let (temp, config) = project();
        let other = temp.path().join("other");
        std::fs::create_dir_all(other.join("app")).unwrap();
        std::fs::write(other.join("app/webpack.config.js"), "module.exports = {};").unwrap();

        packwright(&config)
            .arg("--config-dir")
            .arg(&other)
            .args(["key", "app/webpack.config.js"])
            .assert()
            .success()
            .stdout("app/webpack.config.js\n");
    }

    #[test]
    fn manifest_miss_fails() {
        let (temp, config) = project();
        let manifest = temp.path().join("manifest.json");
        std::fs::write(&manifest, "{}").unwrap();

        packwright(&config)
            .args(["config", "set", "manifest.path"])
            .arg(manifest.display().to_string())
            .assert()
            .success();

        packwright(&config)
            .args(["build", "basic/webpack.config.js", "--use-manifest"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing from manifest"));
    }

    #[test]
    fn manifest_show_lists_keys() {
        let (temp, config) = project();
        let manifest = temp.path().join("manifest.json");
        std::fs::write(&manifest, r#"{"a.js": {}, "b.js__00ff": {}}"#).unwrap();

        packwright(&config)
            .args(["manifest", "show", "--path"])
            .arg(&manifest)
            .assert()
            .success()
            .stdout("a.js\nb.js__00ff\n");
    }

    #[test]
    fn manifest_show_without_path() {
        let (_temp, config) = project();
        packwright(&config)
            .args(["manifest", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("manifest.path"));
    }

    #[test]
    fn completions_generate() {
        cargo_bin_cmd!("packwright")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("packwright"));
    }
}
