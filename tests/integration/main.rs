//! Integration tests for dotpulse

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::{Path, PathBuf};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};
    use tempfile::TempDir;

    /// Isolated config, cache and repository for one test
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self::with_config("")
        }

        fn with_config(extra: &str) -> Self {
            Self::build(false, extra)
        }

        fn with_background_refresh() -> Self {
            Self::build(true, "")
        }

        fn build(background_refresh: bool, extra: &str) -> Self {
            let temp = TempDir::new().unwrap();
            std::fs::create_dir_all(temp.path().join("repo")).unwrap();
            let config = format!(
                "[general]\nbackground_refresh = {background_refresh}\n{extra}\n\
                 [packages]\nbackends = []\n\n\
                 [init]\nmanaged_tree = {tree:?}\nstamp_file = {stamp:?}\n",
                background_refresh = background_refresh,
                extra = extra,
                tree = temp.path().join("dotfiles"),
                stamp = temp.path().join("last-init"),
            );
            std::fs::write(temp.path().join("config.toml"), config).unwrap();
            Self { temp }
        }

        fn path(&self) -> &Path {
            self.temp.path()
        }

        fn cache_dir(&self) -> PathBuf {
            self.path().join("cache")
        }

        fn dotpulse(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("dotpulse");
            cmd.env("DOTPULSE_CONFIG", self.path().join("config.toml"))
                .env("DOTPULSE_CACHE_DIR", self.cache_dir())
                .env("DOTPULSE_REPO", self.path().join("repo"))
                .env_remove("DOTPULSE_LOG");
            cmd
        }

        fn seed(&self, file: &str, document: serde_json::Value) {
            std::fs::create_dir_all(self.cache_dir()).unwrap();
            std::fs::write(self.cache_dir().join(file), document.to_string()).unwrap();
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    /// Wait for a detached refresh to land its file
    fn wait_for(path: &Path) -> bool {
        for _ in 0..100 {
            if path.exists() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
        false
    }

    fn json_stdout(cmd: &mut Command) -> serde_json::Value {
        let output = cmd.assert().success().get_output().stdout.clone();
        serde_json::from_slice(&output).unwrap()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("dotpulse")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached shell status"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("dotpulse")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("dotpulse"));
    }

    #[test]
    fn quiet_with_empty_cache_prints_nothing() {
        let sandbox = Sandbox::new();
        sandbox
            .dotpulse()
            .arg("--quiet")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn quiet_reports_cached_updates() {
        let sandbox = Sandbox::new();
        sandbox.seed(
            "packages.json",
            serde_json::json!({
                "last_check": now(),
                "managers": {
                    "brew": {"has_updates": "UPDATES_AVAILABLE", "count": 5},
                    "pipx": {"has_updates": "CANNOT_DETERMINE"}
                },
                "total_updates": 5
            }),
        );

        let output = sandbox
            .dotpulse()
            .arg("-q")
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let stdout = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = stdout.lines().collect();

        assert_eq!(lines.len(), 1, "{}", stdout);
        assert!(lines[0].contains('5'));
    }

    #[test]
    fn interactive_lists_indeterminate_backend() {
        let sandbox = Sandbox::new();
        sandbox.seed(
            "packages.json",
            serde_json::json!({
                "last_check": now(),
                "managers": {
                    "brew": {"has_updates": "UPDATES_AVAILABLE", "count": 3},
                    "pipx": {"has_updates": "CANNOT_DETERMINE", "reason": "no read-only query"}
                },
                "total_updates": 3
            }),
        );

        sandbox
            .dotpulse()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("3 updates available"))
            .stdout(predicate::str::contains("unable to determine"));
    }

    #[test]
    fn json_marks_unchecked_domains_stale() {
        let sandbox = Sandbox::new();
        let json = json_stdout(sandbox.dotpulse().arg("--json"));

        for domain in ["packages", "git", "init"] {
            assert_eq!(json[domain]["last_check"], 0, "{}", domain);
            assert_eq!(json[domain]["stale"], true, "{}", domain);
        }
    }

    #[test]
    fn corrupt_cache_reads_as_never_checked() {
        let sandbox = Sandbox::new();
        std::fs::create_dir_all(sandbox.cache_dir()).unwrap();
        std::fs::write(sandbox.cache_dir().join("packages.json"), "{\"last_chec").unwrap();

        let json = json_stdout(sandbox.dotpulse().arg("--json"));
        assert_eq!(json["packages"]["last_check"], 0);
        assert_eq!(json["packages"]["total_updates"], 0);
    }

    #[test]
    fn refresh_flag_recomputes_before_reporting() {
        let sandbox = Sandbox::new();
        let json = json_stdout(sandbox.dotpulse().args(["--refresh", "--json"]));

        assert_eq!(json["packages"]["state"], "fresh");
        assert_eq!(json["packages"]["total_updates"], 0);
        assert_eq!(json["init"]["state"], "fresh");
        assert_eq!(json["init"]["needs_update"], true);
    }

    #[test]
    fn refresh_writes_cache_files() {
        let sandbox = Sandbox::new();
        sandbox
            .dotpulse()
            .args(["refresh", "packages", "init"])
            .assert()
            .success();

        assert!(sandbox.cache_dir().join("packages.json").exists());
        assert!(sandbox.cache_dir().join("init.json").exists());
    }

    #[test]
    fn refresh_rejects_unknown_domain() {
        Sandbox::new()
            .dotpulse()
            .args(["refresh", "network"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown domain"));
    }

    #[test]
    fn uncreatable_cache_dir_is_fatal() {
        let sandbox = Sandbox::new();
        let blocker = sandbox.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        sandbox
            .dotpulse()
            .env("DOTPULSE_CACHE_DIR", blocker.join("cache"))
            .arg("--quiet")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn disabled_prints_nothing() {
        let sandbox = Sandbox::with_config("enabled = false");
        sandbox
            .dotpulse()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn cache_path_and_clear() {
        let sandbox = Sandbox::new();
        sandbox.seed("init.json", serde_json::json!({"last_check": 1}));

        sandbox
            .dotpulse()
            .args(["cache", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                sandbox.cache_dir().to_string_lossy().into_owned(),
            ));

        sandbox
            .dotpulse()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();
        assert!(!sandbox.cache_dir().join("init.json").exists());
    }

    #[test]
    fn cache_show_unchecked_domain() {
        Sandbox::new()
            .dotpulse()
            .args(["cache", "show", "packages"])
            .assert()
            .success()
            .stdout(predicate::str::contains("never checked"));
    }

    #[test]
    fn backends_json_lists_registry() {
        let sandbox = Sandbox::new();
        let json = json_stdout(sandbox.dotpulse().args(["backends", "--format", "json"]));
        let rows = json.as_array().unwrap();

        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|r| r["enabled"] == false));
        assert!(rows.iter().any(|r| r["name"] == "pipx" && r["check"].is_null()));
    }

    #[test]
    fn upgrade_with_no_backends_does_nothing() {
        Sandbox::new()
            .dotpulse()
            .args(["upgrade", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No installed package managers"));
    }

    #[test]
    fn completions_bash() {
        cargo_bin_cmd!("dotpulse")
            .args(["completions", "bash"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dotpulse"));
    }

    #[test]
    fn config_path_and_show() {
        let sandbox = Sandbox::new();
        sandbox
            .dotpulse()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));

        sandbox
            .dotpulse()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"));
    }

    #[test]
    fn config_set_persists() {
        let sandbox = Sandbox::new();
        sandbox
            .dotpulse()
            .args(["config", "set", "git.ttl_secs", "600"])
            .assert()
            .success();

        let written = std::fs::read_to_string(sandbox.path().join("config.toml")).unwrap();
        assert!(written.contains("ttl_secs = 600"));
        assert!(written.contains("background_refresh = false"));
    }

    #[test]
    fn config_set_rejects_unknown_key() {
        Sandbox::new()
            .dotpulse()
            .args(["config", "set", "vm.name", "x"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn stale_status_refreshes_in_background() {
        let sandbox = Sandbox::with_background_refresh();
        sandbox
            .dotpulse()
            .arg("--quiet")
            .assert()
            .success()
            .stdout(predicate::str::is_empty());

        assert!(wait_for(&sandbox.cache_dir().join("init.json")));
        assert!(wait_for(&sandbox.cache_dir().join("packages.json")));

        let json = json_stdout(sandbox.dotpulse().arg("--json"));
        assert_eq!(json["init"]["state"], "fresh");
        assert_eq!(json["packages"]["state"], "fresh");
    }

    #[test]
    fn background_refresh_accepts_forwarded_flags() {
        let sandbox = Sandbox::new();
        cargo_bin_cmd!("dotpulse")
            .env_remove("DOTPULSE_CONFIG")
            .env_remove("DOTPULSE_CACHE_DIR")
            .env_remove("DOTPULSE_REPO")
            .arg("--config")
            .arg(sandbox.path().join("config.toml"))
            .arg("--cache-dir")
            .arg(sandbox.cache_dir())
            .arg("--repo")
            .arg(sandbox.path().join("repo"))
            .args(["refresh", "init", "--background"])
            .assert()
            .success();

        assert!(sandbox.cache_dir().join("init.json").exists());
        assert!(sandbox.cache_dir().join("refresh.log").exists());
    }

    #[test]
    fn background_refresh_survives_unwritable_log() {
        let sandbox = Sandbox::new();
        std::fs::create_dir_all(sandbox.cache_dir().join("refresh.log")).unwrap();

        sandbox
            .dotpulse()
            .args(["refresh", "init", "--background"])
            .assert()
            .success();

        assert!(sandbox.cache_dir().join("init.json").exists());
    }

    #[test]
    fn status_flags_conflict_with_other_subcommands() {
        Sandbox::new()
            .dotpulse()
            .args(["--quiet", "refresh"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("only apply to the status command"));
    }
}
