//! Integration tests for the `berth` binary.
//!
//! Every run gets its own HOME, ledger and route table so tests never touch
//! the developer's real `~/.berth`.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SHOP: &str = r#"
name: shop
services:
  web:
    image: nginx:1.27
    ports: ["80"]
    depends_on: [db]
  db:
    image: postgres:16
    ports: [5432]
"#;

struct Sandbox {
    root: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn project(&self, name: &str, manifest: &str) -> PathBuf {
        let dir = self.path().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("berth.yaml"), manifest).unwrap();
        dir
    }

    fn ledger(&self) -> PathBuf {
        self.path().join("ports.json")
    }

    fn berth(&self) -> Command {
        let mut cmd = Command::cargo_bin("berth").unwrap();
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env("BERTH_LEDGER__PATH", self.ledger())
            .env("BERTH_PUBLISH__ROUTES_PATH", self.path().join("routes.json"))
            .env("BERTH_PORTS__PROBE_HOST", "false")
            .env_remove("RUST_LOG")
            .env_remove("NO_COLOR");
        cmd
    }
}

// ── help / version ────────────────────────────────────────────────────────────

#[test]
fn help_lists_subcommands() {
    Sandbox::new()
        .berth()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("ports"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn version_flag() {
    Sandbox::new()
        .berth()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_flag_exits_with_usage_error() {
    Sandbox::new()
        .berth()
        .args(["generate", "--bogus"])
        .assert()
        .code(2);
}

// ── generate ──────────────────────────────────────────────────────────────────

#[test]
fn generate_writes_compose_and_prints_ports() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);

    sandbox
        .berth()
        .arg("generate")
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::contains("10000 -> 5432"))
        .stdout(predicate::str::contains("10001 -> 80"));

    let compose = fs::read_to_string(project.join("docker-compose.yml")).unwrap();
    assert!(compose.starts_with("# GENERATED BY berth"));
    assert!(compose.contains("10000:5432"));
    assert!(compose.contains("10001:80"));

    let access = fs::read_to_string(project.join("ACCESS.md")).unwrap();
    assert!(access.contains("http://localhost:10001"));

    let routes = fs::read_to_string(sandbox.path().join("routes.json")).unwrap();
    assert!(routes.contains("web.shop.localhost"));
}

#[test]
fn generate_twice_is_byte_identical() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);

    sandbox.berth().arg("gen").arg(&project).assert().success();
    let first = fs::read(project.join("docker-compose.yml")).unwrap();

    sandbox.berth().arg("gen").arg(&project).assert().success();
    let second = fs::read(project.join("docker-compose.yml")).unwrap();

    assert_eq!(first, second);
}

#[test]
fn two_projects_never_share_a_host_port() {
    let sandbox = Sandbox::new();
    let shop = sandbox.project("shop", SHOP);
    let blog = sandbox.project(
        "blog",
        "services:\n  web:\n    image: nginx:1.27\n    ports: [\"80\"]\n",
    );

    sandbox.berth().arg("generate").arg(&shop).assert().success();
    sandbox
        .berth()
        .arg("generate")
        .arg(&blog)
        .assert()
        .success()
        .stdout(predicate::str::contains("10002 -> 80"));

    let compose = fs::read_to_string(blog.join("docker-compose.yml")).unwrap();
    assert!(compose.contains("container_name: blog-web"));
}

#[test]
fn generate_honours_env_base_port_and_output() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);

    sandbox
        .berth()
        .env("BERTH_PORTS__BASE", "20000")
        .args(["generate", "--no-publish", "--output", "compose/dev.yml"])
        .arg(&project)
        .assert()
        .success();

    let compose = fs::read_to_string(project.join("compose/dev.yml")).unwrap();
    assert!(compose.contains("20000:5432"));
    assert!(!project.join("ACCESS.md").exists());
    assert!(!sandbox.path().join("routes.json").exists());
}

#[test]
fn ledger_flag_overrides_configured_ledger() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    let other = sandbox.path().join("team/ports.json");

    sandbox
        .berth()
        .arg("--ledger")
        .arg(&other)
        .args(["generate", "--no-publish"])
        .arg(&project)
        .assert()
        .success();

    assert!(other.exists());
    assert!(!sandbox.ledger().exists());
}

#[test]
fn generate_json_output() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);

    let out = sandbox
        .berth()
        .args(["--output-format", "json", "generate"])
        .arg(&project)
        .output()
        .unwrap();
    assert!(out.status.success());

    let json: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(json["project"], "shop");
    assert_eq!(json["ports"][0]["service"], "db");
    assert_eq!(json["ports"][0]["host_port"], 10000);
    assert_eq!(json["published"], true);
}

#[test]
fn quiet_generate_prints_nothing() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);

    sandbox
        .berth()
        .args(["-q", "generate"])
        .arg(&project)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn missing_manifest_is_not_found() {
    let sandbox = Sandbox::new();
    let empty = sandbox.path().join("empty");
    fs::create_dir_all(&empty).unwrap();

    sandbox
        .berth()
        .arg("generate")
        .arg(&empty)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No manifest found"));
}

#[test]
fn invalid_manifest_is_user_error() {
    let sandbox = Sandbox::new();
    let project = sandbox.project(
        "shop",
        "services:\n  web:\n    image: nginx\n    depends_on: [cache]\n",
    );

    sandbox
        .berth()
        .arg("generate")
        .arg(&project)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Suggestions:"));
    assert!(!project.join("docker-compose.yml").exists());
}

#[test]
fn corrupted_ledger_is_fatal_and_left_alone() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    fs::write(sandbox.ledger(), "{ not json").unwrap();

    sandbox
        .berth()
        .arg("generate")
        .arg(&project)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("corrupted"));

    assert_eq!(fs::read_to_string(sandbox.ledger()).unwrap(), "{ not json");
}

// ── ports ─────────────────────────────────────────────────────────────────────

#[test]
fn ports_list_after_generate() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    sandbox.berth().arg("generate").arg(&project).assert().success();

    sandbox
        .berth()
        .args(["ports", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("PROJECT"))
        .stdout(predicate::str::contains("shop"));

    sandbox
        .berth()
        .args(["ports", "list", "--project", "shop", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"host_port\": 10000"))
        .stdout(predicate::str::contains("\"host_port\": 10001"));
}

#[test]
fn ports_list_empty_ledger() {
    Sandbox::new()
        .berth()
        .args(["ports", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn release_with_yes_frees_ports() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    sandbox.berth().arg("generate").arg(&project).assert().success();

    sandbox
        .berth()
        .args(["ports", "release", "SHOP", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Released 2 port(s)"));

    sandbox
        .berth()
        .args(["ports", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn release_withdraws_published_hostnames() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    let blog = sandbox.project(
        "blog",
        "services:\n  web:\n    image: nginx:1.27\n    ports: [\"80\"]\n",
    );
    let routes = sandbox.path().join("routes.json");
    sandbox.berth().arg("generate").arg(&project).assert().success();
    sandbox.berth().arg("generate").arg(&blog).assert().success();
    assert!(fs::read_to_string(&routes).unwrap().contains("web.shop.localhost"));

    sandbox
        .berth()
        .args(["ports", "release", "shop", "--yes"])
        .assert()
        .success();

    let table = fs::read_to_string(&routes).unwrap();
    assert!(!table.contains("shop.localhost"));
    assert!(table.contains("web.blog.localhost"));
}

#[test]
fn release_declined_keeps_ports() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    sandbox.berth().arg("generate").arg(&project).assert().success();

    sandbox
        .berth()
        .args(["ports", "release", "shop"])
        .write_stdin("n\n")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Operation cancelled"));

    sandbox
        .berth()
        .args(["ports", "list", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("10000"));
}

#[test]
fn release_confirmed_on_stdin() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);
    sandbox.berth().arg("generate").arg(&project).assert().success();

    sandbox
        .berth()
        .args(["ports", "release", "shop"])
        .write_stdin("yes\n")
        .assert()
        .success();
}

// ── config / init / completions ──────────────────────────────────────────────

#[test]
fn config_get_reads_env_override() {
    let sandbox = Sandbox::new();

    sandbox
        .berth()
        .args(["config", "get", "ports.base"])
        .assert()
        .success()
        .stdout(predicate::str::diff("10000\n"));

    sandbox
        .berth()
        .env("BERTH_PORTS__BASE", "20000")
        .args(["config", "get", "ports.base"])
        .assert()
        .success()
        .stdout(predicate::str::diff("20000\n"));
}

#[test]
fn config_file_is_layered_under_env() {
    let sandbox = Sandbox::new();
    let file = sandbox.path().join("berth.toml");
    fs::write(&file, "[compose]\nversion = \"3.9\"\n").unwrap();

    sandbox
        .berth()
        .arg("--config")
        .arg(&file)
        .args(["config", "get", "compose.version"])
        .assert()
        .success()
        .stdout(predicate::str::diff("3.9\n"));
}

#[test]
fn unknown_config_key_exits_4() {
    Sandbox::new()
        .berth()
        .args(["config", "get", "ports.nope"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Unknown config key"));
}

#[test]
fn missing_explicit_config_file_exits_4() {
    let sandbox = Sandbox::new();
    sandbox
        .berth()
        .arg("--config")
        .arg(sandbox.path().join("absent.toml"))
        .args(["config", "list"])
        .assert()
        .code(4);
}

#[test]
fn zero_scan_width_is_a_configuration_error() {
    let sandbox = Sandbox::new();
    let project = sandbox.project("shop", SHOP);

    sandbox
        .berth()
        .env("BERTH_PORTS__MAX_SCAN", "0")
        .arg("generate")
        .arg(&project)
        .assert()
        .code(4)
        .stderr(predicate::str::contains("ports.max_scan"));
    assert!(!project.join("docker-compose.yml").exists());
}

#[test]
fn init_writes_default_config_once() {
    let sandbox = Sandbox::new();
    let target = sandbox.path().join("conf/berth.toml");

    sandbox
        .berth()
        .args(["init", "--path"])
        .arg(&target)
        .assert()
        .success();
    let written = fs::read_to_string(&target).unwrap();
    assert!(written.contains("[ports]"));
    assert!(written.contains("base = 10000"));

    fs::write(&target, "# mine\n").unwrap();
    sandbox
        .berth()
        .args(["init", "--path"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("--force"));
    assert_eq!(fs::read_to_string(&target).unwrap(), "# mine\n");
}

#[test]
fn completions_for_bash() {
    Sandbox::new()
        .berth()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("berth"));
}
