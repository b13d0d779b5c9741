//! Shared helpers for the behavioral specs.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

pub use assert_cmd::prelude::*;
pub use predicates::prelude::*;

/// Longest any spec waits for an asynchronous effect
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

const SPEC_POLL_MS: u64 = 20;

/// Poll `check` until it holds or `max_ms` elapses
pub fn wait_for(max_ms: u64, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_millis(max_ms);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(SPEC_POLL_MS));
    }
    check()
}

/// Path to a workspace binary
///
/// `CARGO_BIN_EXE_<name>` is only set for tests of the package that owns
/// the binary, so this falls back to the profile directory the spec binary
/// runs from, building the binaries once if they are missing.
pub fn bin_path(name: &str) -> PathBuf {
    if let Some(path) = std::env::var_os(format!("CARGO_BIN_EXE_{name}")) {
        return PathBuf::from(path);
    }
    let path = profile_dir().join(format!("{name}{}", std::env::consts::EXE_SUFFIX));
    if !path.exists() {
        build_binaries();
    }
    assert!(path.exists(), "binary not found: {}", path.display());
    path
}

/// `target/<profile>`, the parent of the `deps` directory holding this test
fn profile_dir() -> PathBuf {
    let exe = std::env::current_exe().unwrap();
    let dir = exe.parent().unwrap();
    if dir.ends_with("deps") {
        dir.parent().unwrap().to_path_buf()
    } else {
        dir.to_path_buf()
    }
}

fn build_binaries() {
    static BUILT: OnceLock<()> = OnceLock::new();
    BUILT.get_or_init(|| {
        let mut cmd = Command::new(env!("CARGO"));
        cmd.current_dir(env!("CARGO_MANIFEST_DIR"))
            .args(["build", "--bins", "-p", "lk", "-p", "lk-daemon"]);
        if !cfg!(debug_assertions) {
            cmd.arg("--release");
        }
        let status = cmd.status().unwrap();
        assert!(status.success(), "building lk and lkd failed");
    });
}

/// Provisioning script that records its arguments and succeeds
pub const ACCEPTING_SCRIPT: &str = r#"echo "$@" >> "$(dirname "$0")/calls.log"
cat > /dev/null
exit 0
"#;

/// Provisioning script that always refuses
pub const REFUSING_SCRIPT: &str = r#"cat > /dev/null
echo "user exists" >&2
exit 1
"#;

/// An isolated leasekeeper installation in a temp directory
pub struct Project {
    dir: tempfile::TempDir,
    daemon: Option<Child>,
}

impl Project {
    /// Config with an accepting provisioning script and mail disabled
    pub fn empty() -> Self {
        Self::with_script(ACCEPTING_SCRIPT)
    }

    pub fn with_script(script: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let project = Self { dir, daemon: None };
        project.file("sftpctl.sh", script);
        project.file(
            "config.toml",
            &format!(
                r#"[store]
path = "{store}"

[schedule]
timezone = "utc"

[provision]
program = "/bin/sh"
args = ["{script}"]
timeout = "5s"

[notify]
enabled = false
"#,
                store = project.store_path().display(),
                script = project.path().join("sftpctl.sh").display(),
            ),
        );
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn store_path(&self) -> PathBuf {
        self.path().join("store")
    }

    pub fn config_path(&self) -> PathBuf {
        self.path().join("config.toml")
    }

    pub fn socket_path(&self) -> PathBuf {
        self.store_path().join("lkd.sock")
    }

    pub fn log_path(&self) -> PathBuf {
        self.store_path().join("logs").join("lkd.log")
    }

    /// Write a file relative to the project
    pub fn file(&self, rel: &str, content: &str) {
        let path = self.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path().join(rel)).unwrap_or_default()
    }

    /// `lk` pointed at this project's config
    pub fn lk(&self) -> CliRun {
        let mut cmd = assert_cmd::Command::new(bin_path("lk"));
        cmd.env_remove("LK_CONFIG")
            .env("LK_LOG", "off")
            .arg("--config")
            .arg(self.config_path());
        CliRun { cmd }
    }

    /// `lkd` pointed at this project's config, not waited on
    pub fn lkd(&self) -> Command {
        let mut cmd = Command::new(bin_path("lkd"));
        cmd.env_remove("LK_CONFIG")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }

    /// Start the daemon and block until it prints READY
    pub fn start_daemon(&mut self) {
        let mut child = self
            .lkd()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        let stdout = child.stdout.take().unwrap();
        let mut line = String::new();
        BufReader::new(stdout).read_line(&mut line).unwrap();
        assert_eq!(line.trim(), "READY", "daemon did not become ready");
        self.daemon = Some(child);
    }

    /// Wait for the daemon to exit on its own
    pub fn wait_daemon_exit(&mut self) -> bool {
        let Some(child) = self.daemon.as_mut() else {
            return true;
        };
        let exited = wait_for(SPEC_WAIT_MAX_MS, || matches!(child.try_wait(), Ok(Some(_))));
        if exited {
            self.daemon = None;
        }
        exited
    }
}

impl Drop for Project {
    fn drop(&mut self) {
        if let Some(mut child) = self.daemon.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

/// A pending CLI invocation with fluent assertions
pub struct CliRun {
    cmd: assert_cmd::Command,
}

impl CliRun {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn stdin(mut self, input: &str) -> Self {
        self.cmd.write_stdin(input);
        self
    }

    pub fn passes(mut self) -> CliOutput {
        CliOutput {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> CliOutput {
        CliOutput {
            assert: self.cmd.assert().failure(),
        }
    }
}

pub struct CliOutput {
    assert: assert_cmd::assert::Assert,
}

impl CliOutput {
    pub fn stdout_has(self, text: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(text)),
        }
    }

    pub fn stdout_lacks(self, text: &str) -> Self {
        Self {
            assert: self.assert.stdout(predicate::str::contains(text).not()),
        }
    }

    pub fn stderr_has(self, text: &str) -> Self {
        Self {
            assert: self.assert.stderr(predicate::str::contains(text)),
        }
    }

    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).into_owned()
    }
}
