//! Shared helpers for CLI specs
//!
//! Every spec runs in its own temp directory, which also serves as the
//! config home so a developer's own config never leaks in.

use assert_cmd::assert::Assert;
use assert_cmd::Command;
use std::path::Path;
use tempfile::TempDir;

pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `rel`, creating parent directories
    pub fn file(&self, rel: &str, contents: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }

    pub fn tenure(&self) -> Cli {
        let mut cmd = Command::cargo_bin("tenure").unwrap();
        cmd.current_dir(self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("HOME", self.path())
            .env_remove("TENURE_REDIS_URL")
            .env_remove("RUST_LOG");
        Cli { cmd }
    }
}

pub struct Cli {
    cmd: Command,
}

impl Cli {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn passes(mut self) -> Run {
        Run {
            assert: self.cmd.assert().success(),
        }
    }

    pub fn fails(mut self) -> Run {
        Run {
            assert: self.cmd.assert().failure(),
        }
    }

    pub fn exits(mut self, code: i32) -> Run {
        Run {
            assert: self.cmd.assert().code(code),
        }
    }
}

pub struct Run {
    assert: Assert,
}

impl Run {
    fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stdout).to_string()
    }

    fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.assert.get_output().stderr).to_string()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout should contain {:?}\nstdout:\n{}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain {:?}\nstdout:\n{}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr should contain {:?}\nstderr:\n{}",
            expected,
            stderr
        );
        self
    }

    pub fn stderr_lacks(self, unexpected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            !stderr.contains(unexpected),
            "stderr should not contain {:?}\nstderr:\n{}",
            unexpected,
            stderr
        );
        self
    }
}
