use super::rid;
use anyhow::{Result, anyhow};
use rstest::*;
use std::path::PathBuf;
use std::process::{Command, Output};

/// Runs the `sandbox-spec` binary with config files disabled and keeps the
/// output of the last run around for assertions. Scratch files live in a
/// per-test directory that is removed on drop.
pub struct SpecTool {
    pub dir: PathBuf,
    pub last_stdout: String,
    pub last_stderr: String,
    pub envs: Vec<(String, String)>,
    pub no_default_options: bool,
}

impl SpecTool {
    pub fn new() -> Self {
        let dir = std::env::temp_dir()
            .join(format!("sandbox-spec-test-{}", rid()));
        std::fs::create_dir_all(&dir).unwrap_or_else(|e| {
            panic!("Failed to create {}: {}", dir.display(), e)
        });
        Self {
            dir,
            last_stdout: String::new(),
            last_stderr: String::new(),
            envs: vec![],
            no_default_options: false,
        }
    }

    /// Writes `contents` to a scratch file and returns its path.
    pub fn file(&self, name: &str, contents: &str) -> Result<String> {
        let path = self.dir.join(name);
        std::fs::write(&path, contents)?;
        Ok(path.display().to_string())
    }

    pub fn path(&self, name: &str) -> String {
        self.dir.join(name).display().to_string()
    }

    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    pub fn run(&mut self, args: &[&str]) -> Result<Output> {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_sandbox-spec"));
        if !self.no_default_options {
            cmd.arg("--no-config");
        }
        cmd.args(args);
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }
        println!(
            "Running command: {} {}",
            cmd.get_program().to_string_lossy(),
            cmd.get_args()
                .map(|c| c.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = cmd.output()?;
        self.last_stdout = String::from_utf8_lossy(&output.stdout).to_string();
        self.last_stderr = String::from_utf8_lossy(&output.stderr).to_string();

        match output.status.code() {
            Some(0) => Ok(output),
            Some(code) => Err(anyhow!(
                "Command returned non-zero exit code: {}\nstdout: {}\nstderr: {}",
                code,
                self.last_stdout,
                self.last_stderr
            )),
            None => Err(anyhow!(
                "Command did not return a valid exit code\nstdout: {}\nstderr: {}",
                self.last_stdout,
                self.last_stderr
            )),
        }
    }

    pub fn pass(&mut self, args: &[&str]) -> bool {
        if self.run(args).is_ok() {
            return true;
        }
        println!("last_stderr: {}", self.last_stderr);
        println!("last_stdout: {}", self.last_stdout);
        false
    }

    pub fn xfail(&mut self, args: &[&str]) -> bool {
        if self.run(args).is_err() {
            return true;
        }
        println!("last_stderr: {}", self.last_stderr);
        println!("last_stdout: {}", self.last_stdout);
        false
    }
}

impl Drop for SpecTool {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[fixture]
pub fn tool() -> SpecTool {
    SpecTool::new()
}
