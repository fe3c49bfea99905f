use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct SidecarRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl SidecarRun {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&extract_json_payload(&self.stdout)).unwrap_or_else(|e| {
            panic!("stdout is not JSON ({e}):\n{}\nstderr:\n{}", self.stdout, self.stderr)
        })
    }

    pub fn stderr_json(&self) -> serde_json::Value {
        serde_json::from_str(&extract_json_payload(&self.stderr)).unwrap_or_else(|e| {
            panic!("stderr is not JSON ({e}):\n{}", self.stderr)
        })
    }
}

/// Isolated HOME and data dir for one test.
pub struct SidecarWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl SidecarWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let data_dir = root.join(".sidecar");
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            data_dir,
            log_dir,
        }
    }

    pub fn overlay_path(&self) -> PathBuf {
        self.data_dir.join("overlay.json")
    }

    pub fn read_overlay(&self) -> serde_json::Value {
        let contents = fs::read_to_string(self.overlay_path()).expect("read overlay");
        serde_json::from_str(&contents).expect("overlay json")
    }
}

pub fn run_sidecar<I, S>(workspace: &SidecarWorkspace, args: I, label: &str) -> SidecarRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_sidecar_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_sidecar_with_env<I, S, E, K, V>(
    workspace: &SidecarWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> SidecarRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|a| a.as_ref().to_string_lossy().to_string())
        .collect();

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("sidecar"));
    cmd.current_dir(&workspace.root);
    cmd.env_remove("SIDECAR_DIR");
    cmd.env_remove("LINEAR_GRAPHQL_API");
    cmd.env_remove("LINEAR_GRAPHQL_API_FILE");
    cmd.env("HOME", &workspace.root);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "sidecar=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.envs(env_vars);
    cmd.args(&args);

    let start = Instant::now();
    let output = cmd.output().expect("run sidecar");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        args,
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    SidecarRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Skip log lines that precede the JSON document.
pub fn extract_json_payload(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    output.trim().to_string()
}
