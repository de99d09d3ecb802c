#![allow(dead_code)]

use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

pub struct Sidecar {
    child: Child,
    stdin: Option<ChildStdin>,
    reader: BufReader<ChildStdout>,
    next_id: u64,
}

impl Drop for Sidecar {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn spawn_sidecar() -> Sidecar {
    spawn(None, Stdio::null())
}

/// Spawn with stderr captured, `RUST_LOG` set to `rust_log` or unset; read
/// the log with [`Sidecar::finish`].
pub fn spawn_sidecar_logged(rust_log: Option<&str>) -> Sidecar {
    spawn(rust_log, Stdio::piped())
}

fn spawn(rust_log: Option<&str>, stderr: Stdio) -> Sidecar {
    let exe = env!("CARGO_BIN_EXE_psychod");
    let mut cmd = Command::new(exe);
    cmd.env_remove("PSYCHOD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(stderr);
    match rust_log {
        Some(filter) => cmd.env("RUST_LOG", filter),
        None => cmd.env_remove("RUST_LOG"),
    };
    let mut child = cmd.spawn().expect("spawn psychod");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    Sidecar {
        child,
        stdin: Some(stdin),
        reader: BufReader::new(stdout),
        next_id: 0,
    }
}

impl Sidecar {
    /// Close stdin, wait for the sidecar to exit and return its stderr.
    pub fn finish(&mut self) -> String {
        drop(self.stdin.take());
        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            pipe.read_to_string(&mut stderr).expect("read stderr");
        }
        self.child.wait().expect("wait for psychod");
        stderr
    }

    pub fn request(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        self.next_id += 1;
        let id = self.next_id.to_string();
        let payload = json!({
            "id": id,
            "method": method,
            "params": params,
        });
        let stdin = self.stdin.as_mut().expect("sidecar stdin open");
        writeln!(stdin, "{}", payload).expect("write request");
        stdin.flush().expect("flush request");

        let mut line = String::new();
        self.reader.read_line(&mut line).expect("read response line");
        assert!(!line.trim().is_empty(), "empty response for {}", method);
        let value: serde_json::Value =
            serde_json::from_str(line.trim()).expect("parse response json");
        assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id.as_str()));
        value
    }

    pub fn request_ok(&mut self, method: &str, params: serde_json::Value) -> serde_json::Value {
        let value = self.request(method, params);
        assert!(
            value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
            "{} failed: {}",
            method,
            value
        );
        value.get("result").cloned().unwrap_or_else(|| json!({}))
    }

    pub fn request_err(&mut self, method: &str, params: serde_json::Value) -> String {
        let value = self.request(method, params);
        assert_eq!(
            value.get("ok").and_then(|v| v.as_bool()),
            Some(false),
            "{} unexpectedly succeeded: {}",
            method,
            value
        );
        value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string()
    }
}

/// Two-question key: a=10/b=5 then a=1/b=2.
pub fn sample_key() -> serde_json::Value {
    json!({
        "keys": [{"a": 10, "b": 5}, {"a": 1, "b": 2}],
        "descriptions": [
            {"a": "Leads the group", "b": "Supports the group"},
            {"a": "Plans ahead", "b": "Improvises"}
        ]
    })
}
