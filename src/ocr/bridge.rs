use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::Instant;

use crate::ocr::OcrEngine;

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub python: PathBuf,
    pub script_path: PathBuf,
    pub lang: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            python: PathBuf::from("python3"),
            script_path: PathBuf::from("bridge/paddle_bridge.py"),
            lang: "en".to_string(),
        }
    }
}

impl BridgeConfig {
    pub fn with_script(mut self, script_path: PathBuf) -> Self {
        self.script_path = script_path;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_python(mut self, python: PathBuf) -> Self {
        self.python = python;
        self
    }
}

#[derive(Debug, Serialize)]
struct BridgeRequest<'a> {
    image: &'a Path,
}

#[derive(Debug, Deserialize)]
struct BridgeReady {
    ready: bool,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<String>,
}

/// Long-lived PaddleOCR process speaking line-delimited JSON.
///
/// The engine is loaded once in [`OcrBridge::spawn`]; every
/// [`OcrEngine::recognize`] call reuses it.
#[derive(Debug)]
pub struct OcrBridge {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl OcrBridge {
    pub fn spawn(config: &BridgeConfig) -> Result<Self> {
        if !config.script_path.exists() {
            anyhow::bail!(
                "OCR bridge script not found: {}",
                config.script_path.display()
            );
        }

        info!("starting OCR engine (lang={})", config.lang);
        let started = Instant::now();
        let mut child = Command::new(&config.python)
            .arg(&config.script_path)
            .arg("--lang")
            .arg(&config.lang)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| {
                format!(
                    "failed to invoke python OCR bridge via {}",
                    config.python.display()
                )
            })?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| anyhow::anyhow!("OCR bridge stdout was not captured"))?;

        let mut bridge = Self {
            child,
            stdin,
            stdout,
        };
        let line = bridge.read_line().context("OCR bridge failed to start")?;
        let ready: BridgeReady = serde_json::from_str(&line)
            .with_context(|| format!("unexpected OCR bridge handshake: {line}"))?;
        if !ready.ready {
            anyhow::bail!("OCR bridge reported it is not ready");
        }
        info!(
            "OCR engine ready in {:.2} seconds",
            started.elapsed().as_secs_f64()
        );
        Ok(bridge)
    }

    fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line)?;
        if read == 0 {
            let status = self.child.try_wait()?;
            anyhow::bail!("OCR bridge exited unexpectedly (status: {status:?})");
        }
        Ok(line)
    }
}

impl OcrEngine for OcrBridge {
    fn recognize(&mut self, image: &Path) -> Result<Value> {
        let request = serde_json::to_string(&BridgeRequest { image })?;
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("OCR bridge input is closed"))?;
        writeln!(stdin, "{request}").context("failed to send request to OCR bridge")?;
        stdin.flush()?;

        let line = self.read_line()?;
        let response: BridgeResponse =
            serde_json::from_str(&line).with_context(|| "failed to parse OCR JSON response")?;
        if !response.ok {
            anyhow::bail!(
                "OCR bridge failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
        }
        debug!("OCR bridge answered for {}", image.display());
        Ok(response.result)
    }
}

impl Drop for OcrBridge {
    fn drop(&mut self) {
        drop(self.stdin.take());
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_request_as_single_line() -> Result<()> {
        let line = serde_json::to_string(&BridgeRequest {
            image: Path::new("scratch/temp_page_1.png"),
        })?;
        assert_eq!(line, r#"{"image":"scratch/temp_page_1.png"}"#);
        Ok(())
    }

    #[test]
    fn parses_success_and_failure_responses() -> Result<()> {
        let ok: BridgeResponse =
            serde_json::from_str(r#"{"ok": true, "result": [{"rec_texts": ["a"]}]}"#)?;
        assert!(ok.ok);
        assert_eq!(ok.result, json!([{"rec_texts": ["a"]}]));

        let failed: BridgeResponse =
            serde_json::from_str(r#"{"ok": false, "error": "cannot read image"}"#)?;
        assert!(!failed.ok);
        assert_eq!(failed.result, Value::Null);
        assert_eq!(failed.error.as_deref(), Some("cannot read image"));
        Ok(())
    }

    #[test]
    fn missing_script_is_reported() {
        let config = BridgeConfig::default().with_script(PathBuf::from("no/such/bridge.py"));
        let err = OcrBridge::spawn(&config).expect_err("spawn should fail");
        assert!(err.to_string().contains("not found"));
    }
}
