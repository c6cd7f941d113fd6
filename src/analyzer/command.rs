//! Subprocess analyzer adapter
//!
//! Bridges the analyzer contract to a configured external command. The
//! command receives `{"diff": ..., "context": {...}}` as JSON on stdin and
//! must answer with a JSON array of model scores on stdout; a nonzero exit
//! fails the analysis with whatever stderr had to say.

use std::io::Write;
use std::process::{Command, Stdio};

use async_trait::async_trait;
use serde_json::json;

use super::{AnalyzerError, AnalyzerResult, CommitAnalyzer, CommitContext, ModelScore};

pub struct CommandAnalyzer {
    program: String,
    args: Vec<String>,
}

impl CommandAnalyzer {
    /// `command` is the program followed by its fixed arguments.
    pub fn new(command: &[String]) -> AnalyzerResult<Self> {
        let (program, args) = command.split_first().ok_or(AnalyzerError::Invocation {
            message: "analyzer command is empty".to_string(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn run_blocking(
        program: &str,
        args: &[String],
        request: &[u8],
    ) -> AnalyzerResult<Vec<ModelScore>> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnalyzerError::Invocation {
                message: format!("spawning {}: {}", program, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // A command that exits without reading stdin closes the pipe;
            // its exit status is the interesting part then, not the EPIPE.
            if let Err(e) = stdin.write_all(request) {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(AnalyzerError::Invocation {
                        message: format!("writing analyzer request: {}", e),
                    });
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| AnalyzerError::Invocation {
                message: format!("waiting for {}: {}", program, e),
            })?;

        if !output.status.success() {
            return Err(AnalyzerError::Invocation {
                message: format!(
                    "{} exited with {}: {}",
                    program,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| AnalyzerError::Output {
            message: format!("parsing analyzer response: {}", e),
        })
    }
}

#[async_trait]
impl CommitAnalyzer for CommandAnalyzer {
    async fn analyze(
        &self,
        diff: &str,
        context: &CommitContext,
    ) -> AnalyzerResult<Vec<ModelScore>> {
        let request =
            serde_json::to_vec(&json!({ "diff": diff, "context": context })).map_err(|e| {
                AnalyzerError::Output {
                    message: format!("encoding analyzer request: {}", e),
                }
            })?;

        let program = self.program.clone();
        let args = self.args.clone();

        tokio::task::spawn_blocking(move || Self::run_blocking(&program, &args, &request))
            .await
            .map_err(|e| AnalyzerError::Invocation {
                message: format!("analyzer task failed: {}", e),
            })?
    }
}
