//! The language-model collaborator.
//!
//! Everything the crate asks of a model goes through [`ChatModel::complete`]: an ordered list of
//! role-tagged messages in, plain text out. [`CommandModel`] drives an external CLI, and
//! [`RetryingModel`] wraps any model with bounded exponential backoff so that an unavailable
//! model ends in a typed [`ModelError::Exhausted`] rather than an endless wait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
/// Author of a chat message.
pub enum Role {
    /// Instructions framing the conversation.
    System,
    /// The request being made.
    User,
    /// A previous model reply.
    Assistant,
}

impl Role {
    #[must_use]
    /// Lowercase wire name of the role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
/// One chat message.
pub struct Message {
    /// Who wrote it.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl Message {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Language model failures.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// No command is configured.
    #[error("no model command is configured")]
    NotConfigured,

    /// The model process could not be started or talked to.
    #[error("failed to run model command `{command}`: {source}")]
    Io {
        /// Program that was run.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The model process exited unsuccessfully.
    #[error("model command exited with {status}: {stderr}")]
    Failed {
        /// Exit status description.
        status: String,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// The model did not answer in time.
    #[error("model did not respond within {0:?}")]
    Timeout(Duration),

    /// The model answered with nothing.
    #[error("model returned an empty response")]
    EmptyResponse,

    /// Every retry attempt failed.
    #[error("model unavailable after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Error from the final attempt.
        last: Box<ModelError>,
    },
}

/// A single request/response chat completion.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Completes the conversation in `messages` and returns the reply text.
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError>;
}

#[async_trait]
impl<T: ChatModel + ?Sized> ChatModel for Box<T> {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        (**self).complete(messages).await
    }
}

/// Renders messages as a role-tagged transcript for text-only model front ends.
#[must_use]
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for (i, message) in messages.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", message.role.as_str());
        let _ = writeln!(out, "{}", message.content.trim_end());
    }
    out
}

/// Runs an external command per completion: transcript on stdin, reply on stdout.
#[derive(Clone, Debug)]
pub struct CommandModel {
    argv: Vec<String>,
    timeout: Duration,
}

impl CommandModel {
    #[must_use]
    /// A model backed by `argv` (program followed by its arguments).
    pub fn new(argv: Vec<String>, timeout: Duration) -> Self {
        Self { argv, timeout }
    }
}

#[async_trait]
impl ChatModel for CommandModel {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let (program, args) = self.argv.split_first().ok_or(ModelError::NotConfigured)?;
        let io_err = |source| ModelError::Io {
            command: program.clone(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(io_err)?;

        let transcript = render_transcript(messages);
        let stdin = child.stdin.take();
        // Stdin is closed once the transcript is written so the command sees EOF.
        let write_transcript = async move {
            let Some(mut stdin) = stdin else {
                return Ok(());
            };
            match stdin.write_all(transcript.as_bytes()).await {
                // Commands may exit without reading the transcript.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!(program = %program, "model command closed stdin early");
                    Ok(())
                }
                result => result,
            }
        };

        // One deadline covers the transcript write and the output reads, which run concurrently.
        let (written, output) = tokio::time::timeout(self.timeout, async {
            tokio::join!(write_transcript, child.wait_with_output())
        })
        .await
        .map_err(|_| ModelError::Timeout(self.timeout))?;
        written.map_err(io_err)?;
        let output = output.map_err(io_err)?;

        if !output.status.success() {
            return Err(ModelError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let reply = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if reply.is_empty() {
            return Err(ModelError::EmptyResponse);
        }
        debug!(program = %program, bytes = reply.len(), "model replied");
        Ok(reply)
    }
}

/// Bounded exponential backoff.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first; treated as at least 1.
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    #[must_use]
    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Wraps a model with retries.
#[derive(Clone, Debug)]
pub struct RetryingModel<M> {
    inner: M,
    policy: RetryPolicy,
}

impl<M: ChatModel> RetryingModel<M> {
    #[must_use]
    /// Retries `inner` according to `policy`.
    pub fn new(inner: M, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    #[must_use]
    /// The wrapped model.
    pub fn inner(&self) -> &M {
        &self.inner
    }
}

#[async_trait]
impl<M: ChatModel> ChatModel for RetryingModel<M> {
    async fn complete(&self, messages: &[Message]) -> Result<String, ModelError> {
        let attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.inner.complete(messages).await {
                Ok(reply) => return Ok(reply),
                Err(e) if attempt >= attempts => {
                    warn!(attempt, error = %e, "model attempts exhausted");
                    return Err(ModelError::Exhausted {
                        attempts,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    let delay = self.policy.delay_after(attempt);
                    warn!(attempt, ?delay, error = %e, "model call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/model.rs"]
mod tests;
