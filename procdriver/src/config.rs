//! Per-invocation configuration and the environment-provider seam.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::redirect::{OutputSink, StdinSource};

/// Source of the parent environment map.
///
/// The runner never reads `std::env` directly; it goes through this trait so
/// tests can substitute a fixed map.
pub trait EnvProvider: Send + Sync {
    fn vars(&self) -> HashMap<String, String>;
}

/// Default provider backed by the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnv;

impl EnvProvider for SystemEnv {
    fn vars(&self) -> HashMap<String, String> {
        std::env::vars().collect()
    }
}

/// Options for spawning and driving one child process.
///
/// Built once, passed by value per invocation, never mutated afterwards.
#[derive(Debug, Clone)]
pub struct InvokeConfig {
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) env_overrides: HashMap<String, Option<String>>,
    pub(crate) inherit_env: bool,
    pub(crate) stdin: StdinSource,
    pub(crate) stdout: OutputSink,
    pub(crate) stderr: OutputSink,
    pub(crate) merge_stderr: bool,
    pub(crate) timeout: Option<Duration>,
    pub(crate) check: bool,
}

impl Default for InvokeConfig {
    fn default() -> Self {
        Self {
            cwd: None,
            env_overrides: HashMap::new(),
            inherit_env: true,
            stdin: StdinSource::default(),
            stdout: OutputSink::default(),
            stderr: OutputSink::default(),
            merge_stderr: false,
            timeout: None,
            check: false,
        }
    }
}

impl InvokeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Working directory for the child. Unset means the runner's own current
    /// directory.
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Set one environment variable for the child.
    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(name.into(), Some(value.into()));
        self
    }

    /// Remove an inherited variable from the child's environment.
    pub fn env_remove(mut self, name: impl Into<String>) -> Self {
        self.env_overrides.insert(name.into(), None);
        self
    }

    /// Whether the parent environment is propagated at all (default true).
    pub fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    pub fn stdin(mut self, source: impl Into<StdinSource>) -> Self {
        self.stdin = source.into();
        self
    }

    pub fn stdout(mut self, sink: OutputSink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: OutputSink) -> Self {
        self.stderr = sink;
        self
    }

    /// Deliver stderr chunks on the stdout channel.
    pub fn merge_stderr(mut self, merge: bool) -> Self {
        self.merge_stderr = merge;
        self
    }

    /// Wall-clock limit for the whole invocation. Default is unbounded.
    pub fn timeout(mut self, limit: Duration) -> Self {
        self.timeout = Some(limit);
        self
    }

    /// Turn a non-zero exit code into [`InvokeError::CommandFailed`]
    /// (only honored by [`ProcessRunner::run`]).
    ///
    /// [`InvokeError::CommandFailed`]: crate::InvokeError::CommandFailed
    /// [`ProcessRunner::run`]: crate::ProcessRunner::run
    pub fn check(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    /// Child environment: the provider map if inherited, overlaid with the
    /// explicit overrides. A `None` override deletes an inherited variable.
    pub(crate) fn resolved_env(&self, provider: &dyn EnvProvider) -> HashMap<String, String> {
        let mut env = if self.inherit_env {
            provider.vars()
        } else {
            HashMap::new()
        };
        for (name, value) in &self.env_overrides {
            match value {
                Some(value) => {
                    env.insert(name.clone(), value.clone());
                }
                None => {
                    env.remove(name);
                }
            }
        }
        env
    }
}
