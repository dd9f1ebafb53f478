use std::fmt;
use std::path::Path;

/// Ordered token sequence for one invocation: program first, then arguments.
///
/// Immutable once handed to a [`ProcessRunner`][crate::ProcessRunner]; the
/// builder methods consume and return `self` so a command line reads as one
/// expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    tokens: Vec<String>,
}

impl Command {
    /// Start a command line with the program to execute.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            tokens: vec![program.into()],
        }
    }

    /// Build a command from pre-flattened tokens. An empty sequence is
    /// accepted here and rejected at spawn time.
    pub fn from_tokens(tokens: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Wrap a full shell line: `sh -c` on Unix, PowerShell on Windows.
    pub fn shell(line: impl Into<String>) -> Self {
        if cfg!(windows) {
            Self::new("powershell")
                .args(["-NoProfile", "-NonInteractive", "-Command"])
                .arg(line)
        } else {
            Self::new("sh").arg("-c").arg(line)
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.tokens.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tokens.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path-like argument, converted lossily to UTF-8.
    pub fn arg_path(mut self, path: impl AsRef<Path>) -> Self {
        self.tokens
            .push(path.as_ref().to_string_lossy().into_owned());
        self
    }

    /// The program token, if any.
    pub fn program(&self) -> Option<&str> {
        self.tokens.first().map(String::as_str)
    }

    /// The argument tokens after the program.
    pub fn args_slice(&self) -> &[String] {
        self.tokens.get(1..).unwrap_or_default()
    }

    /// All tokens, program included.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}
