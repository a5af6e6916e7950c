//! Command whitelist.
//!
//! The whitelist is closed: a command without an entry is rejected. Each
//! entry maps a request name to the program that runs, a rule for its
//! arguments and a timeout ceiling.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::sanitize;

/// Custom argument check. Returns a reason on rejection.
pub type ArgumentValidator = Arc<dyn Fn(&[String], usize) -> Result<(), String> + Send + Sync>;

/// How the arguments of a whitelisted command are checked.
#[derive(Clone)]
pub enum ArgumentRule {
    /// Every argument must be a member of the set. An empty set admits no arguments.
    Exact(BTreeSet<String>),
    /// Free text. Every argument must survive [`sanitize::sanitize_argument`] unchanged.
    Sanitized,
    /// Arbitrary check, given the arguments and the maximum argument length.
    Custom(ArgumentValidator),
}

impl ArgumentRule {
    /// An exact rule from a list of literals.
    pub fn exact<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Exact(allowed.into_iter().map(Into::into).collect())
    }

    /// A rule that admits no arguments at all.
    pub fn none() -> Self {
        Self::Exact(BTreeSet::new())
    }
}

impl fmt::Debug for ArgumentRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(set) => f.debug_tuple("Exact").field(set).finish(),
            Self::Sanitized => f.write_str("Sanitized"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// One whitelisted command.
#[derive(Debug, Clone)]
pub struct PolicyEntry {
    /// Program resolved against the child's `PATH`.
    pub program: String,
    /// Argument rule.
    pub rule: ArgumentRule,
    /// Timeout ceiling.
    pub timeout: Duration,
}

impl PolicyEntry {
    /// Creates an entry.
    pub fn new(program: impl Into<String>, rule: ArgumentRule, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            rule,
            timeout,
        }
    }
}

/// Why a request was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyRejection {
    /// No entry for the command.
    #[error("command '{0}' is not allowed")]
    UnknownCommand(String),
    /// An argument is outside the command's exact set.
    #[error("argument '{0}' is not allowed")]
    ArgumentNotAllowed(String),
    /// A free-text argument contains characters the sanitizer would alter.
    /// The value itself is not echoed back.
    #[error("argument {index} contains disallowed characters")]
    UnsafeArgument {
        /// Zero-based argument position.
        index: usize,
    },
    /// Rejected by a custom validator.
    #[error("{0}")]
    Rejected(String),
}

/// Immutable whitelist consulted before any process is spawned.
#[derive(Debug, Clone)]
pub struct CommandPolicy {
    entries: HashMap<String, PolicyEntry>,
    max_argument_length: usize,
}

impl CommandPolicy {
    /// An empty policy, which rejects everything.
    pub fn new(max_argument_length: usize) -> Self {
        Self {
            entries: HashMap::new(),
            max_argument_length,
        }
    }

    /// Adds or replaces an entry.
    pub fn allow(mut self, name: impl Into<String>, entry: PolicyEntry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// The built-in whitelist:
    ///
    /// | command | arguments | timeout |
    /// |---------|-----------|---------|
    /// | `ls` | `-l -a -la -lh -lah` | 5 s |
    /// | `echo` | sanitized free text | 2 s |
    /// | `node` | `--version -v --help` | 10 s |
    /// | `npm` | `--version -v list help test`, or `run <script>` | 30 s |
    /// | `pwd` | none | 2 s |
    /// | `git` | `status log diff --version` | 10 s |
    pub fn default_whitelist(max_argument_length: usize) -> Self {
        Self::new(max_argument_length)
            .allow(
                "ls",
                PolicyEntry::new(
                    "ls",
                    ArgumentRule::exact(["-l", "-a", "-la", "-lh", "-lah"]),
                    Duration::from_secs(5),
                ),
            )
            .allow(
                "echo",
                PolicyEntry::new("echo", ArgumentRule::Sanitized, Duration::from_secs(2)),
            )
            .allow(
                "node",
                PolicyEntry::new(
                    "node",
                    ArgumentRule::exact(["--version", "-v", "--help"]),
                    Duration::from_secs(10),
                ),
            )
            .allow(
                "npm",
                PolicyEntry::new(
                    "npm",
                    ArgumentRule::Custom(Arc::new(npm_arguments)),
                    Duration::from_secs(30),
                ),
            )
            .allow(
                "pwd",
                PolicyEntry::new("pwd", ArgumentRule::none(), Duration::from_secs(2)),
            )
            .allow(
                "git",
                PolicyEntry::new(
                    "git",
                    ArgumentRule::exact(["status", "log", "diff", "--version"]),
                    Duration::from_secs(10),
                ),
            )
    }

    /// Checks a request, returning the matching entry.
    pub fn check(&self, command: &str, args: &[String]) -> Result<&PolicyEntry, PolicyRejection> {
        let entry = self
            .entries
            .get(command)
            .ok_or_else(|| PolicyRejection::UnknownCommand(command.to_string()))?;

        match &entry.rule {
            ArgumentRule::Exact(allowed) => {
                if let Some(bad) = args.iter().find(|a| !allowed.contains(a.as_str())) {
                    return Err(PolicyRejection::ArgumentNotAllowed(bad.clone()));
                }
            }
            ArgumentRule::Sanitized => {
                if let Some(index) = args
                    .iter()
                    .position(|a| !sanitize::is_clean(a, self.max_argument_length))
                {
                    return Err(PolicyRejection::UnsafeArgument { index });
                }
            }
            ArgumentRule::Custom(validator) => {
                validator(args, self.max_argument_length).map_err(PolicyRejection::Rejected)?;
            }
        }
        Ok(entry)
    }

    /// Whether the request passes [`Self::check`].
    pub fn is_allowed(&self, command: &str, args: &[String]) -> bool {
        self.check(command, args).is_ok()
    }

    /// Names of all whitelisted commands, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

const NPM_ARGUMENTS: &[&str] = &["--version", "-v", "list", "help", "test"];

/// `npm run <script>` with one sanitized script name, or flags from the fixed set.
fn npm_arguments(args: &[String], max_argument_length: usize) -> Result<(), String> {
    match args {
        [run, rest @ ..] if run == "run" => match rest {
            [] => Ok(()),
            [script] if sanitize::is_clean(script, max_argument_length) => Ok(()),
            [_] => Err("invalid characters in npm script name".to_string()),
            _ => Err("npm run accepts a single script name".to_string()),
        },
        _ => match args.iter().find(|a| !NPM_ARGUMENTS.contains(&a.as_str())) {
            Some(bad) => Err(format!("argument '{bad}' is not allowed")),
            None => Ok(()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn policy() -> CommandPolicy {
        CommandPolicy::default_whitelist(1000)
    }

    #[test]
    fn test_unknown_command_rejected() {
        let err = policy().check("rm", &args(&["-rf", "/"])).unwrap_err();
        assert_eq!(err, PolicyRejection::UnknownCommand("rm".into()));
    }

    #[test]
    fn test_exact_arguments() {
        let p = policy();
        assert!(p.is_allowed("ls", &args(&["-la"])));
        assert!(p.is_allowed("ls", &[]));
        assert_eq!(
            p.check("ls", &args(&["-l", "/etc"])).unwrap_err(),
            PolicyRejection::ArgumentNotAllowed("/etc".into())
        );
        assert!(!p.is_allowed("ls", &args(&["&&", "cat", "/etc/passwd"])));
    }

    #[test]
    fn test_pwd_takes_no_arguments() {
        let p = policy();
        assert!(p.is_allowed("pwd", &[]));
        assert!(!p.is_allowed("pwd", &args(&["-P"])));
    }

    #[test]
    fn test_sanitized_arguments() {
        let p = policy();
        assert!(p.is_allowed("echo", &args(&["hello world"])));
        assert_eq!(
            p.check("echo", &args(&["ok", "hello; rm -rf /"])).unwrap_err(),
            PolicyRejection::UnsafeArgument { index: 1 }
        );
        assert!(!p.is_allowed("echo", &args(&["$SECRET_KEY"])));
    }

    #[test]
    fn test_sanitized_length_cap() {
        let p = CommandPolicy::default_whitelist(8);
        assert!(p.is_allowed("echo", &args(&["12345678"])));
        assert!(!p.is_allowed("echo", &args(&["123456789"])));
    }

    #[test]
    fn test_npm_rules() {
        let p = policy();
        assert!(p.is_allowed("npm", &args(&["--version"])));
        assert!(p.is_allowed("npm", &args(&["run", "build"])));
        assert!(!p.is_allowed("npm", &args(&["run", "build;curl"])));
        assert!(!p.is_allowed("npm", &args(&["run", "build", "--", "x"])));
        assert!(!p.is_allowed("npm", &args(&["install", "left-pad"])));
    }

    #[test]
    fn test_custom_entry() {
        let p = CommandPolicy::new(100).allow(
            "sleep",
            PolicyEntry::new(
                "sleep",
                ArgumentRule::Custom(Arc::new(
                    |args: &[String], _: usize| -> Result<(), String> {
                        match args {
                            [secs] if secs.parse::<u32>().is_ok() => Ok(()),
                            _ => Err("expected a number of seconds".into()),
                        }
                    },
                )),
                Duration::from_secs(1),
            ),
        );
        assert!(p.is_allowed("sleep", &args(&["1"])));
        assert_eq!(
            p.check("sleep", &args(&["x"])).unwrap_err(),
            PolicyRejection::Rejected("expected a number of seconds".into())
        );
        assert_eq!(p.commands(), vec!["sleep"]);
    }
}
