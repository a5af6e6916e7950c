//! External command execution configuration.

use serde::{Deserialize, Serialize};

/// Limits applied by the secure executor to every child process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Cumulative stdout + stderr ceiling in bytes.
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
    /// Maximum length of a free-text argument after sanitization.
    #[serde(default = "default_max_argument")]
    pub max_argument_length: usize,
    /// `PATH` handed to the child. The child inherits nothing else.
    #[serde(default = "default_path")]
    pub child_path: String,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_output_bytes: default_max_output(),
            max_argument_length: default_max_argument(),
            child_path: default_path(),
        }
    }
}

fn default_max_output() -> usize {
    1024 * 1024
}

fn default_max_argument() -> usize {
    1000
}

fn default_path() -> String {
    "/usr/local/bin:/usr/bin:/bin".to_string()
}
