//! # galaxy-executor
//!
//! Sandboxed execution of whitelisted external commands.
//!
//! A [`CommandPolicy`] names every program that may run and the arguments
//! it accepts. [`SecureExecutor`] checks a request against the policy and
//! spawns the program directly from an argv array with no shell, a
//! stripped environment, a wall-clock timeout and a cap on captured output.

pub mod error;
pub mod executor;
pub mod policy;
pub mod sanitize;

pub use error::ExecError;
pub use executor::{ExecutionOutput, SecureExecutor, parse_command_line};
pub use policy::{ArgumentRule, CommandPolicy, PolicyEntry, PolicyRejection};
pub use sanitize::sanitize_argument;
