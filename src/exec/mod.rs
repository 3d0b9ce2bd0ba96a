// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs one command in one project directory and turns whatever happens into
//! exactly one [`ProjectTestResult`].
//!
//! - [`command`] holds the program + arguments to run.
//! - [`capture`] merges stdout and stderr into one ordered buffer.
//! - [`process`] is the real executor built on `tokio::process::Command`.
//! - [`backend`] provides the `ProjectExecutor` trait the runner depends on,
//!   which tests replace with fakes.
//! - [`result`] defines the per-project outcome and its sentinel exit codes.

pub mod backend;
pub mod capture;
pub mod command;
pub mod process;
pub mod result;

pub use backend::{ExecRequest, ProjectExecutor};
pub use capture::DEFAULT_OUTPUT_GRACE;
pub use command::CommandSpec;
pub use process::{run_project, ProcessExecutor};
pub use result::{
    FailureReason, ProjectTestResult, CANCELLED_EXIT_CODE, INVALID_COMMAND_EXIT_CODE,
    SPAWN_FAILED_EXIT_CODE, TIMED_OUT_EXIT_CODE, UNKNOWN_EXIT_STATUS,
};
