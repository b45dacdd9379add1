//! Exit codes, following POSIX conventions — the rest of this crate uses
//! `anyhow::Result` and leaves message formatting to the call site.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    UserError = 1,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
