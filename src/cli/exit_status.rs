use std::process::ExitCode;

/// Exit status for CLI commands.
///
/// - `Success`: command completed, nothing to report
/// - `Failure`: command completed but found issues, with the configured code
/// - `Error` (2): command failed (config error, unwritable catalog, etc.)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure(u8),
    Error,
}

impl ExitStatus {
    /// `Success` for 0, `Failure` otherwise.
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            ExitStatus::Success
        } else {
            ExitStatus::Failure(code)
        }
    }
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure(code) => ExitCode::from(code),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}
