//! Process exit statuses.
//!
//! Follows the Nagios plugin convention used by the surrounding scheduling
//! tooling: 0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitCode {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        match self {
            ExitCode::Ok => 0,
            ExitCode::Warning => 1,
            ExitCode::Critical => 2,
            ExitCode::Unknown => 3,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.as_i32() as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Ok.as_i32(), 0);
        assert_eq!(ExitCode::Warning.as_i32(), 1);
        assert_eq!(ExitCode::Critical.as_i32(), 2);
        assert_eq!(ExitCode::Unknown.as_i32(), 3);
    }
}
