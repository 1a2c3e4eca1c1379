//! Logging of hub operation results

use crate::hub::{HubError, StatusInfo};
use tracing::{error, info, warn};

/// Log the outcome of a hub operation tagged `op`
///
/// Errors log as `"{op} error: ..."`, statuses other than 204 log as
/// `"{op} status: {code} {message}"`. Returns the line written, if any.
pub fn report_result(op: &str, result: &Result<StatusInfo, HubError>) -> Option<String> {
    match result {
        Err(e) => {
            let line = format!("{} error: {}", op, e);
            error!("{}", line);
            Some(line)
        }
        Ok(status) if status.is_no_content() => None,
        Ok(status) => {
            let line = format!("{} status: {} {}", op, status.code, status.message);
            if status.is_success() {
                info!("{}", line);
            } else {
                warn!("{}", line);
            }
            Some(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_content_is_silent() {
        let result = Ok(StatusInfo::new(204, "No Content"));
        assert_eq!(report_result("send", &result), None);
    }

    #[test]
    fn test_status_line() {
        let result = Ok(StatusInfo::new(200, "OK"));
        assert_eq!(report_result("complete", &result).as_deref(), Some("complete status: 200 OK"));

        let result = Ok(StatusInfo::new(412, "Precondition Failed"));
        assert_eq!(
            report_result("complete", &result).as_deref(),
            Some("complete status: 412 Precondition Failed")
        );
    }

    #[test]
    fn test_error_line() {
        let result = Err(HubError::Closed);
        assert_eq!(
            report_result("receive", &result).as_deref(),
            Some("receive error: hub closed the connection")
        );
    }
}
