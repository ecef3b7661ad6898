use crate::error::AttemptError;
use hyper::StatusCode;
use std::time::Duration;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StatusClass {
    Success,
    Failure,
}

impl StatusClass {
    /// Success when the hundreds digit is 2, failure for everything else.
    #[inline]
    #[must_use]
    pub fn of(status: StatusCode) -> Self {
        if status.as_u16() / 100 == 2 {
            Self::Success
        } else {
            Self::Failure
        }
    }
}

/// Outcome of one dispatch, kept only long enough to print and count it.
#[derive(Debug)]
pub struct AttemptResult {
    pub elapsed: Duration,
    /// Final status, absent when the exchange failed below HTTP.
    pub status: Option<StatusCode>,
    /// The response body on success.
    pub outcome: Result<Vec<u8>, AttemptError>,
}

impl AttemptResult {
    #[must_use]
    pub fn classify(elapsed: Duration, response: Result<(StatusCode, Vec<u8>), AttemptError>) -> Self {
        match response {
            Ok((status, body)) => {
                let outcome = match StatusClass::of(status) {
                    StatusClass::Success => Ok(body),
                    StatusClass::Failure => Err(AttemptError::Status {
                        status,
                        body: String::from_utf8_lossy(&body).into_owned(),
                    }),
                };
                Self {
                    elapsed,
                    status: Some(status),
                    outcome,
                }
            }
            Err(e) => Self {
                elapsed,
                status: None,
                outcome: Err(e),
            },
        }
    }

    #[inline]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    #[inline]
    pub fn status_class(&self) -> StatusClass {
        if self.is_success() {
            StatusClass::Success
        } else {
            StatusClass::Failure
        }
    }

    /// `[<elapsed>] <body>` or `[<elapsed>] err: <message>`, on a single line.
    #[must_use]
    pub fn trace_line(&self) -> String {
        let mut line = match &self.outcome {
            Ok(body) => format!("[{:?}] {}", self.elapsed, String::from_utf8_lossy(body)),
            Err(e) => format!("[{:?}] err: {e}", self.elapsed),
        };
        line.truncate(line.trim_end_matches(['\r', '\n']).len());
        line
    }
}
