use crate::handler::HandlerOutcome;
use http::StatusCode;
use may_minihttp::Response;

fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

/// Write a handler outcome. Every response is `application/json`.
pub fn write_outcome(res: &mut Response, outcome: HandlerOutcome) {
    let status = outcome.status;
    res.status_code(status.as_u16() as usize, status_reason(status));
    res.header("Content-Type: application/json");
    res.body_vec(outcome.body.into_bytes());
}
