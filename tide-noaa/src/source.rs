//! Seam between the fetcher and whatever serves station-year CSV bodies.

use crate::error::{Result, TideError};
use crate::request::TideRequest;

/// How many leading characters of a body are inspected for an error page.
pub const BODY_SNIFF_CHARS: usize = 200;

/// A source of hourly CSV bodies, one per (station, year).
///
/// `NoaaClient` is the network implementation; tests substitute stubs.
#[allow(async_fn_in_trait)]
pub trait TideSource {
    async fn fetch_csv(&self, request: &TideRequest) -> Result<String>;
}

/// Reject bodies that are HTML or carry an error message instead of CSV.
///
/// The datagetter answers HTTP 200 with a one-line `Error: ...` body for
/// bad stations or empty ranges, so the status alone is not enough.
pub fn check_body(body: &str) -> Result<()> {
    let head: String = body
        .chars()
        .take(BODY_SNIFF_CHARS)
        .collect::<String>()
        .to_lowercase();
    if head.contains("<html") || head.contains("error") {
        let snippet: String = head.trim().chars().take(120).collect();
        return Err(TideError::ErrorPage(snippet));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_body_accepted() {
        let body = "Date Time, Water Level, Sigma, I, L\n2020-06-01 00:00,0.310,0.003,0,0\n";
        assert!(check_body(body).is_ok());
    }

    #[test]
    fn test_html_body_rejected() {
        let body = "<!DOCTYPE html><HTML><body>503 Service Unavailable</body></html>";
        assert!(matches!(check_body(body), Err(TideError::ErrorPage(_))));
    }

    #[test]
    fn test_error_line_rejected() {
        let body = "\n Error: No data was found. This product may not be offered at this station at the requested time.";
        match check_body(body) {
            Err(TideError::ErrorPage(snippet)) => assert!(snippet.starts_with("error: no data")),
            other => panic!("expected ErrorPage, got {other:?}"),
        }
    }

    #[test]
    fn test_only_head_is_sniffed() {
        let mut body = String::from("Date Time, Water Level\n");
        body.push_str(&"2020-06-01 00:00,0.310\n".repeat(20));
        body.push_str("error");
        assert!(check_body(&body).is_ok());
    }
}
