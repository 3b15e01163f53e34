//! Utility functions for endpoint paths and dates

/// Resolve an endpoint against the API base. Absolute URLs pass through.
pub fn resolve_endpoint(api_base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }

    let base = api_base.trim_end_matches('/');
    if endpoint.starts_with('/') {
        format!("{}{}", base, endpoint)
    } else {
        format!("{}/{}", base, endpoint)
    }
}

/// Today's calendar date (UTC) as `YYYY-MM-DD`
pub fn today() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

/// Validate a `YYYY-MM-DD` date argument
pub fn is_valid_date(date: &str) -> bool {
    chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_endpoint() {
        assert_eq!(
            resolve_endpoint("https://connectapi.garmin.com", "/usersummary-service/x"),
            "https://connectapi.garmin.com/usersummary-service/x"
        );
        assert_eq!(
            resolve_endpoint("https://connectapi.garmin.com/", "device-service/y"),
            "https://connectapi.garmin.com/device-service/y"
        );
    }

    #[test]
    fn test_resolve_absolute_endpoint() {
        let url = "https://example.com/anything?q=1";
        assert_eq!(resolve_endpoint("https://connectapi.garmin.com", url), url);
    }

    #[test]
    fn test_today_format() {
        let day = today();
        assert_eq!(day.len(), 10);
        assert!(is_valid_date(&day));
    }

    #[test]
    fn test_date_validation() {
        assert!(is_valid_date("2024-02-29"));
        assert!(!is_valid_date("2023-02-29"));
        assert!(!is_valid_date("yesterday"));
    }
}
