use super::*;

fn errors() -> Vec<StandardizedError> {
    vec![
        StandardizedError::new("SERVER_ERROR").with_display_name("Server error"),
        StandardizedError::new("NOT_FOUND").with_display_name("Entity not found"),
        StandardizedError::new("TIMEOUT"),
    ]
}

fn names(errors: &[StandardizedError]) -> Vec<&str> {
    errors.iter().map(|e| e.name.as_str()).collect()
}

#[test]
fn blank_query_keeps_all_sorted_by_label() {
    let all = filter_errors(&errors(), "   ");
    assert_eq!(names(&all), ["NOT_FOUND", "SERVER_ERROR", "TIMEOUT"]);
}

#[test]
fn matches_name_ignoring_case() {
    assert_eq!(names(&filter_errors(&errors(), "time")), ["TIMEOUT"]);
}

#[test]
fn matches_display_name() {
    assert_eq!(names(&filter_errors(&errors(), "entity")), ["NOT_FOUND"]);
}

#[test]
fn no_match_is_empty() {
    assert!(filter_errors(&errors(), "teapot").is_empty());
}
