// Logical document paths:
//   users/{userId}/config/jira
//   users/{userId}/testCases/{issueId}

use crate::error::StoreError;

pub const SEPARATOR: char = '/';

/// Reject segments that would change the shape of a path.
pub fn validate_segment(segment: &str) -> Result<&str, StoreError> {
    let reason = if segment.trim().is_empty() {
        Some("must not be empty")
    } else if segment.contains(SEPARATOR) {
        Some("contains `/`")
    } else if segment == "." || segment == ".." {
        Some("is a relative path component")
    } else if segment.chars().any(char::is_control) {
        Some("contains control characters")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(StoreError::InvalidPath { segment: segment.to_string(), reason }),
        None => Ok(segment),
    }
}

pub fn user_root(user_id: &str) -> Result<String, StoreError> {
    Ok(format!("users/{}", validate_segment(user_id)?))
}

pub fn jira_config(user_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}/config/jira", user_root(user_id)?))
}

pub fn test_case_collection(user_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}/testCases", user_root(user_id)?))
}

pub fn test_cases(user_id: &str, issue_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}/{}", test_case_collection(user_id)?, validate_segment(issue_id)?))
}

/// Split a path into `(parent, name)`. A path without a separator has an
/// empty parent.
pub fn split_parent(path: &str) -> (&str, &str) {
    path.rsplit_once(SEPARATOR).unwrap_or(("", path))
}
