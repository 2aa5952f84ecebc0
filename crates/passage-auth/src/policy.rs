//! Username and password rules applied at registration.

use std::collections::BTreeMap;

use validator::ValidateEmail;

use passage_core::error::AppError;
use passage_core::result::AppResult;

/// Minimum username length after normalization.
pub const USERNAME_MIN: usize = 3;
/// Maximum username length after normalization.
pub const USERNAME_MAX: usize = 20;
/// Minimum password length.
pub const PASSWORD_MIN: usize = 8;

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Names nobody may register.
const RESERVED_USERNAMES: &[&str] = &[
    "admin",
    "administrator",
    "support",
    "system",
    "root",
    "music",
    "mod",
    "moderator",
    "staff",
    "owner",
    "help",
    "security",
    "official",
];

/// Whether a normalized username passes the naming policy.
pub fn is_username_allowed(username: &str) -> bool {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return false;
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_@!$".contains(c))
    {
        return false;
    }
    if username.starts_with('_') || username.ends_with('_') {
        return false;
    }
    !RESERVED_USERNAMES.contains(&username)
}

/// Every rule the password breaks, empty when it is acceptable.
pub fn password_issues(password: &str) -> Vec<&'static str> {
    let mut issues = Vec::new();
    if password.chars().count() < PASSWORD_MIN {
        issues.push("Password must be at least 8 characters");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        issues.push("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        issues.push("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Password must contain a digit");
    }
    if !password.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        issues.push("Password must contain one of @$!%*?&");
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
    {
        issues.push("Password may only contain letters, digits, and @$!%*?&");
    }
    issues
}

/// Check a registration's normalized email, normalized username, and password.
///
/// Fails with a validation error whose details map each field to its issues.
pub fn validate_registration(email: &str, username: &str, password: &str) -> AppResult<()> {
    let mut issues: BTreeMap<&str, Vec<&str>> = BTreeMap::new();

    if !email.validate_email() {
        issues.entry("email").or_default().push("Invalid email address");
    }
    if username.chars().count() < USERNAME_MIN {
        issues
            .entry("username")
            .or_default()
            .push("Username must be at least 3 characters");
    } else if !is_username_allowed(username) {
        issues.entry("username").or_default().push("Username not available");
    }
    let password_problems = password_issues(password);
    if !password_problems.is_empty() {
        issues.insert("password", password_problems);
    }

    if issues.is_empty() {
        return Ok(());
    }
    Err(AppError::validation("Validation failed").with_details(serde_json::json!(issues)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_policy() {
        assert!(is_username_allowed("alice"));
        assert!(is_username_allowed("a_b@c!$"));
        assert!(!is_username_allowed("ab"));
        assert!(!is_username_allowed("abcdefghijklmnopqrstu"));
        assert!(!is_username_allowed("_alice"));
        assert!(!is_username_allowed("alice_"));
        assert!(!is_username_allowed("al ice"));
        assert!(!is_username_allowed("Alice"));
        assert!(!is_username_allowed("admin"));
    }

    #[test]
    fn test_password_policy() {
        assert!(password_issues("Str0ng!Pass").is_empty());
        assert!(!password_issues("short1!").is_empty());
        assert!(!password_issues("alllower1!").is_empty());
        assert!(!password_issues("NoDigits!!").is_empty());
        assert!(!password_issues("NoSymbol11").is_empty());
        assert!(!password_issues("Bad#Symbol1!").is_empty());
    }

    #[test]
    fn test_validation_details_are_per_field() {
        let err = validate_registration("not-an-email", "admin", "weak").unwrap_err();
        let details = err.details.unwrap();
        assert_eq!(details["email"][0], "Invalid email address");
        assert_eq!(details["username"][0], "Username not available");
        assert!(details["password"].as_array().unwrap().len() >= 3);
    }

    #[test]
    fn test_valid_registration_passes() {
        assert!(validate_registration("a@x.com", "alice", "Str0ng!Pass").is_ok());
    }
}
