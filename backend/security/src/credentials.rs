use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").unwrap()
});

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("Please enter a valid email")]
    InvalidEmail,
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    PasswordTooShort,
}

/// Emails are stored trimmed and lowercased.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), CredentialError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(CredentialError::InvalidEmail)
    }
}

pub fn validate_password(password: &str) -> Result<(), CredentialError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(CredentialError::PasswordTooShort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(validate_email("joe@diner.com").is_ok());
        assert!(validate_email("joe.smith-jr@mail.diner.io").is_ok());
        assert_eq!(validate_email("joe@diner"), Err(CredentialError::InvalidEmail));
        assert_eq!(validate_email("not an email"), Err(CredentialError::InvalidEmail));
    }

    #[test]
    fn normalizes_before_validation() {
        let email = normalize_email("  Joe@Diner.COM ");
        assert_eq!(email, "joe@diner.com");
        assert!(validate_email(&email).is_ok());
    }

    #[test]
    fn password_minimum_length() {
        assert_eq!(validate_password("12345"), Err(CredentialError::PasswordTooShort));
        assert!(validate_password("123456").is_ok());
        assert_eq!(
            CredentialError::PasswordTooShort.to_string(),
            "Password must be at least 6 characters"
        );
    }
}
