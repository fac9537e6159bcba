use thiserror::Error;

/// Client-side form validation failures. Raised before any network call
/// and shown inline next to the offending form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a username and password.")]
    MissingCredentials,

    #[error("All fields are required.")]
    MissingFields,

    #[error("Password must be at least {0} characters.")]
    PasswordTooShort(usize),

    #[error("Passwords do not match.")]
    PasswordMismatch,
}

/// Minimum accepted password length at registration.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validates the login form. Returns the trimmed username.
pub fn validate_login<'a>(username: &'a str, password: &str) -> Result<&'a str, ValidationError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials);
    }
    Ok(username)
}

/// Validates the register form. Returns the trimmed username.
pub fn validate_registration<'a>(
    username: &'a str,
    password: &str,
    confirm: &str,
) -> Result<&'a str, ValidationError> {
    let username = username.trim();
    if username.is_empty() || password.is_empty() || confirm.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(username)
}
