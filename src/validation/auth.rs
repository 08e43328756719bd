use crate::error::{AppError, Result};

/// Validates a username.
pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() || username.len() > 255 {
        return Err(AppError::Validation(
            "Username must be between 1 and 255 characters".to_string(),
        ));
    }

    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AppError::Validation(
            "Username can only contain letters, numbers, underscores, and hyphens".to_string(),
        ));
    }

    Ok(())
}

/// Validates a password for the setup flow.
pub fn validate_password(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    if password.len() > 100 {
        return Err(AppError::Validation(
            "Password is too long".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_bounds_and_charset() {
        assert!(validate_username("admin").is_ok());
        assert!(validate_username("user_1-a").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username(&"a".repeat(256)).is_err());
        assert!(validate_username("admin; DROP TABLE settings").is_err());
    }

    #[test]
    fn password_length_bounds() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password(&"p".repeat(100)).is_ok());
        assert!(validate_password(&"p".repeat(101)).is_err());
    }
}
