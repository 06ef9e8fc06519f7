//! Input rules shared by registration, the installer and catalog mutations.

use crate::error::KomikError;

pub const USERNAME_MIN: usize = 3;
pub const USERNAME_MAX: usize = 20;
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 100;

/// Trimmed, lower-cased email.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_ascii_lowercase()
}

pub fn validate_email(email: &str) -> Result<(), KomikError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(KomikError::validation("email must be a valid email address"))
    }
}

pub fn validate_username(username: &str) -> Result<(), KomikError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(KomikError::validation(format!(
            "username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(KomikError::validation(
            "Username can only contain letters, numbers, and underscores",
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), KomikError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN {
        return Err(KomikError::validation(format!(
            "password must be at least {PASSWORD_MIN} characters"
        )));
    }
    if len > PASSWORD_MAX {
        return Err(KomikError::validation(format!(
            "password must be at most {PASSWORD_MAX} characters"
        )));
    }
    Ok(())
}

/// Lower-case ASCII letters, digits and inner dashes.
pub fn validate_slug(slug: &str) -> Result<(), KomikError> {
    let valid = !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(KomikError::validation(
            "slug may only contain lower-case letters, digits and dashes",
        ))
    }
}

pub fn require_non_empty(field: &str, value: Option<&str>) -> Result<(), KomikError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(KomikError::validation(format!("{field} is required"))),
    }
}
