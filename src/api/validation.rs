use crate::api::errors::ApiError;

pub(crate) const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let mut parts = email.split('@');
    let valid = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None)
            if !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
    );
    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Invalid email address".to_string()))
    }
}

pub(crate) fn validate_password_len(password: &str) -> Result<(), ApiError> {
    if password.chars().count() >= MIN_PASSWORD_LEN {
        Ok(())
    } else {
        Err(ApiError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )))
    }
}

/// The correct answer of an mcq question is a single option letter: 'A' for
/// the first option, 'B' for the second, and so on.
pub(crate) fn validate_option_letter(letter: &str, option_count: usize) -> Result<(), ApiError> {
    let index = letter
        .trim()
        .chars()
        .next()
        .filter(|_| letter.trim().chars().count() == 1)
        .map(|ch| ch.to_ascii_uppercase())
        .filter(char::is_ascii_uppercase)
        .map(|ch| (ch as usize) - ('A' as usize));

    match index {
        Some(index) if index < option_count => Ok(()),
        _ => Err(ApiError::BadRequest(
            "Correct answer must be the letter of one of the options".to_string(),
        )),
    }
}
