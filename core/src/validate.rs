//! Form validation rules for registration, login, and todo input.
//!
//! These are the application's static validation rules, checked before a
//! form ever reaches the platform. Messages are the exact strings the forms
//! display. Length limits count characters, not bytes, so accented input
//! is measured the way users read it.

/// A single failed rule, attached to the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: &str) -> Self {
        Self {
            field,
            message: message.to_string(),
        }
    }
}

/// Registration form: name, email, password, and confirmation.
pub fn validate_registration(
    full_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let name_len = full_name.chars().count();
    if name_len < 2 {
        errors.push(FieldError::new(
            "full_name",
            "Le nom complet doit contenir au moins 2 caractères",
        ));
    } else if name_len > 100 {
        errors.push(FieldError::new(
            "full_name",
            "Le nom complet ne peut pas dépasser 100 caractères",
        ));
    }

    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Adresse email invalide"));
    }

    let password_len = password.chars().count();
    if password_len < 8 {
        errors.push(FieldError::new(
            "password",
            "Le mot de passe doit contenir au moins 8 caractères",
        ));
    } else if password_len > 72 {
        errors.push(FieldError::new(
            "password",
            "Le mot de passe ne peut pas dépasser 72 caractères",
        ));
    }

    if password != confirm_password {
        errors.push(FieldError::new(
            "confirm_password",
            "Les mots de passe ne correspondent pas",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Login form: email and a non-empty password.
pub fn validate_login(email: &str, password: &str) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Adresse email invalide"));
    }

    if password.is_empty() {
        errors.push(FieldError::new("password", "Le mot de passe est requis"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Todo form: required bounded title, optional bounded description. The
/// status field is an enum and cannot hold an invalid value.
pub fn validate_todo(title: &str, description: Option<&str>) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    let title_len = title.chars().count();
    if title_len < 1 {
        errors.push(FieldError::new("title", "Le titre est requis"));
    } else if title_len > 200 {
        errors.push(FieldError::new(
            "title",
            "Le titre ne peut pas dépasser 200 caractères",
        ));
    }

    if let Some(description) = description {
        if description.chars().count() > 1000 {
            errors.push(FieldError::new(
                "description",
                "La description ne peut pas dépasser 1000 caractères",
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Minimal structural email check: one `@`, non-empty local part, and a
/// dotted domain.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return false;
    }
    match domain.split_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty() && !tail.ends_with('.'),
        None => false,
    }
}
