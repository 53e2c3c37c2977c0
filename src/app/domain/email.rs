use validator::ValidationError;

/// Recipient email address. Once constructed it is trimmed, lowercase and at
/// most 256 characters, so two addresses differing only in case compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

/// Column width of `recipients.email`.
pub const MAX_EMAIL_LEN: usize = 256;

impl Email {
    /// Normalize and validate a raw address from an upload or a request body.
    pub fn new(email: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized = email.as_ref().trim().to_lowercase();

        if normalized.chars().count() > MAX_EMAIL_LEN {
            let mut error = ValidationError::new("email_too_long");
            error.message = Some("Email address is too long".into());
            return Err(error);
        }

        let valid = match normalized.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.contains('@')
                    && domain.contains('.')
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !normalized.contains(char::is_whitespace)
            }
            None => false,
        };

        if valid {
            Ok(Self(normalized))
        } else {
            let mut error = ValidationError::new("invalid_email");
            error.message = Some("Invalid email address format".into());
            Err(error)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
