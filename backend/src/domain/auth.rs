//! Authentication primitives such as login credentials and registrations.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use zeroize::Zeroizing;

/// Minimum password length accepted at login and registration.
pub const PASSWORD_MIN: usize = 6;
/// Minimum name length accepted at registration.
pub const NAME_MIN: usize = 3;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^\S+@\S+\.\S+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Name was missing or shorter than [`NAME_MIN`] once trimmed.
    ShortName,
    /// Email did not look like `local@domain.tld`.
    InvalidEmail,
    /// Password was shorter than [`PASSWORD_MIN`].
    ShortPassword,
}

impl CredentialValidationError {
    /// Field the error refers to.
    pub fn field(self) -> &'static str {
        match self {
            Self::ShortName => "name",
            Self::InvalidEmail => "email",
            Self::ShortPassword => "password",
        }
    }
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShortName => write!(f, "Name must be at least {NAME_MIN} characters long"),
            Self::InvalidEmail => write!(f, "Invalid email format"),
            Self::ShortPassword => {
                write!(f, "Password must be at least {PASSWORD_MIN} characters long")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

fn validate_email(email: &str) -> Result<String, CredentialValidationError> {
    let email = email.trim();
    if email_regex().is_match(email) {
        Ok(email.to_owned())
    } else {
        Err(CredentialValidationError::InvalidEmail)
    }
}

fn validate_password(password: &str) -> Result<Zeroizing<String>, CredentialValidationError> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(CredentialValidationError::ShortPassword);
    }
    Ok(Zeroizing::new(password.to_owned()))
}

/// Validated login credentials used by the authentication service.
///
/// ## Invariants
/// - `email` is trimmed and matches `^\S+@\S+\.\S+$`.
/// - `password` has at least [`PASSWORD_MIN`] characters and keeps
///   caller-provided whitespace.
///
/// # Examples
/// ```
/// use glucose_backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("nurse@clinic.id", "secret1").unwrap();
/// assert_eq!(creds.email(), "nurse@clinic.id");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        Ok(Self {
            email: validate_email(email)?,
            password: validate_password(password)?,
        })
    }

    /// Email used for the user lookup.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Password provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Validated self-registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    name: String,
    credentials: LoginCredentials,
}

impl Registration {
    /// Validate name, then email, then password.
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        let name = name.trim();
        if name.chars().count() < NAME_MIN {
            return Err(CredentialValidationError::ShortName);
        }
        Ok(Self {
            name: name.to_owned(),
            credentials: LoginCredentials::try_from_parts(email, password)?,
        })
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn email(&self) -> &str {
        self.credentials.email()
    }

    pub fn password(&self) -> &str {
        self.credentials.password()
    }
}
