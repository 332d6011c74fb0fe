//! Login form and credential validation.

use crate::{KeyInput, LoginError, LoginPrefill};

/// Validated login credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Trimmed username.
    pub username: String,
    /// Password as entered.
    pub password: String,
    /// Normalized homeserver URL (`https://` added when no scheme was given).
    pub homeserver: String,
}

/// Validate and normalize login input.
///
/// # Errors
///
/// - [`LoginError::MissingUsername`] if the trimmed username is empty
/// - [`LoginError::MissingPassword`] if the password is empty
/// - [`LoginError::InvalidHomeserver`] if the homeserver has a scheme other
///   than http(s), a missing or malformed host (bad port included) or
///   whitespace inside
pub fn validate_login_credentials(
    username: &str,
    password: &str,
    homeserver: &str,
) -> Result<Credentials, LoginError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(LoginError::MissingUsername);
    }
    if password.is_empty() {
        return Err(LoginError::MissingPassword);
    }

    Ok(Credentials {
        username: username.to_string(),
        password: password.to_string(),
        homeserver: normalize_homeserver(homeserver)?,
    })
}

fn normalize_homeserver(input: &str) -> Result<String, LoginError> {
    let invalid = || LoginError::InvalidHomeserver(input.to_string());
    let trimmed = input.trim();

    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) => (scheme.to_ascii_lowercase(), rest),
        None => ("https".to_string(), trimmed),
    };
    if scheme != "https" && scheme != "http" {
        return Err(invalid());
    }

    let rest = rest.trim_end_matches('/');
    let host = rest.split('/').next().unwrap_or_default();
    if !is_valid_host(host) || rest.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    Ok(format!("{scheme}://{rest}"))
}

/// `name` or `name:port`, where a bracketed IPv6 literal counts as a name.
fn is_valid_host(host: &str) -> bool {
    let port = match host.strip_prefix('[') {
        Some(literal) => match literal.split_once(']') {
            Some((address, port)) if !address.is_empty() => {
                if port.is_empty() {
                    return true;
                }
                port.strip_prefix(':')
            },
            _ => return false,
        },
        None => match host.split_once(':') {
            Some((name, port)) if !name.is_empty() => Some(port),
            Some(_) => return false,
            None => return !host.is_empty(),
        },
    };
    port.is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

/// Field of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    /// Username
    #[default]
    Username,
    /// Password
    Password,
    /// Homeserver URL
    Homeserver,
}

impl LoginField {
    fn next(self) -> Self {
        match self {
            Self::Username => Self::Password,
            Self::Password => Self::Homeserver,
            Self::Homeserver => Self::Username,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::Username => Self::Homeserver,
            Self::Password => Self::Username,
            Self::Homeserver => Self::Password,
        }
    }
}

/// What a key press on the login form led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Form changed (or not); nothing else to do.
    Edited,
    /// Input validated; log in with these credentials.
    Submit(Credentials),
}

/// State of the login screen.
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    username: String,
    password: String,
    homeserver: String,
    focus: LoginField,
    error: Option<String>,
    pending: bool,
}

impl LoginForm {
    /// Form prefilled from settings.
    pub fn new(prefill: &LoginPrefill) -> Self {
        Self {
            username: prefill.username.clone().unwrap_or_default(),
            password: prefill.password.clone().unwrap_or_default(),
            homeserver: prefill.homeserver.clone().unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Handle a key press.
    pub fn handle_key(&mut self, key: KeyInput) -> LoginOutcome {
        match key {
            KeyInput::Char(c) => self.field_mut().push(c),
            KeyInput::Backspace => {
                self.field_mut().pop();
            },
            KeyInput::Tab | KeyInput::Down => self.focus = self.focus.next(),
            KeyInput::BackTab | KeyInput::Up => self.focus = self.focus.previous(),
            KeyInput::Enter => return self.submit(),
            _ => {},
        }
        LoginOutcome::Edited
    }

    /// Validate the form.
    ///
    /// Clears the previous error. On success the normalized username and
    /// homeserver are written back (the password is left as typed) and the
    /// form waits for the login result.
    pub fn submit(&mut self) -> LoginOutcome {
        self.error = None;
        if self.pending {
            return LoginOutcome::Edited;
        }

        match validate_login_credentials(&self.username, &self.password, &self.homeserver) {
            Ok(credentials) => {
                self.username.clone_from(&credentials.username);
                self.homeserver.clone_from(&credentials.homeserver);
                self.pending = true;
                LoginOutcome::Submit(credentials)
            },
            Err(error) => {
                self.show_error(&error);
                LoginOutcome::Edited
            },
        }
    }

    /// Show a login failure under the form.
    pub fn show_error(&mut self, error: &LoginError) {
        tracing::debug!(%error, "login failed");
        self.pending = false;
        self.error = Some(error.user_message());
    }

    /// Login finished successfully.
    pub fn finish(&mut self) {
        self.pending = false;
        self.error = None;
    }

    fn field_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
            LoginField::Homeserver => &mut self.homeserver,
        }
    }

    /// Username as typed.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Password as typed.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Homeserver as typed.
    pub fn homeserver(&self) -> &str {
        &self.homeserver
    }

    /// Focused field.
    pub fn focus(&self) -> LoginField {
        self.focus
    }

    /// Error text, if the last attempt failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a login request is in flight.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
