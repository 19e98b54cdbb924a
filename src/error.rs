use std::error;
use std::fmt::{self, Display, Formatter};
use std::io;

#[derive(Debug)]
pub struct Error {
    description: String,

    pub kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    Io,
    Http,
    Config,
    Sts,
    PasswordStore,
    AuthenticationFailed,
    MalformedAssertion,
    NoRolesAvailable,
    RoleNotFound {
        requested: String,
        available: Vec<String>,
    },
    MalformedArn,
    InvalidSelection {
        index: usize,
        len: usize,
    },
    SelectionRequired {
        available: Vec<String>,
    },
}

impl Error {
    pub fn new(kind: ErrorKind, message: &str) -> Self {
        Error {
            description: message.into(),
            kind,
        }
    }

    pub fn authentication_failed(status: u16) -> Self {
        Error::new(
            ErrorKind::AuthenticationFailed,
            &format!("Authentication failed! The identity provider answered with HTTP {}", status),
        )
    }

    pub fn malformed_assertion(message: &str) -> Self {
        Error::new(
            ErrorKind::MalformedAssertion,
            &format!("Malformed SAML assertion: {}", message),
        )
    }

    pub fn malformed_arn(arn: &str, reason: &str) -> Self {
        Error::new(
            ErrorKind::MalformedArn,
            &format!("Malformed ARN {:?}: {}", arn, reason),
        )
    }

    pub fn role_not_found(requested: &str, available: Vec<String>) -> Self {
        Error::new(
            ErrorKind::RoleNotFound {
                requested: requested.into(),
                available,
            },
            &format!("No such role found: {}", requested),
        )
    }

    pub fn invalid_selection(index: usize, len: usize) -> Self {
        Error::new(
            ErrorKind::InvalidSelection { index, len },
            &format!(
                "You selected an invalid role index ({}), please pick one between 0 and {}",
                index,
                len.saturating_sub(1)
            ),
        )
    }

    /// Role ARNs the caller may present after a failed resolution.
    pub fn available_roles(&self) -> Option<&[String]> {
        match self.kind {
            ErrorKind::RoleNotFound { ref available, .. }
            | ErrorKind::SelectionRequired { ref available } => Some(available),
            _ => None,
        }
    }
}

impl error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.description)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::new(ErrorKind::Io, &e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::new(ErrorKind::Http, &e.to_string())
    }
}

impl From<ini::Error> for Error {
    fn from(e: ini::Error) -> Self {
        Error::new(ErrorKind::Io, &e.to_string())
    }
}

impl From<keyring::Error> for Error {
    fn from(e: keyring::Error) -> Self {
        Error::new(ErrorKind::PasswordStore, &e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
