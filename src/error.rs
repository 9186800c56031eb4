use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    NotAuthenticated,
    InvalidCredentials(String),
    UnsupportedModel(String),
    Translation(String),
    VendorStatus(String),
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::NotAuthenticated => write!(f, "not authenticated"),
            Error::InvalidCredentials(user) => write!(f, "invalid credentials for user: {user}"),
            Error::UnsupportedModel(model) => write!(f, "unsupported model: {model}"),
            Error::Translation(msg) => write!(f, "translation error: {msg}"),
            Error::VendorStatus(status) => write!(f, "vendor reported status: {status}"),
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
