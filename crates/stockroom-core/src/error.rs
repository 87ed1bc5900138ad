use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    MalformedToken {
        reason: &'static str,
    },
    BadTokenSignature,
    TokenExpired,
    MalformedPasswordHash {
        reason: &'static str,
    },
    UnsupportedHashScheme {
        scheme: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken { reason } => write!(f, "malformed token: {reason}"),
            Self::BadTokenSignature => write!(f, "token signature mismatch"),
            Self::TokenExpired => write!(f, "token expired"),
            Self::MalformedPasswordHash { reason } => {
                write!(f, "malformed password hash: {reason}")
            }
            Self::UnsupportedHashScheme { scheme } => {
                write!(f, "unsupported password hash scheme `{scheme}`")
            }
        }
    }
}

impl std::error::Error for Error {}
