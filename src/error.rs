use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Broad categories for errors that leave a command. The category is prefixed to the message so
/// that a user can tell at a glance whether to fix their setup, their credentials or the server.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Missing or invalid configuration, or a bad command-line value.
    Config,
    /// The backend rejected or failed a request.
    Request,
    /// Not logged in, or the session could not be refreshed.
    Auth,
    /// Local file system problems.
    Io,
}

serde_plain::derive_display_from_serialize!(ErrorType);

impl ErrorType {
    /// Tags `e` with this category. An error that already carries a category keeps it, so an
    /// expired session still reads as an auth error after a command tags its fetch as a request.
    pub(crate) fn tag(self, e: impl Into<Error>) -> Error {
        let e = e.into();
        if e.downcast_ref::<Tag>().is_some() {
            e
        } else {
            e.context(Tag(self))
        }
    }
}

/// The context `ErrorType::tag` attaches.
#[derive(Debug, Clone, Copy)]
struct Tag(ErrorType);

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error", self.0)
    }
}

/// Tags the error in a `Result` with an `ErrorType`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Error: From<E>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| error_type.tag(e))
    }
}
