use core::fmt;
use std::borrow::Cow;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

/// An error that can occur during the conversion process.
pub struct Error(Box<Repr>);

enum Repr {
    /// Just a message.
    Msg(Cow<'static, str>),
    /// An I/O failure tied to a concrete path.
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    /// An I/O error carrying the path it happened on.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Error(Box::new(Repr::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.deref() {
            Repr::Msg(s) => write!(f, "{s}"),
            Repr::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error(Box::new(Repr::Msg(e.to_string().into())))
    }
}

impl From<fmt::Error> for Error {
    fn from(e: fmt::Error) -> Self {
        Error(Box::new(Repr::Msg(e.to_string().into())))
    }
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Error(Box::new(Repr::Msg(s.into())))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error(Box::new(Repr::Msg(s.into())))
    }
}

impl From<Cow<'static, str>> for Error {
    fn from(s: Cow<'static, str>) -> Self {
        Error(Box::new(Repr::Msg(s)))
    }
}
