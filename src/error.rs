use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// A single flow element cannot fit on any page.
    LayoutOverflow {
        node: &'static str,
        detail: String,
    },
    Font(String),
    Backend(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::LayoutOverflow { node, detail } => {
                write!(f, "layout overflow in {node}: {detail}")
            }
            Error::Font(msg) => write!(f, "font error: {msg}"),
            Error::Backend(msg) => write!(f, "backend error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
