#[cfg(feature = "stl-io")]
mod stl;

/// Generic I/O and format‑conversion errors.
///
/// Format conversions live behind cargo feature‑flags.
/// When a feature is disabled the corresponding conversions are absent and
/// only the `Soup` variant can be constructed in user code.
#[derive(Debug)]
pub enum IoError {
    StdIo(std::io::Error),

    /// Error bubbled up from soup construction while importing.
    Soup(crate::errors::SoupError),
}

impl std::fmt::Display for IoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use IoError::*;

        match self {
            StdIo(error) => write!(f, "std::io::Error: {error}"),
            Soup(error) => write!(f, "Soup construction failed: {error}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<std::io::Error> for IoError {
    fn from(value: std::io::Error) -> Self {
        Self::StdIo(value)
    }
}

impl From<crate::errors::SoupError> for IoError {
    fn from(value: crate::errors::SoupError) -> Self {
        Self::Soup(value)
    }
}
