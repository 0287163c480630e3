//! Raw SQL fragments.

use std::fmt;

/// A raw SQL fragment inserted into compiled SQL verbatim, never escaped.
///
/// Use this for engine expressions the quoter must not touch, such as
/// `COUNT(*)` or `NOW()`. Never build an `Expr` from untrusted input; that
/// is exactly the injection hole the rest of the crate exists to close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr(String);

impl Expr {
    /// Creates a raw fragment.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// The fragment text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Expr {
    fn from(sql: &str) -> Self {
        Self::new(sql)
    }
}

impl From<String> for Expr {
    fn from(sql: String) -> Self {
        Self::new(sql)
    }
}
