use std::fmt;
use std::hash::{Hash, Hasher};

/// Table identifier of class tokens
pub const TABLE_CLASS: u8 = 0x02;
/// Table identifier of field tokens
pub const TABLE_FIELD: u8 = 0x04;
/// Table identifier of method tokens
pub const TABLE_METHOD: u8 = 0x06;

/// A stable handle into the metadata arena owned by the class registry.
///
/// Tokens consist of a 32-bit value where:
/// - The high byte (bits 24-31) indicates the table (class, field or method)
/// - The low 24 bits (bits 0-23) indicate the row within that table
///
/// Tokens never get reused while the registry is alive, so they can be used as identity of the
/// member or class they point to.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token(pub u32);

impl Token {
    /// Creates a new token from a raw 32-bit value
    #[must_use]
    pub fn new(value: u32) -> Self {
        Token(value)
    }

    /// Creates a token from a table identifier and a row
    #[must_use]
    pub fn from_parts(table: u8, row: u32) -> Self {
        Token((u32::from(table) << 24) | (row & 0x00FF_FFFF))
    }

    /// Returns the raw token value
    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Extracts the table type from the token (high byte)
    #[must_use]
    pub fn table(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Extracts the row index from the token (low 24 bits)
    #[must_use]
    pub fn row(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Returns true if this is a null token (value 0)
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this token points into the class table
    #[must_use]
    pub fn is_class(&self) -> bool {
        self.table() == TABLE_CLASS
    }

    /// Returns true if this token points into the method table
    #[must_use]
    pub fn is_method(&self) -> bool {
        self.table() == TABLE_METHOD
    }

    /// Returns true if this token points into the field table
    #[must_use]
    pub fn is_field(&self) -> bool {
        self.table() == TABLE_FIELD
    }
}

impl From<u32> for Token {
    fn from(value: u32) -> Self {
        Token(value)
    }
}

impl From<Token> for u32 {
    fn from(token: Token) -> Self {
        token.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Token(0x{:08x}, table: 0x{:02x}, row: {})",
            self.0,
            self.table(),
            self.row()
        )
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

impl Hash for Token {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}
