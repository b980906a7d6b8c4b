use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// A wrapper for sensitive customer data (email, phone) that masks its value
/// in Debug/Display output while still serializing the real value.
#[derive(Clone, Deserialize, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T: fmt::Display> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: fmt::Display> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // API responses and emails need the real value; the wrapper exists to
        // prevent accidental leakage through log macros like
        // tracing::info!("{:?}", request).
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl Masked<String> {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}
