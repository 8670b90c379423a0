//! Typed request validation.
//!
//! Entry points deserialize a loosely-typed body (every field optional) and
//! then convert it into a command with a `validate()` method returning
//! [`Validated<T>`]. Field checks accumulate into [`ValidationErrors`] so a
//! client sees every problem in one response.
//!
//! ```
//! use storedesk_core::validation::{ValidationErrors, Validated};
//!
//! struct NewSize { name: String, value: String }
//!
//! fn validate(name: Option<&str>, value: Option<&str>) -> Validated<NewSize> {
//!     let mut errors = ValidationErrors::new();
//!     let name = errors.required_text("name", name, 64);
//!     let value = errors.required_text("value", value, 64);
//!     errors.finish(|| NewSize { name: name.unwrap_or_default(), value: value.unwrap_or_default() })
//! }
//!
//! assert!(validate(Some("Large"), Some("L")).is_ok());
//! let err = validate(None, Some("")).err().unwrap();
//! assert_eq!(err.len(), 2);
//! ```

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::Serialize;
use url::Url;

use crate::types::price::Price;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Accumulated field errors. Only ever returned to callers when non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

/// Outcome of validating a raw request into a typed command.
pub type Validated<T> = Result<T, ValidationErrors>;

impl ValidationErrors {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Build an error list holding one failure.
    #[must_use]
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether any recorded error concerns `field`.
    #[must_use]
    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// Produce the command if no check failed.
    ///
    /// The closure only runs on success, so it may rely on every
    /// `Option` returned by the builders being `Some`.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one check failed.
    pub fn finish<T>(self, build: impl FnOnce() -> T) -> Validated<T> {
        if self.0.is_empty() {
            Ok(build())
        } else {
            Err(self)
        }
    }

    /// A trimmed, non-empty string of at most `max_chars` characters.
    pub fn required_text(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_chars: usize,
    ) -> Option<String> {
        let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.add(field, "is required");
            return None;
        };
        self.max_len(field, value, max_chars)
    }

    /// Like [`required_text`](Self::required_text) but absence is fine.
    pub fn optional_text(
        &mut self,
        field: &str,
        value: Option<&str>,
        max_chars: usize,
    ) -> Option<String> {
        let value = value.map(str::trim).filter(|v| !v.is_empty())?;
        self.max_len(field, value, max_chars)
    }

    /// Enforce a character-count ceiling.
    pub fn max_len(&mut self, field: &str, value: &str, max_chars: usize) -> Option<String> {
        if value.chars().count() > max_chars {
            self.add(field, format!("must be at most {max_chars} characters"));
            return None;
        }
        Some(value.to_owned())
    }

    /// A required absolute URL.
    pub fn url(&mut self, field: &str, value: Option<&str>) -> Option<Url> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.add(field, "is required");
            return None;
        };
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            Ok(_) => {
                self.add(field, "must be an http(s) URL");
                None
            }
            Err(_) => {
                self.add(field, "must be a valid URL");
                None
            }
        }
    }

    /// A required identifier that parses as `T` (one of the UUID newtypes).
    pub fn uuid<T: FromStr>(&mut self, field: &str, value: Option<&str>) -> Option<T> {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            self.add(field, "is required");
            return None;
        };
        raw.parse().map_or_else(
            |_| {
                self.add(field, "must be a valid UUID");
                None
            },
            Some,
        )
    }

    /// A CSS hex colour such as `#fff` or `#00ff88`.
    pub fn hex_colour(&mut self, field: &str, value: Option<&str>) -> Option<String> {
        let value = self.required_text(field, value, 7)?;
        let digits = value.strip_prefix('#');
        let valid = digits.is_some_and(|d| {
            (d.len() == 3 || d.len() == 6) && d.chars().all(|c| c.is_ascii_hexdigit())
        });
        if !valid {
            self.add(field, "must be a hex colour like #1a2b3c");
            return None;
        }
        Some(value)
    }

    /// A required price greater than zero with at most two decimals.
    pub fn positive_price(&mut self, field: &str, value: Option<Decimal>) -> Option<Price> {
        let Some(amount) = value else {
            self.add(field, "is required");
            return None;
        };
        match Price::new(amount) {
            Ok(price) => Some(price),
            Err(e) => {
                self.add(field, e.to_string());
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}
