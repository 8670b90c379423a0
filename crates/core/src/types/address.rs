//! Postal address as reported by the payment provider.

use serde::{Deserialize, Serialize};

/// Billing address collected at checkout. Every component is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl PostalAddress {
    /// Maximum length of the stored, joined address.
    pub const MAX_STORED_LENGTH: usize = 256;

    /// Join the present, non-empty components with `", "`.
    ///
    /// Order is line1, line2, city, state, postal code, country. An address
    /// with nothing in it yields an empty string.
    ///
    /// ```
    /// use storedesk_core::PostalAddress;
    ///
    /// let address = PostalAddress {
    ///     line1: Some("1 Main St".into()),
    ///     line2: Some(String::new()),
    ///     city: Some("Springfield".into()),
    ///     country: Some("US".into()),
    ///     ..PostalAddress::default()
    /// };
    /// assert_eq!(address.joined(), "1 Main St, Springfield, US");
    /// ```
    #[must_use]
    pub fn joined(&self) -> String {
        [
            &self.line1,
            &self.line2,
            &self.city,
            &self.state,
            &self.postal_code,
            &self.country,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref().map(str::trim))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// [`joined`](Self::joined), cut to fit the `address` column.
    #[must_use]
    pub fn joined_for_storage(&self) -> String {
        let joined = self.joined();
        if joined.chars().count() <= Self::MAX_STORED_LENGTH {
            return joined;
        }
        joined.chars().take(Self::MAX_STORED_LENGTH).collect()
    }
}
