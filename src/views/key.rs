//! Composite template keys: `entry[:fragment[:fragment...]]`.

use std::fmt;

use super::ViewError;

pub const KEY_DELIMITER: char = ':';

/// Ordered list of template identifiers. The first one is the entry point.
///
/// Order is significant and never normalized: `layout:page` and `page:layout`
/// are different views.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompositeKey {
    raw: String,
    identifiers: Vec<String>,
}

impl CompositeKey {
    /// Split and validate a raw key.
    ///
    /// # Errors
    /// Returns [`ViewError::EmptyKey`] for an empty key and
    /// [`ViewError::InvalidIdentifier`] when an identifier is empty or could
    /// escape the template directory.
    pub fn parse(raw: &str) -> Result<Self, ViewError> {
        if raw.is_empty() {
            return Err(ViewError::EmptyKey);
        }

        let identifiers = raw
            .split(KEY_DELIMITER)
            .map(|identifier| {
                if valid_identifier(identifier) {
                    Ok(identifier.to_string())
                } else {
                    Err(ViewError::InvalidIdentifier {
                        key: raw.to_string(),
                        identifier: identifier.to_string(),
                    })
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            identifiers,
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    #[must_use]
    pub fn entry(&self) -> &str {
        // parse guarantees at least one identifier
        &self.identifiers[0]
    }

    /// Auxiliary fragments, in key order.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.identifiers[1..]
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn valid_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && !identifier.starts_with('.')
        && !identifier.contains(['/', '\\'])
}
