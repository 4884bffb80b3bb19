//! Localized text lookup.

use anyhow::{Context, Result};
use std::{collections::HashMap, fs, path::Path};
use tracing::debug;

/// Source of localized messages.
pub trait Localizer: Send + Sync {
    /// Resolve `key`, substituting `{0}`, `{1}`, ... with `args`.
    fn text(&self, key: &str, args: &[&str]) -> String;
}

/// Flat key/message catalog loaded from a JSON object.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    messages: HashMap<String, String>,
}

impl Catalog {
    #[must_use]
    pub fn new(messages: HashMap<String, String>) -> Self {
        Self { messages }
    }

    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    /// Returns an error if the text is not a JSON object of strings.
    pub fn from_json(json: &str) -> Result<Self> {
        let messages: HashMap<String, String> =
            serde_json::from_str(json).context("Invalid i18n catalog")?;
        Ok(Self { messages })
    }

    /// Load a catalog file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read i18n catalog: {}", path.display()))?;
        let catalog = Self::from_json(&json)?;
        debug!("Loaded {} i18n messages from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Localizer for Catalog {
    fn text(&self, key: &str, args: &[&str]) -> String {
        let Some(message) = self.messages.get(key) else {
            return key.to_string();
        };
        args.iter()
            .enumerate()
            .fold(message.clone(), |text, (index, arg)| {
                text.replace(&format!("{{{index}}}"), arg)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn catalog() -> Catalog {
        Catalog::new(HashMap::from([
            (
                "error_user_not_found".to_string(),
                "User [{0}] not found".to_string(),
            ),
            ("pair".to_string(), "{1} then {0}, {0} again".to_string()),
        ]))
    }

    #[test]
    fn text_substitutes_positional_args() {
        let catalog = catalog();
        assert_eq!(
            catalog.text("error_user_not_found", &["admin"]),
            "User [admin] not found"
        );
        assert_eq!(catalog.text("pair", &["a", "b"]), "b then a, a again");
    }

    #[test]
    fn text_leaves_unused_placeholders() {
        assert_eq!(catalog().text("error_user_not_found", &[]), "User [{0}] not found");
    }

    #[test]
    fn text_falls_back_to_key() {
        assert_eq!(catalog().text("missing_key", &["x"]), "missing_key");
    }

    #[test]
    fn from_json_rejects_non_string_values() {
        assert!(Catalog::from_json(r#"{"a": 1}"#).is_err());
        assert!(Catalog::from_json("[]").is_err());
    }

    #[test]
    fn load_reads_file() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        write!(file, r#"{{"login_failed": "Login failed"}}"#)?;

        let catalog = Catalog::load(file.path())?;
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.text("login_failed", &[]), "Login failed");
        Ok(())
    }

    #[test]
    fn load_missing_file_is_error() {
        let result = Catalog::load(Path::new("/nonexistent/i18n.json"));
        assert!(result.is_err());
    }

    #[test]
    fn shipped_catalog_has_login_messages() -> Result<()> {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/i18n_cpanel.json");
        let catalog = Catalog::load(&path)?;
        for key in [
            "error_form_400",
            "error_db_001",
            "error_user_not_found",
            "error_login_failed",
            "login_successful",
        ] {
            assert_ne!(catalog.text(key, &[]), key, "missing message for {key}");
        }
        Ok(())
    }
}
