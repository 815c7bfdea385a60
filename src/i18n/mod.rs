//! Internationalization (i18n) support
//!
//! Ships `pt-BR` and `en` tables for month names and the few UI strings the
//! pages carry. A site may override or extend them with
//! `languages/<lang>.yml` (or `.json`) files.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PT_BR_MONTHS_SHORT: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];
const PT_BR_MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];
const EN_MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const EN_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Internationalization handler
#[derive(Debug, Clone)]
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, serde_yaml::Value>>,
}

impl I18n {
    /// Create a handler with the built-in tables loaded
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        translations.insert(
            "pt-BR".to_string(),
            builtin_table(
                &PT_BR_MONTHS_SHORT,
                &PT_BR_MONTHS,
                "Carregar mais posts",
                "Carregando...",
                "%d min",
            ),
        );
        translations.insert(
            "en".to_string(),
            builtin_table(
                &EN_MONTHS_SHORT,
                &EN_MONTHS,
                "Load more posts",
                "Loading...",
                "%d min",
            ),
        );

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load language files from a directory, merging them over the built-ins
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            if !matches!(ext, Some("yml") | Some("yaml") | Some("json")) {
                continue;
            }

            let Some(lang) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let content = fs::read_to_string(&path)?;

            // serde_yaml reads JSON documents as well
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    self.translations
                        .entry(lang.to_string())
                        .or_default()
                        .extend(data);
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get a translation by key, falling back to English and then to the key
    pub fn get(&self, key: &str) -> String {
        self.lookup(key)
            .map(yaml_value_to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Translation with `%d` replaced by `count`
    pub fn get_count(&self, key: &str, count: u32) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// Abbreviated month name, `month` is 1-based
    pub fn month_short(&self, month: u32) -> String {
        self.month_from("months_short", month)
    }

    /// Full month name, `month` is 1-based
    pub fn month_long(&self, month: u32) -> String {
        self.month_from("months", month)
    }

    fn month_from(&self, key: &str, month: u32) -> String {
        let index = month.saturating_sub(1) as usize;
        match self.lookup(key) {
            Some(serde_yaml::Value::Sequence(names)) => names
                .get(index)
                .map(yaml_value_to_string)
                .unwrap_or_else(|| month.to_string()),
            _ => month.to_string(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.translations
            .get(&self.language)
            .and_then(|data| data.get(key))
            .or_else(|| self.translations.get("en").and_then(|data| data.get(key)))
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

fn builtin_table(
    months_short: &[&str; 12],
    months: &[&str; 12],
    load_more: &str,
    loading: &str,
    reading_time: &str,
) -> HashMap<String, serde_yaml::Value> {
    let sequence = |names: &[&str; 12]| {
        serde_yaml::Value::Sequence(
            names
                .iter()
                .map(|n| serde_yaml::Value::String(n.to_string()))
                .collect(),
        )
    };

    let mut table = HashMap::new();
    table.insert("months_short".to_string(), sequence(months_short));
    table.insert("months".to_string(), sequence(months));
    table.insert(
        "load_more".to_string(),
        serde_yaml::Value::String(load_more.to_string()),
    );
    table.insert(
        "loading".to_string(),
        serde_yaml::Value::String(loading.to_string()),
    );
    table.insert(
        "reading_time".to_string(),
        serde_yaml::Value::String(reading_time.to_string()),
    );
    table
}

/// Convert a YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(s) => s.clone(),
        serde_yaml::Value::Number(n) => n.to_string(),
        serde_yaml::Value::Bool(b) => b.to_string(),
        serde_yaml::Value::Null => String::new(),
        _ => format!("{:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_portuguese() {
        let i18n = I18n::new("pt-BR");
        assert_eq!(i18n.get("load_more"), "Carregar mais posts");
        assert_eq!(i18n.get("loading"), "Carregando...");
        assert_eq!(i18n.month_short(3), "mar");
        assert_eq!(i18n.month_short(2), "fev");
        assert_eq!(i18n.month_long(12), "dezembro");
        assert_eq!(i18n.get_count("reading_time", 4), "4 min");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let i18n = I18n::new("de");
        assert_eq!(i18n.get("load_more"), "Load more posts");
        assert_eq!(i18n.month_short(5), "May");
        assert_eq!(i18n.get("unknown"), "unknown");
    }

    #[test]
    fn test_load_languages_overrides_builtin() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt-BR.yml"),
            "load_more: Ver mais\nfooter: Rodapé\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.yml"), "- [unclosed").unwrap();

        let mut i18n = I18n::new("pt-BR");
        i18n.load_languages(dir.path()).unwrap();

        assert_eq!(i18n.get("load_more"), "Ver mais");
        assert_eq!(i18n.get("footer"), "Rodapé");
        // untouched keys keep the built-in value
        assert_eq!(i18n.get("loading"), "Carregando...");
        assert_eq!(i18n.month_short(8), "ago");
    }
}
