//! Manufacturer suggestions
//!
//! A JSON object mapping appliance type identifiers to manufacturer names,
//! used only to suggest values for the make field.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::rules::ApplianceType;

#[derive(Debug, Clone, Default)]
pub struct ManufacturerList {
    by_type: HashMap<ApplianceType, Vec<String>>,
}

impl ManufacturerList {
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, Vec<String>> = serde_json::from_str(content)?;
        let mut by_type: HashMap<ApplianceType, Vec<String>> = HashMap::new();
        for (key, names) in raw {
            let appliance_type = ApplianceType::from_identifier(&key);
            if appliance_type == ApplianceType::Unknown {
                tracing::debug!(key = %key, "skipping manufacturers for unknown type");
                continue;
            }
            by_type.entry(appliance_type).or_default().extend(names);
        }
        for names in by_type.values_mut() {
            names.sort_by_key(|n| n.to_lowercase());
            names.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        }
        Ok(Self { by_type })
    }

    /// Load from `path`; a missing file gives an empty list.
    pub fn load(path: &Path) -> Result<Self, std::io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Names for `appliance_type` starting with `prefix` (case-insensitive).
    pub fn suggest(&self, appliance_type: ApplianceType, prefix: &str) -> Vec<&str> {
        let prefix = prefix.trim().to_lowercase();
        self.by_type
            .get(&appliance_type)
            .map(|names| {
                names
                    .iter()
                    .filter(|n| n.to_lowercase().starts_with(&prefix))
                    .map(String::as_str)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "stove": ["Jotul", "Vermont Castings", "jotul", "Hearthstone"],
        "insert": ["Regency"],
        "mystery": ["Nobody"]
    }"#;

    #[test]
    fn test_suggest_by_prefix() {
        let list = ManufacturerList::from_json(SAMPLE).unwrap();
        assert_eq!(list.suggest(ApplianceType::Stove, "jo"), vec!["Jotul"]);
        assert_eq!(list.suggest(ApplianceType::Stove, "").len(), 3);
        assert_eq!(list.suggest(ApplianceType::Insert, "R"), vec!["Regency"]);
    }

    #[test]
    fn test_unknown_types_have_no_suggestions() {
        let list = ManufacturerList::from_json(SAMPLE).unwrap();
        assert!(list.suggest(ApplianceType::Unknown, "").is_empty());
        assert!(list.suggest(ApplianceType::Furnace, "").is_empty());
    }
}
