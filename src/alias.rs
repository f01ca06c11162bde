//! Corps identity resolution.
//!
//! Corps rename themselves over the decades; the identity table maps every
//! historical name to the name the organization carries today.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

/// One row of the identity table (`corps,logo,live,current_alias`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentityEntry {
    pub corps: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub live: bool,
    #[serde(default)]
    pub current_alias: String,
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Clone, Default)]
pub struct AliasMap {
    aliases: HashMap<String, String>,
    logos: HashMap<String, String>,
    live: HashSet<String>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from identity rows. Rows not flagged live are ignored,
    /// and alias chains collapse to their final name.
    pub fn from_entries(entries: &[IdentityEntry]) -> Self {
        let mut map = Self::default();

        for entry in entries {
            let corps = entry.corps.trim();
            if corps.is_empty() || !entry.live {
                continue;
            }

            map.live.insert(corps.to_string());
            let logo = entry.logo.trim();
            if !logo.is_empty() {
                map.logos.insert(corps.to_string(), logo.to_string());
            }

            let alias = entry.current_alias.trim();
            if !alias.is_empty() && alias != corps {
                map.aliases.insert(corps.to_string(), alias.to_string());
            }
        }

        map.collapse_chains();
        map
    }

    /// Adds a single alias, e.g. for ad-hoc corrections on top of the table.
    pub fn insert(&mut self, raw: impl Into<String>, canonical: impl Into<String>) {
        let raw = raw.into();
        let canonical = canonical.into();
        if raw != canonical {
            self.aliases.insert(raw, canonical);
            self.collapse_chains();
        }
    }

    fn collapse_chains(&mut self) {
        let resolved: Vec<(String, String)> = self
            .aliases
            .keys()
            .map(|raw| (raw.clone(), self.follow(raw)))
            .collect();

        for (raw, canonical) in resolved {
            if raw == canonical {
                self.aliases.remove(&raw);
            } else {
                self.aliases.insert(raw, canonical);
            }
        }
    }

    fn follow(&self, raw: &str) -> String {
        let mut seen = HashSet::new();
        let mut current = raw;
        while let Some(next) = self.aliases.get(current) {
            if !seen.insert(current) {
                break;
            }
            current = next;
        }
        current.to_string()
    }

    /// Canonical name for a raw corps name; unknown names are already canonical.
    pub fn normalize<'a>(&'a self, raw: &'a str) -> &'a str {
        self.aliases.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// True when `raw` resolves to `canonical`, or is literally that name.
    pub fn is_same_corps(&self, raw: &str, canonical: &str) -> bool {
        raw == canonical || self.normalize(raw) == canonical
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.live.contains(name) || self.live.contains(self.normalize(name))
    }

    pub fn logo_for(&self, name: &str) -> Option<&str> {
        self.logos
            .get(name)
            .or_else(|| self.logos.get(self.normalize(name)))
            .map(String::as_str)
    }

    /// Live corps that are not themselves a former name, sorted without
    /// regard to case.
    pub fn active_corps(&self) -> Vec<String> {
        let mut corps: Vec<String> = self
            .live
            .iter()
            .filter(|name| !self.aliases.contains_key(name.as_str()))
            .cloned()
            .collect();
        corps.sort_by_key(|name| name.to_lowercase());
        corps
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// Free-function form of [`AliasMap::normalize`].
pub fn normalize<'a>(raw: &'a str, aliases: &'a AliasMap) -> &'a str {
    aliases.normalize(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(corps: &str, live: bool, alias: &str) -> IdentityEntry {
        IdentityEntry {
            corps: corps.to_string(),
            logo: corps.to_lowercase().replace(' ', "_"),
            live,
            current_alias: alias.to_string(),
        }
    }

    fn sample() -> AliasMap {
        AliasMap::from_entries(&[
            entry("Blue Devils", true, ""),
            entry("Star of Indiana", true, "Brass Theater"),
            entry("Brass Theater", true, "Star Legacy"),
            entry("Star Legacy", true, ""),
            entry("Cavaliers", true, ""),
            entry("Suncoast Sound", false, "Phantom Regiment"),
        ])
    }

    #[test]
    fn unknown_names_pass_through() {
        let aliases = sample();
        assert_eq!(aliases.normalize("Boston Crusaders"), "Boston Crusaders");
        assert_eq!(AliasMap::new().normalize("Cavaliers"), "Cavaliers");
    }

    #[test]
    fn chains_collapse_to_final_name() {
        let aliases = sample();
        assert_eq!(aliases.normalize("Star of Indiana"), "Star Legacy");
        assert_eq!(aliases.normalize("Brass Theater"), "Star Legacy");
    }

    #[test]
    fn normalize_is_idempotent() {
        let aliases = sample();
        for name in ["Star of Indiana", "Brass Theater", "Blue Devils", "Nobody"] {
            let once = aliases.normalize(name);
            assert_eq!(aliases.normalize(once), once);
        }
    }

    #[test]
    fn rows_not_live_contribute_nothing() {
        let aliases = sample();
        assert_eq!(aliases.normalize("Suncoast Sound"), "Suncoast Sound");
        assert!(!aliases.is_live("Suncoast Sound"));
    }

    #[test]
    fn cycles_do_not_hang() {
        let mut aliases = AliasMap::new();
        aliases.insert("A", "B");
        aliases.insert("B", "A");
        let resolved = aliases.normalize("A");
        assert!(resolved == "A" || resolved == "B");
    }

    #[test]
    fn active_corps_excludes_former_names() {
        let aliases = sample();
        assert_eq!(
            aliases.active_corps(),
            vec!["Blue Devils", "Cavaliers", "Star Legacy"]
        );
    }

    #[test]
    fn logo_falls_back_to_canonical_name() {
        let mut aliases = sample();
        aliases.insert("Madison Scouts (1980s)", "Cavaliers");
        assert_eq!(aliases.logo_for("Madison Scouts (1980s)"), Some("cavaliers"));
    }
}
