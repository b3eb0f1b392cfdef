//! Ordered domain assignment rules.

use super::pattern::AllowDenyPattern;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Domain label to pattern rules, in declaration order.
///
/// Deserializes from a JSON object and keeps the document order of its
/// keys, which decides precedence: when several rules match, the last one
/// declared wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainRules {
    rules: Vec<(String, AllowDenyPattern)>,
}

impl DomainRules {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule; later rules take precedence over earlier ones.
    pub fn with_rule(mut self, label: impl Into<String>, pattern: AllowDenyPattern) -> Self {
        self.rules.push((label.into(), pattern));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Label of the last rule admitting `name`.
    pub fn matching_label(&self, name: &str) -> Option<&str> {
        self.rules
            .iter()
            .rev()
            .find(|(_, pattern)| pattern.allowed(name))
            .map(|(label, _)| label.as_str())
    }

    /// Rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AllowDenyPattern)> {
        self.rules.iter().map(|(l, p)| (l.as_str(), p))
    }
}

impl Serialize for DomainRules {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.rules.len()))?;
        for (label, pattern) in &self.rules {
            map.serialize_entry(label, pattern)?;
        }
        map.end()
    }
}

struct DomainRulesVisitor;

impl<'de> Visitor<'de> for DomainRulesVisitor {
    type Value = DomainRules;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of domain label to allow/deny pattern")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut rules = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some((label, pattern)) = access.next_entry::<String, AllowDenyPattern>()? {
            rules.push((label, pattern));
        }
        Ok(DomainRules { rules })
    }
}

impl<'de> Deserialize<'de> for DomainRules {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(DomainRulesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_matching_rule_wins() {
        let rules: DomainRules = serde_json::from_str(
            r#"{
                "sales": {"allow": ["sales\\..*"]},
                "orders": {"allow": [".*\\.orders"]}
            }"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 2);
        assert_eq!(rules.matching_label("sales.orders"), Some("orders"));
        assert_eq!(rules.matching_label("sales.items"), Some("sales"));
        assert_eq!(rules.matching_label("hr.people"), None);
    }

    #[test]
    fn test_declaration_order_survives_deserialization() {
        let rules: DomainRules = serde_json::from_str(
            r#"{"zeta": {"allow": ["a"]}, "alpha": {"allow": ["a"]}}"#,
        )
        .unwrap();
        let labels: Vec<&str> = rules.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["zeta", "alpha"]);
        assert_eq!(rules.matching_label("a.table"), Some("alpha"));
    }

    #[test]
    fn test_round_trip_keeps_order() {
        let rules = DomainRules::new()
            .with_rule("b", AllowDenyPattern::allow_only(vec!["x".into()]).unwrap())
            .with_rule("a", AllowDenyPattern::allow_only(vec!["x".into()]).unwrap());
        let json = serde_json::to_string(&rules).unwrap();
        assert!(json.find("\"b\"").unwrap() < json.find("\"a\"").unwrap());
    }
}
