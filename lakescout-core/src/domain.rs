//! Domain assignment.

use crate::config::DomainRules;
use crate::urn::make_domain_urn;
use crate::workunit::{Aspect, WorkUnit};

/// Assigns catalog domains to datasets and containers by name.
#[derive(Debug, Clone, Copy)]
pub struct DomainTagger<'a> {
    rules: &'a DomainRules,
}

impl<'a> DomainTagger<'a> {
    /// Tagger over the configured rules.
    pub fn new(rules: &'a DomainRules) -> Self {
        Self { rules }
    }

    /// Domain URN for `name`; the last matching rule wins.
    pub fn domain_urn(&self, name: &str) -> Option<String> {
        self.rules.matching_label(name).map(make_domain_urn)
    }

    /// Domains work unit for the entity, if any rule matches `name`.
    pub fn work_unit(&self, platform: &str, entity_urn: &str, name: &str) -> Option<WorkUnit> {
        let domain = self.domain_urn(name)?;
        Some(WorkUnit::new(
            platform,
            entity_urn,
            Aspect::Domains {
                domains: vec![domain],
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AllowDenyPattern;

    fn rules() -> DomainRules {
        DomainRules::new()
            .with_rule(
                "sales",
                AllowDenyPattern::allow_only(vec!["sales\\..*".into()]).unwrap(),
            )
            .with_rule(
                "urn:li:domain:orders",
                AllowDenyPattern::allow_only(vec![".*\\.orders".into()]).unwrap(),
            )
    }

    #[test]
    fn test_last_match_wins() {
        let rules = rules();
        let tagger = DomainTagger::new(&rules);
        assert_eq!(
            tagger.domain_urn("sales.orders").as_deref(),
            Some("urn:li:domain:orders")
        );
        assert_eq!(
            tagger.domain_urn("sales.items").as_deref(),
            Some("urn:li:domain:sales")
        );
        assert_eq!(tagger.domain_urn("hr.people"), None);
    }

    #[test]
    fn test_work_unit_only_when_matched() {
        let rules = rules();
        let tagger = DomainTagger::new(&rules);
        let unit = tagger
            .work_unit("impala", "urn:li:dataset:x", "sales.items")
            .unwrap();
        assert_eq!(
            unit.aspect,
            Aspect::Domains {
                domains: vec!["urn:li:domain:sales".into()]
            }
        );
        assert!(tagger.work_unit("impala", "urn:li:dataset:y", "hr.people").is_none());
    }
}
