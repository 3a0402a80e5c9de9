//! Domain override rules and matching.

use std::net::{Ipv4Addr, Ipv6Addr};
use tracing::{debug, info};

use crate::error::{Outcome, RuleError, StoreError, ValidationError, ValidationErrors};
use crate::store::{upsert_by_id, RuleStore};
use crate::types::{DomainRule, RecordType, RuleDraft, RuleId};
use crate::validate::is_valid_domain;

/// Ordered rule set, written through to `S`.
///
/// Matching picks an enabled exact rule first (earliest wins). Failing that,
/// the enabled wildcard with the most suffix labels wins, with ties going to
/// the earliest rule. A wildcard never matches its own suffix.
#[derive(Debug)]
pub struct RuleEngine<S> {
    rules: Vec<DomainRule>,
    store: S,
}

impl<S: RuleStore> RuleEngine<S> {
    /// Load persisted rules in stored order
    pub fn load(store: S) -> Result<Self, StoreError> {
        let mut rules = store.load_rules()?;
        for rule in &mut rules {
            rule.pattern = normalize_domain(&rule.pattern);
        }
        debug!(count = rules.len(), "loaded rules");
        Ok(Self { rules, store })
    }

    /// All rules, in insertion order
    #[must_use]
    pub fn list(&self) -> &[DomainRule] {
        &self.rules
    }

    /// Look up a rule by id
    #[must_use]
    pub fn get(&self, id: &RuleId) -> Option<&DomainRule> {
        self.rules.iter().find(|r| &r.id == id)
    }

    /// The backing store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Validate and save a rule.
    ///
    /// A draft whose id exists replaces that rule in place; anything else is
    /// appended under the draft's id or a fresh one.
    ///
    /// A new rule for a `(pattern, record_type)` pair that another rule already
    /// covers is rejected with [`ValidationError::DuplicateRule`] rather than
    /// replacing it. To overwrite, upsert under the existing rule's id, e.g.
    /// with [`RuleDraft::from_rule`].
    pub fn upsert(&mut self, draft: RuleDraft) -> Result<DomainRule, RuleError> {
        let rule = self.validate(draft)?;
        self.store.persist_rule(&rule)?;
        upsert_by_id(&mut self.rules, &rule);
        info!(id = %rule.id, pattern = %rule.pattern, "saved rule");
        Ok(rule)
    }

    /// Remove a rule
    pub fn delete(&mut self, id: &RuleId) -> Result<Outcome<DomainRule>, StoreError> {
        let Some(index) = self.position(id) else {
            debug!(id = %id, "delete of unknown rule ignored");
            return Ok(Outcome::NotFound);
        };
        self.store.delete_rule(id)?;
        let removed = self.rules.remove(index);
        info!(id = %id, pattern = %removed.pattern, "deleted rule");
        Ok(Outcome::Applied(removed))
    }

    /// Flip a rule's enabled flag
    pub fn toggle(&mut self, id: &RuleId) -> Result<Outcome<DomainRule>, StoreError> {
        let Some(index) = self.position(id) else {
            debug!(id = %id, "toggle of unknown rule ignored");
            return Ok(Outcome::NotFound);
        };
        let mut rule = self.rules[index].clone();
        rule.enabled = !rule.enabled;
        self.store.persist_rule(&rule)?;
        self.rules[index] = rule.clone();
        info!(id = %id, enabled = rule.enabled, "toggled rule");
        Ok(Outcome::Applied(rule))
    }

    /// Rule answering `domain`, or `None` to fall through to upstream
    #[must_use]
    pub fn match_domain(&self, domain: &str) -> Option<&DomainRule> {
        self.find_match(domain, None)
    }

    /// Like [`match_domain`](Self::match_domain), considering only rules of one record type
    #[must_use]
    pub fn match_record(&self, domain: &str, record_type: RecordType) -> Option<&DomainRule> {
        self.find_match(domain, Some(record_type))
    }

    fn find_match(&self, domain: &str, record_type: Option<RecordType>) -> Option<&DomainRule> {
        let query = normalize_domain(domain);
        if query.is_empty() {
            return None;
        }
        let candidates = || {
            self.rules
                .iter()
                .filter(move |r| r.enabled && record_type.map_or(true, |t| r.record_type == t))
        };

        if let Some(rule) = candidates().find(|r| !r.is_wildcard() && r.pattern == query) {
            return Some(rule);
        }

        candidates()
            .filter_map(|r| {
                let suffix = r.wildcard_suffix()?;
                covers(suffix, &query).then(|| (suffix.split('.').count(), r))
            })
            .fold(None, |best, (labels, rule)| match best {
                Some((best_labels, _)) if best_labels >= labels => best,
                _ => Some((labels, rule)),
            })
            .map(|(_, rule)| rule)
    }

    fn position(&self, id: &RuleId) -> Option<usize> {
        self.rules.iter().position(|r| &r.id == id)
    }

    fn validate(&self, draft: RuleDraft) -> Result<DomainRule, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let pattern = normalize_domain(&draft.pattern);
        let answer = draft.answer.trim();

        if pattern.is_empty() {
            errors.push(ValidationError::Required { field: "domain" });
        } else if !is_valid_pattern(&pattern) {
            errors.push(ValidationError::InvalidPattern {
                value: pattern.clone(),
            });
        }

        let answer = if answer.is_empty() {
            errors.push(ValidationError::Required { field: "answer" });
            String::new()
        } else {
            normalize_answer(draft.record_type, answer).unwrap_or_else(|| {
                errors.push(ValidationError::InvalidAnswer {
                    record_type: draft.record_type,
                    value: answer.to_string(),
                });
                answer.to_string()
            })
        };

        let id = draft.id.unwrap_or_else(RuleId::generate);
        let clash = self
            .rules
            .iter()
            .any(|r| r.id != id && r.pattern == pattern && r.record_type == draft.record_type);
        if clash && !pattern.is_empty() {
            errors.push(ValidationError::DuplicateRule {
                pattern: pattern.clone(),
                record_type: draft.record_type,
            });
        }

        errors.into_result(DomainRule {
            id,
            pattern,
            answer,
            record_type: draft.record_type,
            enabled: draft.enabled,
        })
    }
}

/// Trim, lowercase and drop a trailing root dot
fn normalize_domain(domain: &str) -> String {
    let domain = domain.trim();
    domain.strip_suffix('.').unwrap_or(domain).to_lowercase()
}

fn is_valid_pattern(pattern: &str) -> bool {
    match pattern.strip_prefix("*.") {
        Some(suffix) => is_valid_domain(suffix),
        None => is_valid_domain(pattern),
    }
}

fn normalize_answer(record_type: RecordType, answer: &str) -> Option<String> {
    match record_type {
        RecordType::A => answer.parse::<Ipv4Addr>().ok().map(|ip| ip.to_string()),
        RecordType::Aaaa => answer.parse::<Ipv6Addr>().ok().map(|ip| ip.to_string()),
    }
}

/// `suffix` is a dot-aligned proper suffix of `query` with at least one extra label
fn covers(suffix: &str, query: &str) -> bool {
    query
        .strip_suffix(suffix)
        .is_some_and(|head| head.len() > 1 && head.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn engine() -> RuleEngine<MemoryStore> {
        RuleEngine::load(MemoryStore::new()).unwrap()
    }

    fn add(engine: &mut RuleEngine<MemoryStore>, pattern: &str, answer: &str) -> DomainRule {
        engine.upsert(RuleDraft::new(pattern, answer)).unwrap()
    }

    struct ReadOnlyStore;

    impl RuleStore for ReadOnlyStore {
        fn load_rules(&self) -> crate::Result<Vec<DomainRule>> {
            Ok(vec![DomainRule {
                id: RuleId::from("fixed"),
                pattern: "Ads.Example.COM".into(),
                answer: "0.0.0.0".into(),
                record_type: RecordType::A,
                enabled: true,
            }])
        }

        fn persist_rule(&mut self, _rule: &DomainRule) -> crate::Result<()> {
            Err(StoreError::Backend("read-only".into()))
        }

        fn delete_rule(&mut self, _id: &RuleId) -> crate::Result<()> {
            Err(StoreError::Backend("read-only".into()))
        }
    }

    #[test]
    fn test_exact_beats_wildcard() {
        let mut engine = engine();
        let wildcard = add(&mut engine, "*.ads.example.com", "0.0.0.0");
        let exact = add(&mut engine, "shop.ads.example.com", "10.0.0.1");

        assert_eq!(engine.match_domain("shop.ads.example.com"), Some(&exact));
        assert_eq!(engine.match_domain("x.ads.example.com"), Some(&wildcard));
        assert_eq!(engine.match_domain("ads.example.com"), None);
        assert_eq!(engine.match_domain("ads-example.com"), None);
        assert_eq!(engine.match_domain("xads.example.com"), None);
    }

    #[test]
    fn test_query_normalized() {
        let mut engine = engine();
        let rule = add(&mut engine, "  Tracker.Example.com. ", "0.0.0.0");
        assert_eq!(rule.pattern, "tracker.example.com");
        assert_eq!(engine.match_domain("TRACKER.example.COM."), Some(&rule));
        assert_eq!(engine.match_domain(""), None);
    }

    #[test]
    fn test_disabled_never_matches() {
        let mut engine = engine();
        let exact = add(&mut engine, "a.example.com", "0.0.0.0");
        let wildcard = add(&mut engine, "*.example.com", "127.0.0.1");
        assert!(engine.toggle(&exact.id).unwrap().is_applied());
        assert_eq!(engine.match_domain("a.example.com"), Some(&wildcard));

        assert!(engine.toggle(&wildcard.id).unwrap().is_applied());
        assert_eq!(engine.match_domain("a.example.com"), None);
        assert_eq!(engine.match_domain("deep.a.example.com"), None);
    }

    #[test]
    fn test_longest_suffix_then_insertion_order() {
        let mut engine = engine();
        let broad = add(&mut engine, "*.example.com", "0.0.0.0");
        let narrow = add(&mut engine, "*.cdn.example.com", "127.0.0.1");
        let aaaa = engine
            .upsert(RuleDraft::new("*.cdn.example.com", "::1").record_type(RecordType::Aaaa))
            .unwrap();

        assert_eq!(engine.match_domain("img.cdn.example.com"), Some(&narrow));
        assert_eq!(engine.match_domain("www.example.com"), Some(&broad));
        assert_eq!(
            engine.match_record("img.cdn.example.com", RecordType::Aaaa),
            Some(&aaaa)
        );
        assert_eq!(engine.match_record("www.example.com", RecordType::Aaaa), None);
    }

    #[test]
    fn test_validation_accumulates() {
        let mut engine = engine();
        let err = engine.upsert(RuleDraft::new("", "")).unwrap_err();
        let RuleError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);

        let err = engine
            .upsert(RuleDraft::new("*.exa_mple.com", "1.2.3.4").record_type(RecordType::Aaaa))
            .unwrap_err();
        let RuleError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert!(errors.contains(&ValidationError::InvalidPattern {
            value: "*.exa_mple.com".into()
        }));
        assert!(errors.contains(&ValidationError::InvalidAnswer {
            record_type: RecordType::Aaaa,
            value: "1.2.3.4".into()
        }));
        assert!(engine.list().is_empty());
    }

    #[test]
    fn test_rejects_bad_patterns() {
        let mut engine = engine();
        for pattern in ["*example.com", "a.*.example.com", "exa mple.com", "*.-x.com"] {
            assert!(engine.upsert(RuleDraft::new(pattern, "0.0.0.0")).is_err(), "{pattern}");
        }
    }

    #[test]
    fn test_duplicate_pattern_and_type_rejected() {
        let mut engine = engine();
        add(&mut engine, "dup.example.com", "0.0.0.0");
        let err = engine
            .upsert(RuleDraft::new("DUP.example.com", "127.0.0.1"))
            .unwrap_err();
        let duplicate = ValidationError::DuplicateRule {
            pattern: "dup.example.com".into(),
            record_type: RecordType::A,
        };
        assert!(matches!(err, RuleError::Validation(ref e) if e.contains(&duplicate)));

        engine
            .upsert(RuleDraft::new("dup.example.com", "::").record_type(RecordType::Aaaa))
            .unwrap();
        assert_eq!(engine.list().len(), 2);
    }

    #[test]
    fn test_edit_in_place() {
        let mut engine = engine();
        let first = add(&mut engine, "one.example.com", "0.0.0.0");
        add(&mut engine, "two.example.com", "0.0.0.0");

        let edited = engine
            .upsert(RuleDraft::from_rule(&first).enabled(false))
            .unwrap();
        assert_eq!(edited.id, first.id);
        assert_eq!(engine.list()[0], edited);
        assert_eq!(engine.list().len(), 2);
        assert_eq!(engine.store().rules()[0], edited);
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let mut engine = engine();
        add(&mut engine, "keep.example.com", "0.0.0.0");
        let before = engine.list().to_vec();
        let ghost = RuleId::from("ghost");

        assert!(engine.delete(&ghost).unwrap().is_not_found());
        assert!(engine.toggle(&ghost).unwrap().is_not_found());
        assert_eq!(engine.list(), before.as_slice());
    }

    #[test]
    fn test_delete() {
        let mut engine = engine();
        let rule = add(&mut engine, "gone.example.com", "0.0.0.0");
        let removed = engine.delete(&rule.id).unwrap().applied().unwrap();
        assert_eq!(removed, rule);
        assert!(engine.list().is_empty());
        assert!(engine.store().rules().is_empty());
    }

    #[test]
    fn test_store_failure_leaves_rules_unchanged() {
        let mut engine = RuleEngine::load(ReadOnlyStore).unwrap();
        assert_eq!(engine.list()[0].pattern, "ads.example.com");
        let before = engine.list().to_vec();
        let id = RuleId::from("fixed");

        assert!(engine.toggle(&id).is_err());
        assert!(engine.delete(&id).is_err());
        assert!(matches!(
            engine.upsert(RuleDraft::new("new.example.com", "0.0.0.0")),
            Err(RuleError::Store(_))
        ));
        assert_eq!(engine.list(), before.as_slice());
    }

    #[test]
    fn test_answers_canonicalized() {
        let mut engine = engine();
        let rule = engine
            .upsert(
                RuleDraft::new("v6.example.com", "0:0:0:0:0:0:0:1").record_type(RecordType::Aaaa),
            )
            .unwrap();
        assert_eq!(rule.answer, "::1");
        assert!(engine.upsert(RuleDraft::new("v4.example.com", "01.2.3.4")).is_err());
    }
}
