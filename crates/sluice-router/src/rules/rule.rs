//! Rule definitions.

use crate::engine::{Facts, ROUTING_GROUP_KEY};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::time::SystemTime;

/// A named condition and the actions taken when it holds.
///
/// Conditions, matchers and actions are written as single-key maps,
/// e.g. `condition: {query_type: {equals: ShowTables}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rule {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Lower values fire first.
    #[serde(default = "default_priority")]
    pub priority: i32,

    #[serde(deserialize_with = "serde_yaml::with::singleton_map_recursive::deserialize")]
    pub condition: Condition,

    #[serde(
        default,
        deserialize_with = "serde_yaml::with::singleton_map_recursive::deserialize"
    )]
    pub actions: Vec<Action>,
}

fn default_priority() -> i32 {
    i32::MAX - 1
}

/// Expression over request facts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Condition {
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
    Always(bool),
    Header(HeaderCondition),
    Method(Matcher),
    Path(Matcher),
    User(Matcher),
    QueryType(Matcher),
    DefaultCatalog(Matcher),
    DefaultSchema(Matcher),
    Catalog(Matcher),
    Schema(Matcher),
    CatalogSchema(Matcher),
    /// Matches dotted qualified names, e.g. `hive.web.events`.
    Table(Matcher),
}

impl Condition {
    pub fn evaluate(&self, facts: &Facts<'_>) -> bool {
        let request = facts.request;
        match self {
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(facts)),
            Self::Any(conditions) => conditions.iter().any(|c| c.evaluate(facts)),
            Self::Not(condition) => !condition.evaluate(facts),
            Self::Always(value) => *value,
            Self::Header(header) => header.matcher.matches(facts.header(&header.name)),
            Self::Method(m) => m.matches(Some(facts.method.as_str())),
            Self::Path(m) => m.matches(Some(facts.uri.path())),
            Self::User(m) => m.matches(request.user.as_deref()),
            Self::QueryType(m) => m.matches(request.query_type.as_deref()),
            Self::DefaultCatalog(m) => m.matches(Some(request.default_catalog.as_str())),
            Self::DefaultSchema(m) => m.matches(Some(request.default_schema.as_str())),
            Self::Catalog(m) => m.matches_any(&request.catalogs),
            Self::Schema(m) => m.matches_any(&request.schemas),
            Self::CatalogSchema(m) => m.matches_any(&request.catalog_schemas),
            Self::Table(m) => m.matches_any(request.tables.iter().map(ToString::to_string)),
        }
    }
}

/// Header name plus one matcher, written flat:
/// `{ name: X-Trino-Source, equals: airflow }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "RawHeaderCondition")]
pub struct HeaderCondition {
    pub name: String,
    pub matcher: Matcher,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHeaderCondition {
    name: String,
    equals: Option<String>,
    one_of: Option<Vec<String>>,
    starts_with: Option<String>,
    matches: Option<Pattern>,
    exists: Option<bool>,
}

impl TryFrom<RawHeaderCondition> for HeaderCondition {
    type Error = String;

    fn try_from(raw: RawHeaderCondition) -> Result<Self, Self::Error> {
        let candidates = [
            raw.equals.map(Matcher::Equals),
            raw.one_of.map(Matcher::OneOf),
            raw.starts_with.map(Matcher::StartsWith),
            raw.matches.map(Matcher::Matches),
            raw.exists.map(Matcher::Exists),
        ];
        let mut matchers = candidates.into_iter().flatten();
        match (matchers.next(), matchers.next()) {
            (Some(matcher), None) => Ok(Self {
                name: raw.name,
                matcher,
            }),
            (None, _) => Err(format!("header condition on '{}' has no matcher", raw.name)),
            (Some(_), Some(_)) => Err(format!(
                "header condition on '{}' has more than one matcher",
                raw.name
            )),
        }
    }
}

/// Test applied to a fact value.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Matcher {
    Equals(String),
    OneOf(Vec<String>),
    StartsWith(String),
    Matches(Pattern),
    /// Scalar facts: the value is present. Set facts: the set is non-empty.
    Exists(bool),
}

impl Matcher {
    /// Match a scalar fact. Absent values only match `exists: false`.
    pub fn matches(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (Self::Exists(expected), value) => value.is_some() == *expected,
            (_, Some(value)) => self.test(value),
            (_, None) => false,
        }
    }

    /// Match a set fact: true when any element matches.
    pub fn matches_any<I, S>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut values = values.into_iter().peekable();
        match self {
            Self::Exists(expected) => values.peek().is_some() == *expected,
            _ => values.any(|v| self.test(v.as_ref())),
        }
    }

    fn test(&self, value: &str) -> bool {
        match self {
            Self::Equals(expected) => value == expected,
            Self::OneOf(options) => options.iter().any(|o| o == value),
            Self::StartsWith(prefix) => value.starts_with(prefix.as_str()),
            Self::Matches(pattern) => pattern.0.is_match(value),
            Self::Exists(_) => true,
        }
    }
}

/// Regular expression compiled when the rule is loaded.
#[derive(Debug, Clone)]
pub struct Pattern(pub Regex);

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Regex::new(&source)
            .map(Pattern)
            .map_err(|e| serde::de::Error::custom(format!("invalid pattern '{source}': {e}")))
    }
}

/// Effect of a fired rule on the result map.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Action {
    /// Shorthand for setting the routing group.
    RouteTo(String),
    Set { key: String, value: String },
}

impl Action {
    pub fn apply(&self, result: &mut BTreeMap<String, String>) {
        match self {
            Self::RouteTo(group) => {
                result.insert(ROUTING_GROUP_KEY.to_string(), group.clone());
            }
            Self::Set { key, value } => {
                result.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Ordered rules plus the timestamp of the definition they were loaded from.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<Rule>,
    loaded_at: Option<SystemTime>,
}

impl RuleSet {
    /// Sorts rules into firing order.
    pub fn new(mut rules: Vec<Rule>, loaded_at: Option<SystemTime>) -> Self {
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.name.cmp(&b.name)));
        Self { rules, loaded_at }
    }

    /// Empty set that has never been loaded.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Modification time of the definition at load, `None` if never loaded.
    pub fn loaded_at(&self) -> Option<SystemTime> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(yaml: &str) -> Result<Rule, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    #[test]
    fn test_minimal_rule() {
        let r = rule("name: r\ncondition: {always: true}\nactions: [{route_to: adhoc}]").unwrap();
        assert_eq!(r.priority, i32::MAX - 1);
        assert!(r.description.is_none());
        assert!(matches!(r.condition, Condition::Always(true)));
        assert!(matches!(&r.actions[..], [Action::RouteTo(g)] if g == "adhoc"));
    }

    #[test]
    fn test_nested_conditions() {
        let r = rule(
            r#"
name: nested
condition:
  all:
    - query_type: {equals: Query}
    - not:
        catalog: {one_of: [system, information_schema]}
    - any:
        - user: {matches: "^svc-.*"}
        - header: {name: X-Trino-Source, starts_with: airflow}
actions:
  - set: {key: routingGroup, value: etl}
"#,
        )
        .unwrap();
        let Condition::All(parts) = &r.condition else {
            panic!("expected all");
        };
        assert_eq!(parts.len(), 3);
    }

    #[test]
    fn test_map_form_enums() {
        let r = rule(
            "name: metadata-to-adhoc\ncondition:\n  query_type: {equals: ShowTables}\nactions:\n  - route_to: adhoc\n  - set: {key: queue, value: small}\n",
        )
        .unwrap();
        assert!(matches!(
            &r.condition,
            Condition::QueryType(Matcher::Equals(kind)) if kind == "ShowTables"
        ));
        assert!(matches!(
            &r.actions[..],
            [Action::RouteTo(g), Action::Set { key, value }]
                if g == "adhoc" && key == "queue" && value == "small"
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(rule("name: r\ncondition: {always: true}\nweight: 3").is_err());
    }

    #[test]
    fn test_unknown_condition_rejected() {
        assert!(rule("name: r\ncondition: {color: {equals: red}}").is_err());
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let err = rule("name: r\ncondition: {user: {matches: \"(unclosed\"}}").unwrap_err();
        assert!(err.to_string().contains("invalid pattern"));
    }

    #[test]
    fn test_header_condition_needs_one_matcher() {
        assert!(rule("name: r\ncondition: {header: {name: X-A}}").is_err());
        assert!(rule("name: r\ncondition: {header: {name: X-A, equals: a, exists: true}}").is_err());
        assert!(rule("name: r\ncondition: {header: {name: X-A, color: a}}").is_err());
    }

    #[test]
    fn test_matcher_scalar() {
        let equals = Matcher::Equals("a".into());
        assert!(equals.matches(Some("a")));
        assert!(!equals.matches(Some("b")));
        assert!(!equals.matches(None));

        assert!(Matcher::Exists(false).matches(None));
        assert!(!Matcher::Exists(false).matches(Some("x")));
        assert!(Matcher::Exists(true).matches(Some("")));
    }

    #[test]
    fn test_matcher_set() {
        let values = ["hive", "iceberg"];
        assert!(Matcher::StartsWith("ice".into()).matches_any(values));
        assert!(!Matcher::OneOf(vec!["system".into()]).matches_any(values));
        assert!(Matcher::Exists(true).matches_any(values));
        assert!(Matcher::Exists(false).matches_any(Vec::<String>::new()));
        assert!(!Matcher::Equals("hive".into()).matches_any(Vec::<String>::new()));
    }

    #[test]
    fn test_rule_set_order() {
        let rules = vec![
            rule("name: b\ncondition: {always: true}").unwrap(),
            rule("name: a\ncondition: {always: true}").unwrap(),
            rule("name: z\npriority: 1\ncondition: {always: true}").unwrap(),
        ];
        let set = RuleSet::new(rules, None);
        let names: Vec<_> = set.rules().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["z", "a", "b"]);
    }
}
