//! Rule evaluation.

use crate::processed::ProcessedRequest;
use crate::rules::RuleSet;
use axum::http::{HeaderMap, Method, Request, Uri};
use serde::Serialize;
use std::collections::BTreeMap;

/// Result key read as the routing group.
pub const ROUTING_GROUP_KEY: &str = "routingGroup";

/// Everything a condition can look at, for one request.
#[derive(Debug, Clone, Copy)]
pub struct Facts<'a> {
    pub method: &'a Method,
    pub uri: &'a Uri,
    pub headers: &'a HeaderMap,
    pub request: &'a ProcessedRequest,
}

impl<'a> Facts<'a> {
    pub fn new<B>(request: &'a Request<B>, processed: &'a ProcessedRequest) -> Self {
        Self {
            method: request.method(),
            uri: request.uri(),
            headers: request.headers(),
            request: processed,
        }
    }

    /// Header value as text; non-text values count as absent.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Rules that fired and the values they wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub fired: Vec<String>,
    pub result: BTreeMap<String, String>,
}

impl Evaluation {
    pub fn routing_group(&self) -> Option<&str> {
        self.result.get(ROUTING_GROUP_KEY).map(String::as_str)
    }
}

/// Fire every matching rule in order and collect their writes.
pub fn evaluate(rules: &RuleSet, facts: &Facts<'_>) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for rule in rules.rules() {
        if !rule.condition.evaluate(facts) {
            continue;
        }
        tracing::trace!(rule = %rule.name, "Routing rule fired");
        for action in &rule.actions {
            action.apply(&mut evaluation.result);
        }
        evaluation.fired.push(rule.name.clone());
    }

    evaluation
}

/// Routing group chosen by `rules` for this request, if any.
pub fn decide<B>(
    rules: &RuleSet,
    processed: &ProcessedRequest,
    request: &Request<B>,
) -> Option<String> {
    let facts = Facts::new(request, processed);
    let evaluation = evaluate(rules, &facts);
    if !evaluation.fired.is_empty() {
        tracing::debug!(fired = ?evaluation.fired, group = ?evaluation.routing_group(), "Routing rules evaluated");
    }
    evaluation.routing_group().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::parse_rules;
    use pretty_assertions::assert_eq;
    use sluice_sql::QualifiedName;

    fn rules(text: &str) -> RuleSet {
        RuleSet::new(parse_rules(text).unwrap(), None)
    }

    fn request() -> Request<()> {
        Request::post("/v1/statement")
            .header("X-Trino-Source", "airflow-dag-42")
            .body(())
            .unwrap()
    }

    fn processed() -> ProcessedRequest {
        ProcessedRequest {
            body: "SELECT * FROM hive.web.events".into(),
            query_type: Some("Query".into()),
            tables: [QualifiedName::of("hive", "web", "events")].into_iter().collect(),
            default_catalog: "__UNSET__".into(),
            default_schema: "__UNSET__".into(),
            catalogs: ["hive".to_string()].into(),
            schemas: ["web".to_string()].into(),
            catalog_schemas: ["hive.web".to_string()].into(),
            user: Some("alice".into()),
        }
    }

    #[test]
    fn test_no_rules_no_group() {
        assert_eq!(decide(&RuleSet::empty(), &processed(), &request()), None);
    }

    #[test]
    fn test_last_writer_wins() {
        let set = rules(
            r#"
name: first
priority: 1
condition: {always: true}
actions: [{route_to: early}]
---
name: second
priority: 2
condition: {catalog: {equals: hive}}
actions: [{route_to: late}]
"#,
        );
        assert_eq!(decide(&set, &processed(), &request()).as_deref(), Some("late"));
    }

    #[test]
    fn test_equal_priority_orders_by_name() {
        let set = rules(
            r#"
name: zeta
condition: {always: true}
actions: [{route_to: z}]
---
name: alpha
condition: {always: true}
actions: [{route_to: a}]
"#,
        );
        let (req, p) = (request(), processed());
        let evaluation = evaluate(&set, &Facts::new(&req, &p));
        assert_eq!(evaluation.fired, ["alpha", "zeta"]);
        assert_eq!(evaluation.routing_group(), Some("z"));
    }

    #[test]
    fn test_fact_conditions() {
        let set = rules(
            r#"
name: etl
condition:
  all:
    - header: {name: X-Trino-Source, starts_with: airflow}
    - method: {equals: POST}
    - path: {equals: /v1/statement}
    - user: {matches: "^ali"}
    - table: {equals: hive.web.events}
    - catalog_schema: {one_of: [hive.web]}
    - default_catalog: {equals: __UNSET__}
    - not: {schema: {equals: private}}
actions:
  - route_to: etl
  - set: {key: note, value: scheduled}
"#,
        );
        let req = request();
        let p = processed();
        let evaluation = evaluate(&set, &Facts::new(&req, &p));
        assert_eq!(evaluation.routing_group(), Some("etl"));
        assert_eq!(evaluation.result.get("note").map(String::as_str), Some("scheduled"));
    }

    #[test]
    fn test_set_action_can_write_routing_group() {
        let set = rules("name: s\ncondition: {always: true}\nactions: [{set: {key: routingGroup, value: g}}]\n");
        assert_eq!(decide(&set, &processed(), &request()).as_deref(), Some("g"));
    }

    #[test]
    fn test_absent_user_only_matches_exists_false() {
        let set = rules(
            "name: anon\ncondition: {user: {exists: false}}\nactions: [{route_to: anon}]\n---\nname: named\ncondition: {user: {equals: alice}}\nactions: [{route_to: named}]\n",
        );
        let mut p = processed();
        p.user = None;
        assert_eq!(decide(&set, &p, &request()).as_deref(), Some("anon"));
    }
}
