//! Tests for schema types.

use super::*;
use copilot_core::EntryStatus;

const HIGH_VALUE_RULE_JSON: &str = r#"{
    "id": "r001",
    "field": "amount",
    "condition": "greater_than",
    "value": 1000,
    "message": "High value transaction requires manager approval",
    "domain": "risk",
    "tags": ["approval", "threshold"],
    "owner": "admin@company.com",
    "createdAt": "2024-11-15T10:00:00Z",
    "status": "active",
    "appliesToStatus": ["draft", "pending"]
}"#;

const MINIMAL_RULE_YAML: &str = r#"
id: voided-no-memo
field: memo
condition: equals
message: Voided entry without memo
status: inactive
appliesToStatus: [voided]
"#;

#[test]
fn parse_full_rule_json() {
    let rule: DeclarativeRule = serde_json::from_str(HIGH_VALUE_RULE_JSON).unwrap();

    assert_eq!(rule.id, "r001");
    assert_eq!(rule.field, "amount");
    assert_eq!(rule.condition, ConditionOp::GreaterThan);
    assert_eq!(rule.value, serde_json::json!(1000));
    assert_eq!(rule.domain, Some(RuleDomain::Risk));
    assert_eq!(rule.owner.as_deref(), Some("admin@company.com"));
    assert_eq!(rule.created_at.as_deref(), Some("2024-11-15T10:00:00Z"));
    assert!(rule.is_active());
    assert_eq!(
        rule.applies_to_status,
        Some(vec![EntryStatus::Draft, EntryStatus::Pending])
    );
    assert_eq!(rule.version, 1);
    assert!(rule.history.is_empty());
}

#[test]
fn parse_minimal_rule_yaml() {
    let rule: DeclarativeRule = serde_yaml::from_str(MINIMAL_RULE_YAML).unwrap();

    assert_eq!(rule.condition, ConditionOp::Equals);
    assert_eq!(rule.value, serde_json::Value::Null);
    assert_eq!(rule.status, RuleStatus::Inactive);
    assert!(rule.domain.is_none());
    assert!(rule.applies_to(EntryStatus::Voided));
    assert!(!rule.applies_to(EntryStatus::Posted));
}

#[test]
fn unknown_condition_parses_as_unsupported() {
    let json = HIGH_VALUE_RULE_JSON.replace("greater_than", "contains");
    let rule: DeclarativeRule = serde_json::from_str(&json).unwrap();

    assert_eq!(rule.condition, ConditionOp::Unsupported("contains".to_string()));
    assert!(!rule.condition.is_supported());
}

#[test]
fn condition_serializes_back_to_wire_name() {
    for name in ConditionOp::SUPPORTED {
        let op: ConditionOp = serde_json::from_str(&format!("\"{name}\"")).unwrap();
        assert_eq!(serde_json::to_string(&op).unwrap(), format!("\"{name}\""));
    }
    let odd = ConditionOp::Unsupported(">=".to_string());
    assert_eq!(serde_json::to_string(&odd).unwrap(), "\">=\"");
}

#[test]
fn strict_condition_parse_rejects_unknown() {
    assert_eq!("includes".parse::<ConditionOp>(), Ok(ConditionOp::Includes));
    assert!("matches".parse::<ConditionOp>().is_err());
}

#[test]
fn missing_required_field_is_an_error() {
    let err = serde_json::from_str::<DeclarativeRule>(r#"{"id":"r1","field":"amount"}"#);
    assert!(err.is_err());
}

#[test]
fn unknown_rule_status_is_an_error() {
    let json = HIGH_VALUE_RULE_JSON.replace("\"active\"", "\"paused\"");
    assert!(serde_json::from_str::<DeclarativeRule>(&json).is_err());
}

#[test]
fn serialize_omits_absent_optionals() {
    let rule = DeclarativeRule::new(
        "r1",
        "amount",
        ConditionOp::GreaterThan,
        serde_json::json!(1000),
        "big",
    );
    let value = serde_json::to_value(&rule).unwrap();
    let obj = value.as_object().unwrap();

    let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["condition", "field", "id", "message", "status", "value"]);
}

#[test]
fn flag_json_uses_camel_case() {
    let created = "2024-12-10T09:35:00Z".parse().unwrap();
    let flag = CopilotFlag::open(flag_id(DECLARATIVE_NAMESPACE, "r001", "j005"), "j005", "big", created);
    let value = serde_json::to_value(&flag).unwrap();

    assert_eq!(value["id"], "json::r001::j005");
    assert_eq!(value["entryId"], "j005");
    assert_eq!(value["status"], "open");
    assert_eq!(value["createdAt"], "2024-12-10T09:35:00Z");
    assert!(value.get("reviewedBy").is_none());
    assert!(value.get("reviewedAt").is_none());
}

#[test]
fn reviewed_flag_round_trips() {
    let json = r#"{
        "id": "rule::voidnote::ent-004",
        "entryId": "ent-004",
        "message": "Voided entry lacks reason note",
        "status": "dismissed",
        "createdAt": "2024-12-12T08:05:00Z",
        "reviewedBy": "admin@company.com",
        "reviewedAt": "2024-12-12T16:50:00Z"
    }"#;
    let flag: CopilotFlag = serde_json::from_str(json).unwrap();

    assert_eq!(flag.status, FlagStatus::Dismissed);
    assert!(flag.status.is_reviewed());
    assert_eq!(flag.reviewed_by.as_deref(), Some("admin@company.com"));
}

#[test]
fn flag_status_parse() {
    assert_eq!("resolved".parse::<FlagStatus>(), Ok(FlagStatus::Resolved));
    assert!("closed".parse::<FlagStatus>().is_err());
}

#[test]
fn snapshot_drops_history() {
    let mut rule = DeclarativeRule::new("r1", "memo", ConditionOp::Equals, serde_json::json!(""), "m");
    let snapshot = Box::new(rule.snapshot());
    rule.history.push(RuleHistory {
        version: 1,
        timestamp: chrono::Utc::now(),
        actor: "a".to_string(),
        comment: None,
        snapshot,
    });
    assert!(rule.snapshot().history.is_empty());
}
