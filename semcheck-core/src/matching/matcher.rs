//! Name and record pre-filter matching

use opentelemetry_proto::tonic::common::v1::any_value;

use super::{AttributeSet, MatchDefinition, NameRule};
use crate::config::{AttributeFilter, FilterValue};

impl NameRule {
    pub fn matches(&self, name: &str) -> bool {
        match self {
            NameRule::Any => true,
            NameRule::Exact(expected) => expected == name,
            NameRule::Wildcard(pattern) => pattern.matches(name),
            NameRule::Regex(regex) => regex.is_match(name),
        }
    }
}

impl MatchDefinition {
    /// Whether this definition applies to a signal named `name`
    pub fn is_name_match(&self, name: &str) -> bool {
        self.name_rule.matches(name)
    }

    /// Whether a record passes every pre-filter entry
    ///
    /// An empty filter admits every record.
    pub fn is_attr_match(&self, record: &AttributeSet<'_>) -> bool {
        self.filter.iter().all(|filter| filter.matches(record))
    }
}

impl AttributeFilter {
    /// Presence check, plus a value comparison when a value is configured
    pub fn matches(&self, record: &AttributeSet<'_>) -> bool {
        match (record.get(&self.name), &self.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(Some(actual)), Some(expected)) => expected.matches(actual),
            (Some(None), Some(_)) => false,
        }
    }
}

impl FilterValue {
    /// Compare against a record value of the same kind
    ///
    /// Integers also compare against doubles. A string compares against the
    /// textual form of any scalar, so `"200"` matches an integer 200.
    pub fn matches(&self, actual: &any_value::Value) -> bool {
        use any_value::Value;

        match (self, actual) {
            (FilterValue::Bool(expected), Value::BoolValue(value)) => expected == value,
            (FilterValue::Int(expected), Value::IntValue(value)) => expected == value,
            (FilterValue::Int(expected), Value::DoubleValue(value)) => *expected as f64 == *value,
            (FilterValue::Double(expected), Value::DoubleValue(value)) => expected == value,
            (FilterValue::Double(expected), Value::IntValue(value)) => *expected == *value as f64,
            (FilterValue::String(expected), Value::StringValue(value)) => expected == value,
            (FilterValue::String(expected), other) => {
                scalar_text(other).is_some_and(|text| &text == expected)
            }
            _ => false,
        }
    }
}

fn scalar_text(value: &any_value::Value) -> Option<String> {
    use any_value::Value;

    match value {
        Value::BoolValue(v) => Some(v.to_string()),
        Value::IntValue(v) => Some(v.to_string()),
        Value::DoubleValue(v) => Some(v.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry_proto::tonic::common::v1::{AnyValue, KeyValue};

    fn kv(key: &str, value: any_value::Value) -> KeyValue {
        KeyValue {
            key: key.to_string(),
            value: Some(AnyValue { value: Some(value) }),
        }
    }

    fn definition(name: &str) -> MatchDefinition {
        MatchDefinition::new(NameRule::parse(name, None).unwrap(), ["a"])
    }

    #[test]
    fn test_name_rules() {
        assert!(definition("").is_name_match("anything"));
        assert!(definition("http.server.duration").is_name_match("http.server.duration"));
        assert!(!definition("http.server.duration").is_name_match("http.server.duration2"));
        assert!(definition("http.server.*").is_name_match("http.server.active_requests"));
        assert!(!definition("http.server.*").is_name_match("http.client.duration"));

        let rule = NameRule::parse("", Some("^rpc\\.(server|client)")).unwrap();
        let regex = MatchDefinition::new(rule, ["a"]);
        assert!(regex.is_name_match("rpc.server.duration"));
        assert!(!regex.is_name_match("http.rpc.server"));
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        let attrs: Vec<KeyValue> = vec![];
        assert!(definition("x").is_attr_match(&AttributeSet::from(attrs.as_slice())));
    }

    #[test]
    fn test_filter_presence_and_value() {
        use any_value::Value;

        let attrs = vec![
            kv("http.request.method", Value::StringValue("GET".to_string())),
            kv("http.response.status_code", Value::IntValue(200)),
            kv("error", Value::BoolValue(false)),
        ];
        let set = AttributeSet::from(attrs.as_slice());

        let def = definition("x")
            .with_filter(AttributeFilter {
                name: "http.request.method".to_string(),
                value: Some(FilterValue::String("GET".to_string())),
            })
            .with_filter(AttributeFilter {
                name: "http.response.status_code".to_string(),
                value: None,
            });
        assert!(def.is_attr_match(&set));

        let wrong_value = definition("x").with_filter(AttributeFilter {
            name: "http.request.method".to_string(),
            value: Some(FilterValue::String("POST".to_string())),
        });
        assert!(!wrong_value.is_attr_match(&set));

        let absent = definition("x").with_filter(AttributeFilter {
            name: "url.path".to_string(),
            value: None,
        });
        assert!(!absent.is_attr_match(&set));
    }

    #[test]
    fn test_filter_value_kinds() {
        use any_value::Value;

        assert!(FilterValue::Int(200).matches(&Value::IntValue(200)));
        assert!(FilterValue::Int(2).matches(&Value::DoubleValue(2.0)));
        assert!(FilterValue::Double(0.5).matches(&Value::DoubleValue(0.5)));
        assert!(FilterValue::Bool(false).matches(&Value::BoolValue(false)));
        assert!(!FilterValue::Bool(true).matches(&Value::StringValue("true".to_string())));

        assert!(FilterValue::String("200".to_string()).matches(&Value::IntValue(200)));
        assert!(FilterValue::String("true".to_string()).matches(&Value::BoolValue(true)));
        let bytes = Value::BytesValue(b"GET".to_vec());
        assert!(!FilterValue::String("GET".to_string()).matches(&bytes));
    }
}
