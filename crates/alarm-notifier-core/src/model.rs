use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DecodeError;

// ---------------------------------------------------------------------------
// AlarmEvent
// ---------------------------------------------------------------------------

/// A CloudWatch alarm state change, as published to SNS.
///
/// Decoding is permissive: keys match case-insensitively, a field holding the
/// wrong JSON type falls back to its zero value and the remaining fields are
/// still read. Field renames are therefore lowercase.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlarmEvent {
    #[serde(rename = "alarmname", deserialize_with = "lenient")]
    pub alarm_name: String,

    #[serde(rename = "alarmdescription", deserialize_with = "lenient")]
    pub alarm_description: String,

    #[serde(rename = "awsaccountid", deserialize_with = "lenient")]
    pub aws_account_id: String,

    /// `OK`, `ALARM`, `INSUFFICIENT_DATA`, or anything else CloudWatch sends.
    #[serde(rename = "newstatevalue", deserialize_with = "lenient")]
    pub new_state_value: String,

    #[serde(rename = "newstatereason", deserialize_with = "lenient")]
    pub new_state_reason: String,

    #[serde(rename = "statechangetime", deserialize_with = "lenient")]
    pub state_change_time: String,

    #[serde(rename = "region", deserialize_with = "lenient")]
    pub region: String,

    #[serde(rename = "oldstatevalue", deserialize_with = "lenient")]
    pub old_state_value: String,

    #[serde(rename = "trigger", deserialize_with = "lenient")]
    pub trigger: Trigger,
}

/// The threshold rule that fired the alarm.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Trigger {
    /// Evaluation period length in seconds.
    #[serde(rename = "period", deserialize_with = "lenient")]
    pub period: i64,

    #[serde(rename = "evaluationperiods", deserialize_with = "lenient")]
    pub evaluation_periods: i64,

    #[serde(rename = "comparisonoperator", deserialize_with = "lenient")]
    pub comparison_operator: String,

    #[serde(rename = "threshold", deserialize_with = "lenient")]
    pub threshold: f32,
}

impl AlarmEvent {
    /// Decode an SNS message body.
    ///
    /// Only the first JSON value in the body is read; anything after it is
    /// ignored. Fails only when that value is missing, malformed, or not an
    /// object. Individual fields never fail the decode.
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let value = serde_json::Deserializer::from_str(body)
            .into_iter::<serde_json::Value>()
            .next()
            .ok_or(DecodeError::Empty)??;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        Ok(Self::deserialize(lowercase_keys(value))?)
    }

    /// Display severity derived from the new state.
    pub fn severity(&self) -> Severity {
        Severity::from_state(&self.new_state_value)
    }
}

/// Lowercase every object key, recursively. A later key wins over an earlier
/// one that folds to the same name.
fn lowercase_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k.to_lowercase(), lowercase_keys(v)))
                .collect(),
        ),
        other => other,
    }
}

/// Deserialize `T`, substituting `T::default()` when the value has the wrong shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Severity (derived, not transmitted by CloudWatch)
// ---------------------------------------------------------------------------

/// Attachment color tag, serialized as the Slack color keyword.
///
/// - `Danger`: new state is `ALARM`
/// - `Warning`: new state is `INSUFFICIENT_DATA`
/// - `Good`: anything else, `OK` and unknown values included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Good,
    Warning,
    Danger,
}

impl Severity {
    pub fn from_state(state: &str) -> Self {
        match state {
            "ALARM" => Self::Danger,
            "INSUFFICIENT_DATA" => Self::Warning,
            _ => Self::Good,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALARM_BODY: &str = r#"{
        "AlarmName": "api-5xx",
        "AlarmDescription": "Too many server errors",
        "AWSAccountId": "123456789012",
        "NewStateValue": "ALARM",
        "NewStateReason": "Threshold Crossed: 1 datapoint [12.0] was greater than the threshold (10.0).",
        "StateChangeTime": "2024-05-01T12:00:00.000+0000",
        "Region": "EU (Ireland)",
        "OldStateValue": "OK",
        "Trigger": {
            "MetricName": "5XXError",
            "Period": 300,
            "EvaluationPeriods": 1,
            "ComparisonOperator": "GreaterThanThreshold",
            "Threshold": 10.0
        }
    }"#;

    // -- Severity tests --

    #[test]
    fn severity_alarm_is_danger() {
        assert_eq!(Severity::from_state("ALARM"), Severity::Danger);
    }

    #[test]
    fn severity_insufficient_data_is_warning() {
        assert_eq!(Severity::from_state("INSUFFICIENT_DATA"), Severity::Warning);
    }

    #[test]
    fn severity_everything_else_is_good() {
        for state in ["OK", "", "alarm", "UNKNOWN", " ALARM"] {
            assert_eq!(Severity::from_state(state), Severity::Good, "{state:?}");
        }
    }

    #[test]
    fn severity_serializes_as_slack_color() {
        assert_eq!(serde_json::to_value(Severity::Good).unwrap(), "good");
        assert_eq!(serde_json::to_value(Severity::Warning).unwrap(), "warning");
        assert_eq!(serde_json::to_value(Severity::Danger).unwrap(), "danger");
    }

    // -- Decode tests --

    #[test]
    fn decodes_full_event() {
        let event = AlarmEvent::decode(ALARM_BODY).unwrap();
        assert_eq!(event.alarm_name, "api-5xx");
        assert_eq!(event.aws_account_id, "123456789012");
        assert_eq!(event.region, "EU (Ireland)");
        assert_eq!(event.old_state_value, "OK");
        assert_eq!(event.severity(), Severity::Danger);
        assert_eq!(
            event.trigger,
            Trigger {
                period: 300,
                evaluation_periods: 1,
                comparison_operator: "GreaterThanThreshold".into(),
                threshold: 10.0,
            }
        );
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            AlarmEvent::decode("not json"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(AlarmEvent::decode(""), Err(DecodeError::Empty)));
        assert!(matches!(AlarmEvent::decode("  \n"), Err(DecodeError::Empty)));
    }

    #[test]
    fn ignores_text_after_first_value() {
        let body = "{\"NewStateValue\":\"ALARM\",\"Region\":\"us-east-1\"}\n--\nsent via relay";
        let event = AlarmEvent::decode(body).unwrap();
        assert_eq!(event.severity(), Severity::Danger);
        assert_eq!(event.region, "us-east-1");
    }

    #[test]
    fn keys_match_case_insensitively() {
        let body = r#"{
            "newstatevalue": "ALARM",
            "REGION": "eu-north-1",
            "AwsAccountId": "210987654321",
            "trigger": { "PERIOD": 120, "threshold": 4 }
        }"#;
        let event = AlarmEvent::decode(body).unwrap();
        assert_eq!(event.severity(), Severity::Danger);
        assert_eq!(event.region, "eu-north-1");
        assert_eq!(event.aws_account_id, "210987654321");
        assert_eq!(event.trigger.period, 120);
        assert_eq!(event.trigger.threshold, 4.0);
    }

    #[test]
    fn later_key_wins_when_case_folds_collide() {
        let event = AlarmEvent::decode(r#"{"Region": "a", "region": "b"}"#).unwrap();
        assert_eq!(event.region, "b");
    }

    #[test]
    fn rejects_non_object() {
        assert!(matches!(
            AlarmEvent::decode("[1, 2, 3]"),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn missing_fields_default() {
        let event = AlarmEvent::decode(r#"{"NewStateValue": "OK"}"#).unwrap();
        assert_eq!(event.new_state_value, "OK");
        assert_eq!(event.alarm_name, "");
        assert_eq!(event.trigger, Trigger::default());
    }

    #[test]
    fn mistyped_field_defaults_and_keeps_others() {
        let body = r#"{
            "AWSAccountId": 123456789012,
            "Region": "us-east-1",
            "Trigger": { "Period": "five minutes", "Threshold": 2.5 }
        }"#;
        let event = AlarmEvent::decode(body).unwrap();
        assert_eq!(event.aws_account_id, "");
        assert_eq!(event.region, "us-east-1");
        assert_eq!(event.trigger.period, 0);
        assert_eq!(event.trigger.threshold, 2.5);
    }

    #[test]
    fn mistyped_trigger_defaults() {
        let event = AlarmEvent::decode(r#"{"Trigger": "none", "Region": "eu-west-1"}"#).unwrap();
        assert_eq!(event.trigger, Trigger::default());
        assert_eq!(event.region, "eu-west-1");
    }
}
