//! Sprint field decoding.
//!
//! Older Jira servers encode the sprint custom field as a single string:
//!
//! ```text
//! com.atlassian.greenhopper.service.sprint.Sprint@6316c6c0[id=1387,rapidViewId=454,state=CLOSED,name=Week 30-31,startDate=2018-07-23T12:42:06.058Z,endDate=2018-08-06T12:42:00.000Z,completeDate=2018-08-06T07:57:14.389Z,sequence=1387,goal=]
//! ```
//!
//! Newer ones return JSON objects. Either form may arrive wrapped in a list,
//! in which case only the first element (the current sprint) is used.
//! Malformed values are common and never fatal: they are logged and treated
//! as "no sprint".

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SprintState {
    Active,
    Closed,
    Future,
}

impl FromStr for SprintState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(SprintState::Active),
            "CLOSED" => Ok(SprintState::Closed),
            "FUTURE" => Ok(SprintState::Future),
            other => Err(format!("unknown sprint state '{}'", other)),
        }
    }
}

impl fmt::Display for SprintState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SprintState::Active => "ACTIVE",
            SprintState::Closed => "CLOSED",
            SprintState::Future => "FUTURE",
        };
        write!(f, "{}", s)
    }
}

/// Structured sprint record. Dates are forwarded verbatim as strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SprintDescriptor {
    pub name: String,
    pub start: String,
    pub end: String,
    pub state: Option<SprintState>,
}

impl SprintDescriptor {
    fn from_pairs(pairs: &HashMap<String, String>) -> Self {
        let field = |key: &str| {
            pairs
                .get(key)
                .map(|v| v.trim())
                .filter(|v| *v != "<null>")
                .unwrap_or_default()
                .to_string()
        };

        let state = pairs.get("state").and_then(|raw| match raw.parse() {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::debug!(error = %e, "sprint state ignored");
                None
            }
        });

        Self {
            name: field("name"),
            start: field("startDate"),
            end: field("endDate"),
            state,
        }
    }

    pub fn state_label(&self) -> String {
        self.state.map(|s| s.to_string()).unwrap_or_default()
    }
}

/// Decodes a raw sprint field value of any supported shape.
pub fn parse_sprint(raw: &Value) -> Option<SprintDescriptor> {
    match raw {
        Value::Null => None,
        Value::String(s) => parse_sprint_str(s),
        Value::Array(items) => match items.first() {
            Some(Value::Array(_)) | None => None,
            Some(first) => parse_sprint(first),
        },
        Value::Object(map) => {
            let pairs: HashMap<String, String> = map
                .iter()
                .filter_map(|(k, v)| match v {
                    Value::String(s) => Some((k.clone(), s.clone())),
                    Value::Number(n) => Some((k.clone(), n.to_string())),
                    _ => None,
                })
                .collect();
            if !pairs.contains_key("name") {
                tracing::warn!(sprint = %raw, "sprint object without a name");
                return None;
            }
            Some(SprintDescriptor::from_pairs(&pairs))
        }
        other => {
            tracing::warn!(sprint = %other, "unsupported sprint field value");
            None
        }
    }
}

/// Decodes the legacy `Sprint@hash[key=value,...]` encoding.
pub fn parse_sprint_str(raw: &str) -> Option<SprintDescriptor> {
    if raw.trim().is_empty() {
        return None;
    }

    let (open, close) = match (raw.find('['), raw.find(']')) {
        (Some(open), Some(close)) if open < close => (open, close),
        _ => {
            tracing::warn!(sprint = raw, "sprint value has no [..] section");
            return None;
        }
    };

    let mut pairs = HashMap::new();
    for pair in raw[open + 1..close].split(',') {
        let parts: Vec<&str> = pair.split('=').collect();
        match parts.as_slice() {
            [key, value] => {
                pairs.insert(key.trim().to_string(), value.to_string());
            }
            _ => {
                tracing::warn!(sprint = raw, pair, "malformed sprint key=value pair");
                return None;
            }
        }
    }

    Some(SprintDescriptor::from_pairs(&pairs))
}
