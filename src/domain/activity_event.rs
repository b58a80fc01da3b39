use serde_json::Value;

/// One entry of the activity feed that ends up in a digest.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ActivityEvent {
    #[serde(rename = "event")]
    pub kind: String,
    #[serde(rename = "user")]
    pub actor: String,
}

impl ActivityEvent {
    pub fn new(kind: impl Into<String>, actor: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            actor: actor.into(),
        }
    }

    /// Accepts both the GitHub events API shape
    /// (`{"type": "PushEvent", "actor": {"login": "octocat"}}`)
    /// and the flat shape (`{"event": "push", "user": "octocat"}`).
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let kind = value
            .get("type")
            .or_else(|| value.get("event"))
            .and_then(Value::as_str)
            .ok_or_else(|| "Missing event kind.".to_string())?;
        let actor = value
            .get("actor")
            .and_then(|actor| actor.get("login"))
            .or_else(|| value.get("user"))
            .and_then(Value::as_str)
            .ok_or_else(|| "Missing actor.".to_string())?;
        if kind.trim().is_empty() || actor.trim().is_empty() {
            return Err("Event kind and actor must not be empty.".to_string());
        }
        Ok(Self::new(kind, actor))
    }
}
