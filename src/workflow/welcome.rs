//! Variables seeded for a new subscriber.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A variable to create alongside a new subscription.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WelcomeVariable {
    pub key: String,
    pub value: Value,
    #[serde(default)]
    pub description: Option<String>,
}

impl WelcomeVariable {
    fn new(key: &str, value: impl Into<Value>, description: &str) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
            description: Some(description.to_string()),
        }
    }
}

/// Variables used when the client does not send its own list.
pub fn default_welcome_variables(plan: &str, started_at: &str) -> Vec<WelcomeVariable> {
    vec![
        WelcomeVariable::new("welcome_message", "Welcome to neightn!", "Greeting shown on first launch"),
        WelcomeVariable::new("plan", plan, "Plan selected at signup"),
        WelcomeVariable::new("trial_started_at", started_at, "Start of the current subscription"),
    ]
}
