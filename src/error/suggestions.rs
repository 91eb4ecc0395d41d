//! Fix suggestions for rsm-monitor errors.
//!
//! Printed by the CLI after an error so the operator knows what to check.

// =============================================================================
// Fix Suggestion Types
// =============================================================================

/// A fix suggestion for an error.
#[derive(Debug, Clone)]
pub struct FixSuggestion {
    /// Commands to try, copy-paste ready.
    pub commands: Vec<String>,

    /// Explanation of why this error occurred.
    pub context: String,

    /// Tips to prevent this error in the future.
    pub prevention: Option<String>,
}

impl FixSuggestion {
    /// Creates a new fix suggestion with required fields.
    #[must_use]
    pub fn new(commands: Vec<String>, context: impl Into<String>) -> Self {
        Self {
            commands,
            context: context.into(),
            prevention: None,
        }
    }

    /// Builder: adds prevention tips.
    #[must_use]
    pub fn with_prevention(mut self, prevention: impl Into<String>) -> Self {
        self.prevention = Some(prevention.into());
        self
    }
}

impl std::fmt::Display for FixSuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.context)?;
        for cmd in &self.commands {
            writeln!(f, "  $ {cmd}")?;
        }
        if let Some(prevention) = &self.prevention {
            writeln!(f, "  tip: {prevention}")?;
        }
        Ok(())
    }
}

// =============================================================================
// Suggestion Generators
// =============================================================================

#[must_use]
pub fn credential_suggestions(message: &str) -> Vec<FixSuggestion> {
    vec![
        FixSuggestion::new(
            vec![
                "aws secretsmanager describe-secret --secret-id rsm-credentials".to_string(),
                "RSM_SECRET_BACKEND=file rsm-monitor run".to_string(),
            ],
            format!("The account password could not be read: {message}"),
        )
        .with_prevention(
            "The secret must be a JSON object with a \"password\" field.",
        ),
    ]
}

#[must_use]
pub fn auth_suggestions(message: &str) -> Vec<FixSuggestion> {
    let mut suggestions = vec![FixSuggestion::new(
        vec![
            "RSM_LOG=debug rsm-monitor run --strategy browser".to_string(),
        ],
        format!("Portal login did not yield a bearer token: {message}"),
    )];

    if message.contains("interactive capture") {
        suggestions.push(FixSuggestion::new(
            vec!["RSM_AUTH_STRATEGY=browser rsm-monitor run".to_string()],
            "The direct HTTP login cannot see tokens issued inside the portal's single-page app.",
        ));
    }

    if message.to_lowercase().contains("chromedriver") || message.contains("WebDriver") {
        suggestions.push(
            FixSuggestion::new(
                vec![
                    "chromedriver --port=9515".to_string(),
                    "RSM_WEBDRIVER_URL=http://localhost:9515 rsm-monitor run".to_string(),
                ],
                "A WebDriver server is required for browser capture.",
            )
            .with_prevention("Set RSM_CHROMEDRIVER to the chromedriver binary path."),
        );
    }

    suggestions
}

#[must_use]
pub fn transport_suggestions(message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["curl -sI https://parents.mathschool.com/parent-portal/".to_string()],
        format!("The portal session failed mid-harvest: {message}"),
    )
    .with_prevention("An expired token aborts the harvest; re-run to log in again.")]
}

#[must_use]
pub fn timeout_suggestions(seconds: u64) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("RSM_TIMEOUT={} rsm-monitor run", seconds * 2)],
        format!("A portal request did not complete within {seconds}s."),
    )]
}

#[must_use]
pub fn config_parse_suggestions(path: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec![format!("$EDITOR {path}"), "rsm-monitor config".to_string()],
        format!("The config file could not be parsed: {message}"),
    )]
}

#[must_use]
pub fn config_invalid_suggestions(key: &str, value: &str, message: &str) -> Vec<FixSuggestion> {
    vec![FixSuggestion::new(
        vec!["rsm-monitor config".to_string()],
        format!("'{key}' = {value} is not valid: {message}"),
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_suggestions_mention_browser_for_cookie_fallback() {
        let suggestions = auth_suggestions("token extraction requires interactive capture");
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions[1].commands[0].contains("browser"));
    }

    #[test]
    fn display_lists_commands() {
        let text = FixSuggestion::new(vec!["a".to_string()], "ctx")
            .with_prevention("tip")
            .to_string();
        assert!(text.contains("ctx"));
        assert!(text.contains("$ a"));
        assert!(text.contains("tip: tip"));
    }
}
