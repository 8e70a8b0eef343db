//! Role-playing system prompts

use std::fmt;

/// Role, goal and backstory rendered as a system prompt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Persona {
    /// Who the model plays
    pub role: String,
    /// What it is trying to achieve
    pub goal: String,
    /// Background shaping its tone
    pub backstory: String,
}

impl Persona {
    /// Create a persona
    #[must_use]
    pub fn new(role: impl Into<String>, goal: impl Into<String>, backstory: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            goal: goal.into(),
            backstory: backstory.into(),
        }
    }

    /// Render as a system prompt
    #[must_use]
    pub fn system_prompt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "You are {}. {}\n\nYour goal: {}",
            self.role, self.backstory, self.goal
        )
    }
}
