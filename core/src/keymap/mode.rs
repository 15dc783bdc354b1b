use serde::{Deserialize, Serialize};
use std::fmt;

/// How much the assistant may do without asking.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionMode {
    #[default]
    Default,
    Plan,
    AcceptEdits,
    BypassPermissions,
}

impl PermissionMode {
    /// Every mode, in cycling order.
    pub const ALL: [PermissionMode; 4] = [
        PermissionMode::Default,
        PermissionMode::Plan,
        PermissionMode::AcceptEdits,
        PermissionMode::BypassPermissions,
    ];

    /// The mode after this one, wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|&mode| mode == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::Plan => "plan",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
        }
    }
}

impl fmt::Display for PermissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The backend the input box is talking to.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Claude,
    Codex,
}

/// Which key combination submits the input.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SendShortcut {
    /// Enter sends, Shift+Enter inserts a newline.
    #[default]
    Enter,

    /// Ctrl/Meta+Enter sends, Enter inserts a newline.
    ModEnter,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_cycle_in_order() {
        let mut mode = PermissionMode::Default;
        let mut seen = Vec::new();

        for _ in 0..5 {
            mode = mode.next();
            seen.push(mode.as_str());
        }

        assert_eq!(seen, ["plan", "acceptEdits", "bypassPermissions", "default", "plan"]);
    }
}
