use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Continuous-movement command understood by the platform.
///
/// Rendered with `Display` into the platform's text form (`"move 0.1"`).
/// Anything unrecognised by `FromStr` survives as `Raw` and is sent verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCommand {
    /// Forward/backward velocity in [-1, 1]
    Move(f64),
    /// Sideways velocity in [-1, 1], positive to the right
    Strafe(f64),
    /// Turn rate in [-1, 1], scaled by the mission's turn speed
    Turn(f64),
    Pitch(f64),
    Jump(bool),
    Crouch(bool),
    Attack(bool),
    Use(bool),
    Raw(String),
}

impl AgentCommand {
    /// Parse platform command text. Never fails: unknown text becomes `Raw`.
    pub fn parse(text: &str) -> Self {
        let raw = || AgentCommand::Raw(text.to_string());
        let mut parts = text.split_whitespace();
        let (Some(verb), Some(arg), None) = (parts.next(), parts.next(), parts.next()) else {
            return raw();
        };

        let velocity = arg.parse::<f64>().ok();
        let toggle = match arg {
            "0" => Some(false),
            "1" => Some(true),
            _ => None,
        };

        match (verb, velocity, toggle) {
            ("move", Some(v), _) => AgentCommand::Move(v),
            ("strafe", Some(v), _) => AgentCommand::Strafe(v),
            ("turn", Some(v), _) => AgentCommand::Turn(v),
            ("pitch", Some(v), _) => AgentCommand::Pitch(v),
            ("jump", _, Some(on)) => AgentCommand::Jump(on),
            ("crouch", _, Some(on)) => AgentCommand::Crouch(on),
            ("attack", _, Some(on)) => AgentCommand::Attack(on),
            ("use", _, Some(on)) => AgentCommand::Use(on),
            _ => raw(),
        }
    }

    pub fn verb(&self) -> &str {
        match self {
            AgentCommand::Move(_) => "move",
            AgentCommand::Strafe(_) => "strafe",
            AgentCommand::Turn(_) => "turn",
            AgentCommand::Pitch(_) => "pitch",
            AgentCommand::Jump(_) => "jump",
            AgentCommand::Crouch(_) => "crouch",
            AgentCommand::Attack(_) => "attack",
            AgentCommand::Use(_) => "use",
            AgentCommand::Raw(text) => text.split_whitespace().next().unwrap_or(""),
        }
    }
}

impl fmt::Display for AgentCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentCommand::Move(v)
            | AgentCommand::Strafe(v)
            | AgentCommand::Turn(v)
            | AgentCommand::Pitch(v) => write!(f, "{} {}", self.verb(), v),
            AgentCommand::Jump(on)
            | AgentCommand::Crouch(on)
            | AgentCommand::Attack(on)
            | AgentCommand::Use(on) => write!(f, "{} {}", self.verb(), u8::from(*on)),
            AgentCommand::Raw(text) => f.write_str(text),
        }
    }
}

impl FromStr for AgentCommand {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(AgentCommand::parse(s))
    }
}

/// How the agent picks commands for each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Even action index moves forward, odd strafes
    #[default]
    Alternate,
    /// Move and strafe on every cycle
    Simultaneous,
}

impl ActionPolicy {
    /// Commands for the given zero-based action index.
    pub fn commands_for(&self, action_index: u64, velocity: f64) -> Vec<AgentCommand> {
        match self {
            ActionPolicy::Alternate => {
                if action_index % 2 == 0 {
                    vec![AgentCommand::Move(velocity)]
                } else {
                    vec![AgentCommand::Strafe(velocity)]
                }
            }
            ActionPolicy::Simultaneous => {
                vec![AgentCommand::Move(velocity), AgentCommand::Strafe(velocity)]
            }
        }
    }
}

impl FromStr for ActionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "alternate" => Ok(ActionPolicy::Alternate),
            "simultaneous" => Ok(ActionPolicy::Simultaneous),
            other => Err(format!(
                "unknown action policy '{}', expected 'alternate' or 'simultaneous'",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_text() {
        assert_eq!(AgentCommand::Move(0.1).to_string(), "move 0.1");
        assert_eq!(AgentCommand::Strafe(-1.0).to_string(), "strafe -1");
        assert_eq!(AgentCommand::Jump(true).to_string(), "jump 1");
        assert_eq!(AgentCommand::Use(false).to_string(), "use 0");
        assert_eq!(AgentCommand::Raw("chat hello".into()).to_string(), "chat hello");
    }

    #[test]
    fn test_parse_known_and_unknown() {
        assert_eq!("move 0.1".parse::<AgentCommand>().unwrap(), AgentCommand::Move(0.1));
        assert_eq!("turn -0.5".parse::<AgentCommand>().unwrap(), AgentCommand::Turn(-0.5));
        assert_eq!("crouch 1".parse::<AgentCommand>().unwrap(), AgentCommand::Crouch(true));
        assert_eq!(
            "jump maybe".parse::<AgentCommand>().unwrap(),
            AgentCommand::Raw("jump maybe".into())
        );
        assert_eq!(
            "chat hello world".parse::<AgentCommand>().unwrap(),
            AgentCommand::Raw("chat hello world".into())
        );
    }

    #[test]
    fn test_alternate_parity() {
        let policy = ActionPolicy::Alternate;
        let verbs: Vec<String> = (0..4)
            .flat_map(|i| policy.commands_for(i, 0.1))
            .map(|c| c.verb().to_string())
            .collect();
        assert_eq!(verbs, vec!["move", "strafe", "move", "strafe"]);
    }

    #[test]
    fn test_simultaneous_sends_both() {
        let commands = ActionPolicy::Simultaneous.commands_for(7, 0.25);
        assert_eq!(
            commands,
            vec![AgentCommand::Move(0.25), AgentCommand::Strafe(0.25)]
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("Alternate".parse::<ActionPolicy>(), Ok(ActionPolicy::Alternate));
        assert_eq!(
            "simultaneous".parse::<ActionPolicy>(),
            Ok(ActionPolicy::Simultaneous)
        );
        assert!("random".parse::<ActionPolicy>().is_err());
    }
}
