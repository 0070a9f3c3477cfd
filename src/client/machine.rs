//! Connection lifecycle as an explicit finite-state machine.
//!
//! ```text
//! Disconnected --BeginConnect--> Connecting --Established--> Connected
//!      ^                             |                           |
//!      +------------Lost-------------+-----------Lost------------+
//!
//! any live state --Stop--> Stopped (terminal)
//! ```

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    /// Disconnected for good: the client was stopped and will not retry.
    Stopped,
}

/// Inputs that move the machine between states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Start opening the push channel.
    BeginConnect,
    /// Handshake and subscribe both succeeded.
    Established,
    /// The handshake failed or an open channel closed.
    Lost,
    Stop,
}

impl ConnectionState {
    /// Next state for `transition`, or `None` when it does not apply here.
    pub fn apply(self, transition: Transition) -> Option<ConnectionState> {
        use ConnectionState::*;
        use Transition::*;
        match (self, transition) {
            (Stopped, _) => None,
            (_, Stop) => Some(Stopped),
            (Disconnected, BeginConnect) => Some(Connecting),
            (Connecting, Established) => Some(Connected),
            (Connecting | Connected, Lost) => Some(Disconnected),
            _ => None,
        }
    }

    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    pub fn is_terminal(self) -> bool {
        self == ConnectionState::Stopped
    }
}

impl From<ConnectionState> for u8 {
    fn from(state: ConnectionState) -> Self {
        match state {
            ConnectionState::Disconnected => 0,
            ConnectionState::Connecting => 1,
            ConnectionState::Connected => 2,
            ConnectionState::Stopped => 3,
        }
    }
}

impl From<u8> for ConnectionState {
    fn from(raw: u8) -> Self {
        match raw {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            3 => ConnectionState::Stopped,
            _ => ConnectionState::Disconnected,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::ConnectionState::*;
    use super::Transition::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Disconnected, BeginConnect, Some(Connecting))]
    #[case(Connecting, Established, Some(Connected))]
    #[case(Connecting, Lost, Some(Disconnected))]
    #[case(Connected, Lost, Some(Disconnected))]
    #[case(Connected, BeginConnect, None)]
    #[case(Connecting, BeginConnect, None)]
    #[case(Disconnected, Lost, None)]
    #[case(Disconnected, Established, None)]
    #[case(Connected, Stop, Some(Stopped))]
    #[case(Disconnected, Stop, Some(Stopped))]
    #[case(Stopped, BeginConnect, None)]
    #[case(Stopped, Stop, None)]
    fn transitions(
        #[case] from: ConnectionState,
        #[case] transition: Transition,
        #[case] expected: Option<ConnectionState>,
    ) {
        assert_eq!(from.apply(transition), expected);
    }

    #[rstest]
    fn round_trips_through_u8() {
        for state in [Disconnected, Connecting, Connected, Stopped] {
            assert_eq!(ConnectionState::from(u8::from(state)), state);
        }
    }

    #[rstest]
    fn only_connected_reports_connected() {
        assert!(Connected.is_connected());
        assert!(!Connecting.is_connected());
        assert!(!Stopped.is_connected());
        assert!(Stopped.is_terminal());
    }
}
