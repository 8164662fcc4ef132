//! The radio state machine driven by the per-node air module.

use std::fmt;

/// State of a node's half-duplex radio.
///
/// The air module drives the transitions; carrier-sense protocols and MAC
/// layers only inspect the current value.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RadioState {
    /// Powered down.  All arriving signals are dropped.
    Off,
    /// Idle and able to accept an incoming transmission.
    #[default]
    Listening,
    /// At least one transmission is currently being received.
    Receiving,
    /// The node's own transmission is on the air.
    Sending,
    /// A reception just completed and the MAC demanded an immediate
    /// follow-up transmission (e.g. a CTS reply); the radio must not fall
    /// back to `Listening` in between.
    WillSend,
}

impl RadioState {
    /// `true` if a new incoming transmission may begin in this state.
    #[inline]
    pub fn can_receive(self) -> bool {
        matches!(self, RadioState::Listening | RadioState::Receiving)
    }

    #[inline]
    pub fn is_sending(self) -> bool {
        self == RadioState::Sending
    }
}

impl fmt::Display for RadioState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RadioState::Off       => "off",
            RadioState::Listening => "listening",
            RadioState::Receiving => "receiving",
            RadioState::Sending   => "sending",
            RadioState::WillSend  => "will-send",
        };
        f.write_str(s)
    }
}
