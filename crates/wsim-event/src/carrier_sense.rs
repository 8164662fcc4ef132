//! Generic carrier-sense registration records and outcomes.

use wsim_packet::Address;

/// One registration in the generic carrier-sense protocol.
///
/// Lives in the air module's unfinished list until resolved or superseded.
/// The two flags are independent:
///
/// - `negative` — sense for the channel becoming *free* rather than busy.
/// - `virtual_sense` — count the node's own outgoing transmission as "busy"
///   instead of rejecting the request outright while sending.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CarrierSenseInformation {
    /// Assigned by the air module at registration; identifies this request in
    /// later `DurationEnd`/`FreeCheck` envelopes so a resolved registration
    /// turns them into no-ops.
    pub id: u64,
    /// Where the result must be delivered.
    pub registrant: Address,
    /// How long a regular sense listens before reporting "no carrier".
    pub duration_secs: f64,
    pub negative: bool,
    pub virtual_sense: bool,
}

/// Resolution of a carrier-sense request (either protocol).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum CarrierSenseOutcome {
    /// A signal (or, in virtual mode, the node's own transmission) was
    /// detected on the medium.
    CarrierDetected,
    /// The medium stayed (regular) or became (negative) free.
    NoCarrier,
    /// The registration was invalid in the current radio state.
    Failed,
}

impl CarrierSenseOutcome {
    /// `true` if the MAC is cleared to transmit.
    #[inline]
    pub fn medium_free(self) -> bool {
        self == CarrierSenseOutcome::NoCarrier
    }
}
