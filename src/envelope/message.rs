//! # Envelope: the routed message value.
//!
//! An [`Envelope`] is owned by exactly one actor at a time: whoever popped it
//! from the bus may rewrite it in place and push it back (a bounce or a
//! shutdown confirmation reuses the envelope it answers).
//!
//! ## Example
//! ```rust
//! use actionbus::{Address, Envelope};
//!
//! let env = Envelope::new(Address::new(999), Address::new(1), "PRINT hi");
//! let back = env.bounce(Address::new(0));
//!
//! assert_eq!(back.target, Address::new(1));
//! assert_eq!(back.origin, Address::new(0));
//! assert_eq!(back.error_count, 1);
//! assert_eq!(back.payload, "PRINT hi UNRESOLVED 999");
//! ```

use std::fmt;

use crate::address::Address;

use super::command::Command;

/// Marker appended to the payload of an envelope whose target could not be
/// resolved, followed by the unresolved target.
pub const ERROR_MARKER: &str = " UNRESOLVED ";

/// Message routed through the bus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Envelope {
    /// Address of the router that should handle the payload.
    pub target: Address,
    /// Address of the sender; bounces and replies go here.
    pub origin: Address,
    /// Free-form command text, see [`Command`].
    pub payload: String,
    /// How many times this envelope has been bounced.
    pub error_count: u32,
    /// Sender waits for an answer.
    pub expects_reply: bool,
}

impl Envelope {
    /// Creates a fresh envelope with `error_count = 0` and no reply expected.
    pub fn new(target: Address, origin: Address, payload: impl Into<String>) -> Self {
        Self {
            target,
            origin,
            payload: payload.into(),
            error_count: 0,
            expects_reply: false,
        }
    }

    /// Marks that the sender expects an answer.
    #[inline]
    #[must_use]
    pub fn expecting_reply(mut self) -> Self {
        self.expects_reply = true;
        self
    }

    /// Parses the payload into a [`Command`] borrowing from it.
    #[inline]
    pub fn command(&self) -> Command<'_> {
        Command::parse(&self.payload)
    }

    /// True once the envelope has been bounced at least once.
    #[inline]
    pub fn is_bounce(&self) -> bool {
        self.error_count > 0
    }

    /// True iff both ends are assigned; only such envelopes may be enqueued
    /// by well-behaved senders.
    #[inline]
    pub fn is_addressed(&self) -> bool {
        self.target.is_assigned() && self.origin.is_assigned()
    }

    /// Rewrites an unresolvable envelope so it travels back to its origin.
    ///
    /// Appends [`ERROR_MARKER`] and the unresolved target to the payload,
    /// sets `target := origin`, `origin := from` and increments
    /// `error_count`.
    #[must_use]
    pub fn bounce(mut self, from: Address) -> Self {
        let unresolved = self.target;
        self.payload.push_str(ERROR_MARKER);
        self.payload.push_str(&unresolved.to_string());
        self.target = self.origin;
        self.origin = from;
        self.error_count = self.error_count.saturating_add(1);
        self
    }

    /// Rewrites the envelope into an answer sent back to its origin.
    ///
    /// Used for acknowledgements such as `SHUTDOWN_COMPLETE`; the error
    /// counter is kept.
    #[must_use]
    pub fn answer(mut self, from: Address, payload: impl Into<String>) -> Self {
        self.target = self.origin;
        self.origin = from;
        self.payload = payload.into();
        self.expects_reply = false;
        self
    }

    /// Builds a fresh envelope addressed to this envelope's origin.
    pub fn reply(&self, from: Address, payload: impl Into<String>) -> Self {
        Envelope::new(self.origin, from, payload)
    }
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [{:?}] errors={}",
            self.origin, self.target, self.payload, self.error_count
        )?;
        if self.expects_reply {
            f.write_str(" reply")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounce_swaps_ends_and_counts() {
        let env = Envelope::new(Address::new(999), Address::new(1), "PING");
        let back = env.bounce(Address::new(0));

        assert_eq!(back.target, Address::new(1));
        assert_eq!(back.origin, Address::new(0));
        assert_eq!(back.error_count, 1);
        assert_eq!(back.payload, "PING UNRESOLVED 999");
        assert!(back.is_bounce());

        let twice = back.bounce(Address::new(5));
        assert_eq!(twice.error_count, 2);
        assert_eq!(twice.target, Address::new(0));
        assert_eq!(twice.payload, "PING UNRESOLVED 999 UNRESOLVED 1");
    }

    #[test]
    fn test_answer_reuses_envelope() {
        let env = Envelope::new(Address::new(1), Address::new(0), "SHUTDOWN").expecting_reply();
        let ack = env.answer(Address::new(1), "SHUTDOWN_COMPLETE");
        assert_eq!(ack.target, Address::new(0));
        assert_eq!(ack.origin, Address::new(1));
        assert_eq!(ack.payload, "SHUTDOWN_COMPLETE");
        assert!(!ack.expects_reply);
    }

    #[test]
    fn test_reply_is_fresh() {
        let env = Envelope::new(Address::new(210), Address::new(110), "GET_PATH_TO AUTO");
        let r = env.reply(Address::new(210), "PATH AUTO /tmp");
        assert_eq!(r.target, Address::new(110));
        assert_eq!(r.origin, Address::new(210));
        assert_eq!(r.error_count, 0);
    }

    #[test]
    fn test_is_addressed() {
        assert!(Envelope::new(Address::new(0), Address::new(3), "").is_addressed());
        assert!(!Envelope::new(Address::UNASSIGNED, Address::new(3), "").is_addressed());
    }
}
