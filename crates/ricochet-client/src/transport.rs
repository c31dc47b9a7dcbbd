//! Adapter over the persistent channel the game server talks through. The
//! socket itself is external; this side only needs an outbound frame sink
//! and a way to turn inbound frames into typed events for the subscribed
//! channel.

use tokio::sync::mpsc;

use ricochet_core::protocol::{self, ClientAction, ProtocolError, ServerEvent};

pub struct TransportAdapter {
    identifier: String,
    outbound: mpsc::UnboundedSender<String>,
}

impl TransportAdapter {
    pub fn new(channel: &str, room: &str, outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            identifier: protocol::channel_identifier(channel, room),
            outbound,
        }
    }

    /// The channel identifier this adapter subscribed with; inbound frames
    /// carrying any other identifier are not dispatched.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Subscribe to the game channel.
    pub fn subscribe(&self) -> Result<(), ProtocolError> {
        let frame = protocol::encode_subscribe(&self.identifier)?;
        self.deliver(frame);
        Ok(())
    }

    /// Send a client action wrapped in a message envelope.
    pub fn send(&self, action: &ClientAction) -> Result<(), ProtocolError> {
        let frame = protocol::encode_action(&self.identifier, action)?;
        self.deliver(frame);
        Ok(())
    }

    fn deliver(&self, frame: String) {
        // Reconnecting a dropped socket is the transport's job, not ours.
        if self.outbound.send(frame).is_err() {
            tracing::warn!("outbound channel closed, frame dropped");
        }
    }

    /// Decode an inbound frame and return its event when it belongs to the
    /// subscribed channel. Pings, other channels' traffic, unknown actions,
    /// and malformed payloads are all dropped with a log line; the
    /// transport is not under our control, so none of these are fatal.
    pub fn dispatch_frame(&self, frame: &str) -> Option<ServerEvent> {
        let decoded = match protocol::decode_frame(frame) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable frame ignored");
                return None;
            },
        };
        if decoded.identifier.as_deref() != Some(self.identifier.as_str()) {
            tracing::debug!("frame for another channel ignored");
            return None;
        }
        let message = decoded.message?;
        match protocol::parse_event(&message) {
            Ok(event) => Some(event),
            Err(ProtocolError::UnknownAction(action)) => {
                tracing::debug!(action = %action, "unknown action ignored");
                None
            },
            Err(e) => {
                tracing::warn!(error = %e, "malformed event ignored");
                None
            },
        }
    }
}
