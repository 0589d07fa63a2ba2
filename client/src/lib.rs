/*!
Browser-side `WebRTC` peer for fleetcam camera streams.

This crate wraps `RtcPeerConnection` and the signaling `WebSocket` into a
single [`PeerClient`] handle. The signaling server is a transparent relay:
every frame a peer sends is fanned out to the other connected peer, so the
same client type serves both ends of a stream. The camera side calls
[`PeerClient::send_offer`] once the channel is up; the dashboard side simply
waits for the offer, answers it and attaches the incoming media stream to a
`<video>` element via [`PeerClient::attach_sink`].

Negotiation progress is surfaced through [`SessionStatus`] values delivered
to a caller-supplied callback, which UI layers can render directly.

There is no negotiation timeout: a session that never gathers a working
candidate pair stays in [`SessionStatus::IceNegotiating`] until the caller
tears it down with [`PeerClient::close`].
*/

#![allow(
    clippy::module_name_repetitions,
    clippy::future_not_send, // false positive in WASM (single threaded) context
)]
#![warn(
    clippy::pedantic,
    clippy::dbg_macro,
    clippy::unwrap_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented
)]
#![deny(clippy::wildcard_imports, clippy::str_to_string)]

mod error;
pub mod peer;
mod utils;

pub use error::{Error, Result};
pub use fleetcam_protocol::{IceCandidate, SignalMessage};
pub use peer::{ClientConfig, PeerClient, SessionStatus};
