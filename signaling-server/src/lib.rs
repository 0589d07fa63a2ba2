/*!
WebSocket signaling relay for fleetcam camera streams.

The relay keeps a registry of connected peers and forwards every signaling
frame it receives to all peers other than the sender, without touching the
payload. It carries no sessions, no authentication and no persistence; it is
meant for small trusted deployments where exactly two peers (one camera
publisher, one dashboard viewer) negotiate a `WebRTC` connection through it.
*/

pub mod registry;
pub mod relay;
pub mod router;
