/*!
Library module for the fleetcam peer session.

One [`PeerClient`] corresponds to one `RtcPeerConnection` plus one signaling
channel; a client never holds more than one active session. The dashboard
viewer end typically looks like this:

```no_run
use fleetcam_client::{ClientConfig, PeerClient};

let client = PeerClient::new(&ClientConfig::default()).unwrap();
client.start(|status| {
    // render `status` in the UI
    log::info!("session status: {}", status);
});
// later, once the <video> element exists:
// client.attach_sink(video_element);
// and from both the close button and the unmount cleanup:
// client.close();
```

The camera end uses the same type, but calls [`PeerClient::send_offer`] once
the status callback reports [`SessionStatus::SignalingConnected`].
*/

use std::cell::RefCell;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

use anyhow::anyhow;
use log::info;
use web_sys::{HtmlVideoElement, MediaStream, RtcPeerConnection, WebSocket};

use fleetcam_protocol::SignalMessage;

use crate::peer::callbacks::{
    set_peer_connection_on_ice_candidate, set_peer_connection_on_ice_connection_state_change,
    set_peer_connection_on_track, set_websocket_on_close, set_websocket_on_message,
    set_websocket_on_open,
};
use crate::utils::{create_peer_connection, create_sdp_offer, set_panic_hook};

mod callbacks;
mod websocket_handler;

/// Where a negotiation currently stands, as displayed to the user.
///
/// `Disconnected` is terminal and reachable from every other state, either
/// through socket closure, an ICE failure or an explicit [`PeerClient::close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Nothing started yet.
    Idle,
    /// The signaling channel to the relay is open.
    SignalingConnected,
    /// A local offer was shipped, awaiting the remote answer.
    OfferSent,
    /// A remote offer arrived and is being answered.
    OfferReceived,
    /// Both descriptions are in place, candidates may now be applied.
    AnswerExchanged,
    /// Connectivity checks are running.
    IceNegotiating,
    /// Media is flowing.
    Streaming,
    /// The session is over; carries a user-visible reason when it ended in
    /// an error rather than an explicit teardown.
    Disconnected(Option<String>),
}

impl Display for SessionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::SignalingConnected => write!(f, "connected to signaling server"),
            Self::OfferSent => write!(f, "offer sent"),
            Self::OfferReceived => write!(f, "offer received"),
            Self::AnswerExchanged => write!(f, "answer exchanged"),
            Self::IceNegotiating => write!(f, "negotiating connection"),
            Self::Streaming => write!(f, "streaming"),
            Self::Disconnected(None) => write!(f, "disconnected"),
            Self::Disconnected(Some(reason)) => write!(f, "disconnected: {}", reason),
        }
    }
}

/// Addresses a [`PeerClient`] negotiates through.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Full url of the relay's websocket endpoint.
    pub signaling_url: String,
    /// STUN servers used for NAT traversal address discovery. No TURN relay
    /// is configured, a known limitation of this stack.
    pub stun_urls: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://127.0.0.1:6033/ws".to_owned(),
            stun_urls: vec![
                "stun:stun.l.google.com:19302".to_owned(),
                "stun:stun1.l.google.com:19302".to_owned(),
            ],
        }
    }
}

type StatusCallback = Rc<RefCell<dyn FnMut(&SessionStatus)>>;

pub(crate) struct PeerClientInner {
    websocket: WebSocket,
    peer_connection: RtcPeerConnection,
    video_sink: Option<HtmlVideoElement>,
    remote_stream: Option<MediaStream>,
    status: SessionStatus,
    on_status: Option<StatusCallback>,
    closed: bool,
}

/// One peer session: a `RtcPeerConnection` and its signaling channel.
///
/// This is a pointer to the underlying resources and can be cloned freely;
/// all clones refer to the same session. Setup is split into
/// [`PeerClient::new`] and [`PeerClient::start`] so that callbacks handed to
/// `start` may themselves hold a clone of the client.
#[derive(Clone)]
pub struct PeerClient {
    inner: Rc<RefCell<PeerClientInner>>,
}

impl PeerClient {
    /// Creates the peer connection and opens the signaling channel.
    ///
    /// # Errors
    /// Fails if the peer connection cannot be constructed or if the
    /// websocket url in `config` is rejected by the browser.
    pub fn new(config: &ClientConfig) -> crate::Result<Self> {
        set_panic_hook();

        let peer_connection = create_peer_connection(&config.stun_urls)
            .map_err(|err| anyhow!("failed to create peer connection: {:?}", err))?;

        let websocket = WebSocket::new(&config.signaling_url).map_err(|err| {
            anyhow!(
                "failed to open signaling channel to {}: {:?}",
                config.signaling_url,
                err
            )
        })?;

        Ok(Self {
            inner: Rc::new(RefCell::new(PeerClientInner {
                websocket,
                peer_connection,
                video_sink: None,
                remote_stream: None,
                status: SessionStatus::Idle,
                on_status: None,
                closed: false,
            })),
        })
    }

    /// Wires up all signaling and peer-connection callbacks.
    ///
    /// `on_status_change` runs on every [`SessionStatus`] transition; UI
    /// layers render its argument directly.
    pub fn start(&self, on_status_change: impl FnMut(&SessionStatus) + 'static) {
        self.inner.borrow_mut().on_status = Some(Rc::new(RefCell::new(on_status_change)));

        set_websocket_on_open(self);
        set_websocket_on_message(self);
        set_websocket_on_close(self);
        set_peer_connection_on_track(self);
        set_peer_connection_on_ice_candidate(self);
        set_peer_connection_on_ice_connection_state_change(self);
    }

    /// Points the incoming media stream at a `<video>` element.
    ///
    /// May be called before or after the first track arrives; re-attachment
    /// simply replaces the element's source.
    pub fn attach_sink(&self, video: HtmlVideoElement) {
        let stream = {
            let mut inner = self.inner.borrow_mut();
            inner.video_sink = Some(video.clone());
            inner.remote_stream.clone()
        };
        if let Some(stream) = stream {
            video.set_src_object(Some(&stream));
        }
    }

    /// Creates an offer, sets it as the local description and ships it to
    /// the other peer. Camera-side only; the viewer waits for the offer.
    ///
    /// # Errors
    /// Fails if offer creation is rejected by the browser or if the
    /// signaling channel cannot carry the frame.
    pub async fn send_offer(&self) -> crate::Result<()> {
        let sdp = create_sdp_offer(&self.peer_connection())
            .await
            .map_err(|err| anyhow!("failed to create an SDP offer: {:?}", err))?;
        self.send_signal(&SignalMessage::Offer { sdp })?;
        self.set_status(SessionStatus::OfferSent);
        Ok(())
    }

    /// Tears the session down: closes the peer connection and the signaling
    /// channel together. Idempotent, so it is safe to call from both an
    /// explicit close action and an unmount-style cleanup.
    pub fn close(&self) {
        let (peer_connection, websocket, on_status) = {
            let mut inner = self.inner.borrow_mut();
            if inner.closed {
                return;
            }
            inner.closed = true;
            inner.status = SessionStatus::Disconnected(None);
            (
                inner.peer_connection.clone(),
                inner.websocket.clone(),
                inner.on_status.clone(),
            )
        };

        peer_connection.close();
        if let Err(err) = websocket.close() {
            info!("signaling channel was already closed: {:?}", err);
        }

        if let Some(on_status) = on_status {
            (on_status.borrow_mut())(&SessionStatus::Disconnected(None));
        }
    }

    /// The current negotiation status.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.borrow().status.clone()
    }

    pub(crate) fn set_status(&self, status: SessionStatus) {
        let on_status = {
            let mut inner = self.inner.borrow_mut();
            // nothing may resurrect a torn-down session
            if inner.closed {
                return;
            }
            inner.status = status.clone();
            inner.on_status.clone()
        };
        if let Some(on_status) = on_status {
            (on_status.borrow_mut())(&status);
        }
    }

    pub(crate) fn send_signal(&self, message: &SignalMessage) -> crate::Result<()> {
        let frame = serde_json::to_string(message)?;
        self.websocket()
            .send_with_str(&frame)
            .map_err(|err| anyhow!("failed to send {} over signaling channel: {:?}", message.tag(), err))
    }

    pub(crate) fn attach_remote_stream(&self, stream: MediaStream) {
        let sink = {
            let mut inner = self.inner.borrow_mut();
            inner.remote_stream = Some(stream.clone());
            inner.video_sink.clone()
        };
        if let Some(sink) = sink {
            sink.set_src_object(Some(&stream));
        }
    }

    pub(crate) fn peer_connection(&self) -> RtcPeerConnection {
        self.inner.borrow().peer_connection.clone()
    }

    pub(crate) fn websocket(&self) -> WebSocket {
        self.inner.borrow().websocket.clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }
}
