use log::{debug, error, info};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    MediaStream, MessageEvent, RtcIceConnectionState, RtcPeerConnectionIceEvent, RtcTrackEvent,
};

use fleetcam_protocol::{IceCandidate, SignalMessage};

use crate::peer::{websocket_handler, PeerClient, SessionStatus};

pub(crate) fn set_websocket_on_open(client: &PeerClient) {
    let client_clone = client.clone();
    let on_open: Box<dyn FnMut(JsValue)> = Box::new(move |_| {
        info!("signaling channel open");
        // entering SignalingConnected also clears any prior error status
        client_clone.set_status(SessionStatus::SignalingConnected);
    });
    let on_open = Closure::wrap(on_open);
    client
        .websocket()
        .set_onopen(Some(on_open.as_ref().unchecked_ref()));
    on_open.forget();
}

/// Frames that fail to parse are logged and dropped; handler failures are
/// logged without tearing the session down.
pub(crate) fn set_websocket_on_message(client: &PeerClient) {
    let client_clone = client.clone();
    let on_message: Box<dyn FnMut(MessageEvent)> = Box::new(move |ev: MessageEvent| {
        let Some(text) = ev.data().as_string() else {
            error!("non-text frame on the signaling channel, ignoring");
            return;
        };
        let message = match serde_json::from_str::<SignalMessage>(&text) {
            Ok(message) => message,
            Err(err) => {
                error!("failed to parse signaling message: {}", err);
                return;
            }
        };
        debug!("{} received over signaling channel", message.tag());

        let client_clone = client_clone.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) =
                websocket_handler::handle_signal_message(client_clone, message).await
            {
                error!("error handling signaling message: {:?}", err);
            }
        });
    });
    let on_message = Closure::wrap(on_message);
    client
        .websocket()
        .set_onmessage(Some(on_message.as_ref().unchecked_ref()));
    on_message.forget();
}

pub(crate) fn set_websocket_on_close(client: &PeerClient) {
    let client_clone = client.clone();
    let on_close: Box<dyn FnMut(JsValue)> = Box::new(move |_| {
        if client_clone.is_closed() {
            return;
        }
        info!("signaling channel closed");
        client_clone.set_status(SessionStatus::Disconnected(Some(
            "connection to the signaling server was lost".to_owned(),
        )));
    });
    let on_close = Closure::wrap(on_close);
    client
        .websocket()
        .set_onclose(Some(on_close.as_ref().unchecked_ref()));
    on_close.forget();
}

pub(crate) fn set_peer_connection_on_track(client: &PeerClient) {
    let client_clone = client.clone();
    let on_track: Box<dyn FnMut(RtcTrackEvent)> = Box::new(move |ev: RtcTrackEvent| {
        info!("remote track arrived");
        if let Ok(stream) = ev.streams().get(0).dyn_into::<MediaStream>() {
            client_clone.attach_remote_stream(stream);
        }
    });
    let on_track = Closure::wrap(on_track);
    client
        .peer_connection()
        .set_ontrack(Some(on_track.as_ref().unchecked_ref()));
    on_track.forget();
}

/// Every locally gathered candidate is shipped to the other peer right
/// away, one frame each; no batching.
pub(crate) fn set_peer_connection_on_ice_candidate(client: &PeerClient) {
    let client_clone = client.clone();
    let on_ice_candidate: Box<dyn FnMut(RtcPeerConnectionIceEvent)> =
        Box::new(move |ev: RtcPeerConnectionIceEvent| {
            if let Some(candidate) = ev.candidate() {
                let candidate = IceCandidate {
                    candidate: candidate.candidate(),
                    sdp_mid: candidate.sdp_mid(),
                    sdp_m_line_index: candidate.sdp_m_line_index(),
                };
                debug!("gathered local candidate: {:?}", candidate);
                client_clone
                    .send_signal(&SignalMessage::Candidate { candidate })
                    .unwrap_or_else(|_| error!("failed to send one of the ICE candidates"));
            }
        });
    let on_ice_candidate = Closure::wrap(on_ice_candidate);
    client
        .peer_connection()
        .set_onicecandidate(Some(on_ice_candidate.as_ref().unchecked_ref()));
    on_ice_candidate.forget();
}

pub(crate) fn set_peer_connection_on_ice_connection_state_change(client: &PeerClient) {
    let peer_connection = client.peer_connection();
    let client_clone = client.clone();
    let on_state_change: Box<dyn FnMut()> = Box::new(move || {
        let state = peer_connection.ice_connection_state();
        debug!("ice connection state change: {:?}", state);
        match state {
            RtcIceConnectionState::Checking => {
                client_clone.set_status(SessionStatus::IceNegotiating);
            }
            RtcIceConnectionState::Connected | RtcIceConnectionState::Completed => {
                client_clone.set_status(SessionStatus::Streaming);
            }
            RtcIceConnectionState::Disconnected | RtcIceConnectionState::Failed => {
                client_clone.set_status(SessionStatus::Disconnected(Some(
                    "peer connection was lost".to_owned(),
                )));
            }
            _ => {}
        }
    });
    let on_state_change = Closure::wrap(on_state_change);
    client
        .peer_connection()
        .set_oniceconnectionstatechange(Some(on_state_change.as_ref().unchecked_ref()));
    on_state_change.forget();
}
