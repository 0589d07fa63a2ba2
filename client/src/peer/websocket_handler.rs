use anyhow::anyhow;
use log::{debug, info, warn};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    RtcIceCandidate, RtcIceCandidateInit, RtcPeerConnection, RtcSdpType, RtcSessionDescriptionInit,
};

use fleetcam_protocol::{IceCandidate, SignalMessage};

use crate::peer::{PeerClient, SessionStatus};
use crate::utils::create_sdp_answer;

/// One step of the negotiation state machine, driven by whatever the relay
/// forwards from the other peer.
pub(crate) async fn handle_signal_message(
    client: PeerClient,
    message: SignalMessage,
) -> crate::Result<()> {
    match message {
        SignalMessage::ConnectionSuccess { message } => {
            info!("relay greeting: {}", message);
        }
        SignalMessage::Offer { sdp } => {
            client.set_status(SessionStatus::OfferReceived);
            // remote description first, then answer creation; the browser
            // rejects the reverse order
            let answer = create_sdp_answer(&client.peer_connection(), sdp)
                .await
                .map_err(|err| anyhow!("failed to answer the received offer: {:?}", err))?;
            client.send_signal(&SignalMessage::Answer { sdp: answer })?;
            client.set_status(SessionStatus::AnswerExchanged);
        }
        SignalMessage::Answer { sdp } => {
            let mut remote_session_description = RtcSessionDescriptionInit::new(RtcSdpType::Answer);
            remote_session_description.sdp(&sdp);
            JsFuture::from(
                client
                    .peer_connection()
                    .set_remote_description(&remote_session_description),
            )
            .await
            .map_err(|err| anyhow!("failed to set remote description: {:?}", err))?;
            debug!("received answer from peer and set remote description");
            client.set_status(SessionStatus::AnswerExchanged);
        }
        SignalMessage::Candidate { candidate } => {
            add_ice_candidate(&client.peer_connection(), candidate).await;
        }
    }

    Ok(())
}

/// Adds one remote candidate to the connection's pool.
///
/// A candidate that cannot be added, e.g. because it arrived before the
/// remote description was set, is logged and skipped; it never ends the
/// session.
pub(crate) async fn add_ice_candidate(
    peer_connection: &RtcPeerConnection,
    candidate: IceCandidate,
) {
    let mut init = RtcIceCandidateInit::new(&candidate.candidate);
    init.sdp_mid(candidate.sdp_mid.as_deref());
    init.sdp_m_line_index(candidate.sdp_m_line_index);

    let rtc_candidate = match RtcIceCandidate::new(&init) {
        Ok(rtc_candidate) => rtc_candidate,
        Err(err) => {
            warn!("skipping unparsable ICE candidate: {:?}", err);
            return;
        }
    };

    match JsFuture::from(
        peer_connection.add_ice_candidate_with_opt_rtc_ice_candidate(Some(&rtc_candidate)),
    )
    .await
    {
        Ok(_) => debug!("added remote candidate: {:?}", candidate),
        Err(err) => warn!("skipping ICE candidate that could not be added: {:?}", err),
    }
}
