use js_sys::{Array, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{RtcConfiguration, RtcPeerConnection};
use web_sys::{RtcSdpType, RtcSessionDescriptionInit};

pub(crate) fn set_panic_hook() {
    // When the `console_error_panic_hook` feature is enabled, we can call the
    // `set_panic_hook` function at least once during initialization, and then
    // we will get better error messages if our code ever panics.
    //
    // For more details see
    // https://github.com/rustwasm/console_error_panic_hook#readme
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Builds a peer connection configured with the given STUN urls.
///
/// An empty list yields a plain connection, only usable within the local
/// network. No TURN fallback is configured, so peers behind symmetric NATs
/// may fail to connect.
pub(crate) fn create_peer_connection(stun_urls: &[String]) -> Result<RtcPeerConnection, JsValue> {
    if stun_urls.is_empty() {
        return RtcPeerConnection::new();
    }

    let ice_servers = Array::new();
    for url in stun_urls {
        let server_entry = Object::new();
        Reflect::set(&server_entry, &"urls".into(), &JsValue::from_str(url))?;
        ice_servers.push(&*server_entry);
    }

    let mut rtc_configuration = RtcConfiguration::new();
    rtc_configuration.ice_servers(&ice_servers);

    RtcPeerConnection::new_with_configuration(&rtc_configuration)
}

/// Creates an `SDP` offer and sets it as the local description.
pub(crate) async fn create_sdp_offer(
    peer_connection: &RtcPeerConnection,
) -> Result<String, JsValue> {
    let offer = JsFuture::from(peer_connection.create_offer()).await?;
    let offer = Reflect::get(&offer, &JsValue::from_str("sdp"))?
        .as_string()
        .ok_or_else(|| JsValue::from_str("sdp field missing from created offer"))?;

    let mut local_session_description = RtcSessionDescriptionInit::new(RtcSdpType::Offer);
    local_session_description.sdp(&offer);
    JsFuture::from(peer_connection.set_local_description(&local_session_description)).await?;

    Ok(offer)
}

/// Answers a received offer.
///
/// The remote description must be set before the answer can be created and
/// the answer must be set as the local description before it is returned;
/// the negotiation protocol requires exactly this order.
pub(crate) async fn create_sdp_answer(
    peer_connection: &RtcPeerConnection,
    offer: String,
) -> Result<String, JsValue> {
    let mut remote_session_description = RtcSessionDescriptionInit::new(RtcSdpType::Offer);
    remote_session_description.sdp(&offer);
    JsFuture::from(peer_connection.set_remote_description(&remote_session_description)).await?;

    let answer = JsFuture::from(peer_connection.create_answer()).await?;
    let answer = Reflect::get(&answer, &JsValue::from_str("sdp"))?
        .as_string()
        .ok_or_else(|| JsValue::from_str("sdp field missing from created answer"))?;

    let mut local_session_description = RtcSessionDescriptionInit::new(RtcSdpType::Answer);
    local_session_description.sdp(&answer);
    JsFuture::from(peer_connection.set_local_description(&local_session_description)).await?;

    Ok(answer)
}

#[cfg(test)]
mod test {
    use super::*;
    use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
    use web_sys::{RtcIceConnectionState, RtcIceGatheringState};

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_create_local_peer_connection_is_successful() {
        let peer_connection =
            create_peer_connection(&[]).expect("creating peer connection failed!");
        assert_eq!(
            peer_connection.ice_connection_state(),
            RtcIceConnectionState::New
        );
        assert_eq!(
            peer_connection.ice_gathering_state(),
            RtcIceGatheringState::New
        );
    }

    #[wasm_bindgen_test]
    async fn test_create_sdp_offer_sets_local_description() {
        let peer_connection = create_peer_connection(&[]).expect("failed to create connection");
        let _offer = create_sdp_offer(&peer_connection).await.unwrap();
        assert!(peer_connection.local_description().is_some());
    }

    #[wasm_bindgen_test]
    async fn test_create_sdp_answer_sets_remote_description_first() {
        let offerer = create_peer_connection(&[]).expect("failed to create connection");
        let offer = create_sdp_offer(&offerer).await.unwrap();

        let answerer = create_peer_connection(&[]).expect("failed to create connection");
        let _answer = create_sdp_answer(&answerer, offer).await.unwrap();
        assert!(answerer.remote_description().is_some());
        assert!(answerer.local_description().is_some());
    }
}
