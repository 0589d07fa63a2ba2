/*!
Helper crate that declares the wire types shared between the
[fleetcam-signaling-server](../fleetcam_signaling_server/index.html)
and the browser-side [fleetcam-client](../fleetcam_client/index.html).

Every frame on the signaling channel is a JSON text message tagged by a
`"type"` field, e.g.

```json
{ "type": "offer", "sdp": "v=0..." }
```

The relay itself treats frames as opaque text and only peeks at the tag for
logging, so peers are free to attach extra fields (browsers include the full
session-description object next to the `sdp` string); unknown fields are
ignored on deserialization.
*/

#![warn(missing_docs)]

use serde::{Deserialize, Serialize};

/// A single ICE candidate as advertised by one peer to the other.
///
/// Field names follow the JSON produced by the browser's
/// `RTCIceCandidate.toJSON()`, so a candidate received from a JavaScript
/// peer deserializes without translation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// The candidate-attribute line (`candidate:... typ host ...`).
    pub candidate: String,
    /// Media stream identification tag, absent for end-of-candidates.
    pub sdp_mid: Option<String>,
    /// Index of the m-line in the SDP this candidate belongs to.
    pub sdp_m_line_index: Option<u16>,
}

/// A message exchanged over the signaling channel.
///
/// The relay forwards `Offer`, `Answer` and `Candidate` frames verbatim to
/// every peer other than the sender; `ConnectionSuccess` is only ever sent
/// by the relay itself, as a greeting right after the handshake.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalMessage {
    /// Greeting from the relay confirming the signaling channel is up.
    ConnectionSuccess {
        /// Human-readable status string, for display or logging only.
        message: String,
    },
    /// `SDP` offer, passed to the other peer without modification.
    Offer {
        /// The offer's session description text.
        sdp: String,
    },
    /// `SDP` answer, passed to the other peer without modification.
    Answer {
        /// The answer's session description text.
        sdp: String,
    },
    /// Proposed ICE candidate of one peer, passed to the other untouched.
    Candidate {
        /// The advertised candidate.
        candidate: IceCandidate,
    },
}

impl SignalMessage {
    /// The wire tag of this message, as it appears in the `"type"` field.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::ConnectionSuccess { .. } => "connection_success",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::Candidate { .. } => "candidate",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offer_matches_wire_format() {
        let message = SignalMessage::Offer {
            sdp: "v=0...".to_owned(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"type":"offer","sdp":"v=0..."}"#);
    }

    #[test]
    fn connection_success_matches_wire_format() {
        let json = r#"{"type":"connection_success","message":"connected to signaling server"}"#;
        let message: SignalMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            message,
            SignalMessage::ConnectionSuccess {
                message: "connected to signaling server".to_owned()
            }
        );
    }

    #[test]
    fn candidate_uses_browser_field_names() {
        let message = SignalMessage::Candidate {
            candidate: IceCandidate {
                candidate: "candidate:0 1 UDP 2122252543 192.168.0.10 54321 typ host".to_owned(),
                sdp_mid: Some("0".to_owned()),
                sdp_m_line_index: Some(0),
            },
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains(r#""sdpMid":"0""#));
        assert!(json.contains(r#""sdpMLineIndex":0"#));

        let roundtripped: SignalMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtripped, message);
    }

    #[test]
    fn extra_fields_from_browser_peers_are_ignored() {
        // browsers serialize the whole session-description object
        let json = r#"{"type":"answer","sdp":"v=0...","extra":{"nested":true}}"#;
        let message: SignalMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.tag(), "answer");
    }

    #[test]
    fn candidate_without_mid_deserializes() {
        let json = r#"{"type":"candidate","candidate":{"candidate":"","sdpMid":null,"sdpMLineIndex":null}}"#;
        let message: SignalMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.tag(), "candidate");
    }
}
