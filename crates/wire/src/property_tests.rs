// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests: every protocol value survives encode/frame/decode.

use proptest::prelude::*;

use crate::{decode, encode, read_message, write_message, AgentStatus, Request, Response};

fn arb_status() -> impl Strategy<Value = AgentStatus> {
    prop_oneof![
        Just(AgentStatus::Unspecified),
        Just(AgentStatus::Ready),
        Just(AgentStatus::NotReady),
    ]
}

fn arb_request() -> impl Strategy<Value = Request> {
    let name = "[a-z0-9-]{1,40}";
    prop_oneof![
        (name, arb_status())
            .prop_map(|(agent, status)| Request::ReportStatus { agent, status }),
        name.prop_map(|agent| Request::GetStatusInterval { agent }),
    ]
}

proptest! {
    #[test]
    fn request_json_roundtrip(request in arb_request()) {
        let bytes = encode(&request).unwrap();
        let back: Request = decode(&bytes).unwrap();
        prop_assert_eq!(back, request);
    }

    #[test]
    fn framing_roundtrip(payload in proptest::collection::vec(any::<u8>(), 0..4096)) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        rt.block_on(async {
            let mut buffer = Vec::new();
            write_message(&mut buffer, &payload).await.unwrap();
            let mut cursor = std::io::Cursor::new(buffer);
            let back = read_message(&mut cursor).await.unwrap();
            assert_eq!(back, payload);
        });
    }

    #[test]
    fn interval_roundtrip(seconds in any::<u64>()) {
        let bytes = encode(&Response::Interval { seconds }).unwrap();
        let back: Response = decode(&bytes).unwrap();
        prop_assert_eq!(back, Response::Interval { seconds });
    }
}
