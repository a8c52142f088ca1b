//! Fuzz target for request dispatch.
//!
//! Run with: cargo +nightly fuzz run fuzz_dispatch
//!
//! Feeds arbitrary datagrams to the dispatcher and checks that every request
//! gets exactly one well-formed reply and that the queue only grows on `OK`.

#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use udpq_core::dispatch::Dispatcher;
use udpq_core::protocol::Reply;
use udpq_core::ServerRuntimeState;

fuzz_target!(|data: &[u8]| {
    let state = Arc::new(ServerRuntimeState::default());
    let dispatcher = Dispatcher::new(Arc::clone(&state));
    let peer = "127.0.0.1:9".parse().unwrap();

    let before = state.queue().len();
    let reply = dispatcher.dispatch(peer, data);
    let after = state.queue().len();

    match reply {
        Reply::Ok => assert_eq!(after, before + 1),
        Reply::ShuttingDown => assert!(!state.is_running()),
        _ => assert_eq!(after, before),
    }
    assert!(!reply.to_wire().is_empty() || matches!(reply, Reply::Value(_)));
});
