//! Integration tests for netstream-core
//!
//! Drive the relay through complete sessions over an in-memory transport and
//! check what each party would have received.
//!
//! Run with: cargo test --test integration_tests

use netstream_core::{
    ClientEvent, Error, PartyId, Result, Role, RoomState, ServerEvent,
    SessionRegistry, SignalingRelay, Transport,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

/// Per-party inboxes standing in for real connections
#[derive(Default)]
struct InMemoryTransport {
    delivered: Mutex<Vec<(PartyId, ServerEvent)>>,
}

impl Transport for InMemoryTransport {
    fn send(&self, to: &PartyId, event: ServerEvent) -> Result<()> {
        self.delivered.lock().push((to.clone(), event));
        Ok(())
    }
}

impl InMemoryTransport {
    /// Drain everything delivered to `party`, in order
    fn inbox(&self, party: &PartyId) -> Vec<ServerEvent> {
        let mut delivered = self.delivered.lock();
        let (mine, rest): (Vec<_>, Vec<_>) =
            delivered.drain(..).partition(|(to, _)| to == party);
        *delivered = rest;
        mine.into_iter().map(|(_, event)| event).collect()
    }

    fn is_quiet(&self) -> bool {
        self.delivered.lock().is_empty()
    }

    fn clear(&self) {
        self.delivered.lock().clear();
    }
}

struct Harness {
    transport: Arc<InMemoryTransport>,
    relay: SignalingRelay,
}

fn setup() -> Harness {
    let transport = Arc::new(InMemoryTransport::default());
    let relay = SignalingRelay::new(Arc::new(SessionRegistry::new()), transport.clone());
    Harness { transport, relay }
}

fn party(name: &str) -> PartyId {
    PartyId::from(name)
}

#[test]
fn test_full_negotiation_handshake() {
    let Harness { transport, relay } = setup();
    let (a, b) = (party("A"), party("B"));

    assert_eq!(relay.connect(a.clone()).unwrap(), Role::Host);
    assert_eq!(
        transport.inbox(&a),
        vec![ServerEvent::RoleAssigned { is_host: true }]
    );

    assert_eq!(relay.connect(b.clone()).unwrap(), Role::Client);
    assert_eq!(
        transport.inbox(&a),
        vec![ServerEvent::UserConnected { user_id: b.clone() }]
    );
    assert_eq!(
        transport.inbox(&b),
        vec![ServerEvent::RoleAssigned { is_host: false }]
    );

    relay.dispatch(&a, ClientEvent::ReadyForConnection);
    assert_eq!(
        transport.inbox(&b),
        vec![ServerEvent::InitiateConnection { host_id: a.clone() }]
    );
    assert!(transport.is_quiet());

    let offer = json!({"type": "offer", "sdp": "v=0\r\ns=-\r\nt=0 0\r\n"});
    relay.dispatch(&a, ClientEvent::Offer { offer: offer.clone() });
    assert_eq!(transport.inbox(&b), vec![ServerEvent::Offer { offer }]);
    assert!(transport.is_quiet(), "offer must reach only the client");

    let answer = json!({"type": "answer", "sdp": "v=0\r\n"});
    relay.dispatch(&b, ClientEvent::Answer { answer: answer.clone() });
    assert_eq!(transport.inbox(&a), vec![ServerEvent::Answer { answer }]);
    assert!(transport.is_quiet());
}

#[test]
fn test_offer_from_client_is_dropped() {
    let Harness { transport, relay } = setup();
    let (a, b) = (party("A"), party("B"));
    relay.connect(a.clone()).unwrap();
    relay.connect(b.clone()).unwrap();
    transport.clear();

    relay.dispatch(&b, ClientEvent::Offer { offer: json!("sdp") });
    assert!(transport.is_quiet());
}

#[test]
fn test_host_candidate_forwarded_once_unmodified() {
    let Harness { transport, relay } = setup();
    let (a, b) = (party("A"), party("B"));
    relay.connect(a.clone()).unwrap();
    relay.connect(b.clone()).unwrap();
    transport.clear();

    let candidate = json!({
        "candidate": "candidate:842163049 1 udp 1677729535 203.0.113.7 46154 typ srflx",
        "sdpMid": "0",
        "sdpMLineIndex": 0
    });
    relay.dispatch(&a, ClientEvent::Candidate { candidate: candidate.clone() });

    assert_eq!(transport.inbox(&b), vec![ServerEvent::Candidate { candidate }]);
    assert!(transport.is_quiet());
}

#[test]
fn test_host_departure_promotes_client() {
    let Harness { transport, relay } = setup();
    let (a, b) = (party("A"), party("B"));
    relay.connect(a.clone()).unwrap();
    relay.connect(b.clone()).unwrap();
    transport.clear();

    let departure = relay.disconnect(&a).unwrap();
    assert!(departure.was_host);
    assert_eq!(departure.new_host.as_ref(), Some(&b));

    // Promotion notices come before anything else addressed to B
    assert_eq!(
        transport.inbox(&b),
        vec![
            ServerEvent::RoleAssigned { is_host: true },
            ServerEvent::HostChanged { new_host: true },
            ServerEvent::UserDisconnected { user_id: a.clone() },
        ]
    );
    assert!(transport.is_quiet());

    // B is now the host for routing
    let c = party("C");
    relay.connect(c.clone()).unwrap();
    assert_eq!(
        transport.inbox(&b),
        vec![ServerEvent::UserConnected { user_id: c.clone() }]
    );
    transport.clear();

    relay.dispatch(&c, ClientEvent::Answer { answer: json!("answer") });
    relay.dispatch(&c, ClientEvent::Candidate { candidate: json!("cand") });
    assert_eq!(
        transport.inbox(&b),
        vec![
            ServerEvent::Answer { answer: json!("answer") },
            ServerEvent::Candidate { candidate: json!("cand") },
        ]
    );
}

#[test]
fn test_sole_member_leaving_resets_room() {
    let Harness { transport, relay } = setup();
    let a = party("A");
    relay.connect(a.clone()).unwrap();

    let departure = relay.disconnect(&a).unwrap();
    assert!(departure.remaining.is_empty());
    assert_eq!(relay.registry().state(), RoomState::Empty);
    assert_eq!(relay.registry().host_id(), None);
    transport.clear();

    let next = party("N");
    assert_eq!(relay.connect(next.clone()).unwrap(), Role::Host);
    assert_eq!(
        transport.inbox(&next),
        vec![ServerEvent::RoleAssigned { is_host: true }]
    );
}

#[test]
fn test_third_party_is_refused() {
    let Harness { transport, relay } = setup();
    let (a, b, c) = (party("A"), party("B"), party("C"));
    relay.connect(a.clone()).unwrap();
    relay.connect(b.clone()).unwrap();
    transport.clear();

    assert!(matches!(relay.connect(c.clone()), Err(Error::RoomFull)));
    assert_eq!(transport.inbox(&c), vec![ServerEvent::room_full()]);
    assert!(transport.is_quiet());

    assert_eq!(relay.registry().members(), vec![a.clone(), b]);
    assert_eq!(relay.registry().host_id(), Some(a));

    // The refused party never joined, so its disconnect changes nothing
    assert!(relay.disconnect(&c).is_none());
    assert_eq!(relay.registry().len(), 2);
}

#[test]
fn test_host_chat_reaches_everyone() {
    let Harness { transport, relay } = setup();
    let (a, b) = (party("A"), party("B"));
    relay.connect(a.clone()).unwrap();
    relay.connect(b.clone()).unwrap();
    transport.clear();

    relay.dispatch(&a, ClientEvent::ChatMessage("hello".to_string()));
    let expected = ServerEvent::ChatMessage("Host: hello".to_string());
    assert_eq!(transport.inbox(&a), vec![expected.clone()]);
    assert_eq!(transport.inbox(&b), vec![expected]);

    relay.dispatch(&b, ClientEvent::ChatMessage("hi back".to_string()));
    let expected = ServerEvent::ChatMessage("Client: hi back".to_string());
    assert_eq!(transport.inbox(&a), vec![expected.clone()]);
    assert_eq!(transport.inbox(&b), vec![expected]);
}

#[test]
fn test_reconnect_after_connection_failure() {
    let Harness { transport, relay } = setup();
    let (a, b) = (party("A"), party("B"));
    relay.connect(a.clone()).unwrap();
    relay.connect(b.clone()).unwrap();
    transport.clear();

    relay.dispatch(
        &a,
        ClientEvent::ConnectionFailed {
            reason: Some("ICE connection failed".to_string()),
        },
    );
    assert_eq!(transport.inbox(&a), vec![ServerEvent::TryReconnect]);
    assert!(transport.is_quiet());

    // Room is untouched; the host can restart the handshake
    assert_eq!(relay.registry().state(), RoomState::Paired);
    relay.dispatch(&a, ClientEvent::ReadyForConnection);
    assert_eq!(
        transport.inbox(&b),
        vec![ServerEvent::InitiateConnection { host_id: a }]
    );
}

#[test]
fn test_concurrent_connects_admit_two() {
    let Harness { transport, relay } = setup();
    let relay = Arc::new(relay);

    let handles: Vec<_> = (0..12)
        .map(|i| {
            let relay = relay.clone();
            std::thread::spawn(move || relay.connect(PartyId::from(format!("p{i}"))))
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let admitted: Vec<Role> = results.iter().filter_map(|r| r.as_ref().ok().copied()).collect();
    assert_eq!(admitted.len(), 2);
    assert_eq!(admitted.iter().filter(|role| role.is_host()).count(), 1);
    assert_eq!(
        results
            .iter()
            .filter(|r| matches!(r, Err(Error::RoomFull)))
            .count(),
        10
    );

    let room_full_notices = transport
        .delivered
        .lock()
        .iter()
        .filter(|(_, event)| *event == ServerEvent::room_full())
        .count();
    assert_eq!(room_full_notices, 10);
}
