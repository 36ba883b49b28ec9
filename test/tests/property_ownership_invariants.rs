/// PROPERTY-BASED TESTS: ownership and flush invariants
///
/// Key invariants:
/// 1. An object's owner is always the Server or a connected participant
/// 2. No two clients believe they own the same object
/// 3. Every property write between two flushes shows up in exactly one flush
use std::collections::HashMap;

use proptest::prelude::*;

use tether_server::{Server, ServerConfig};
use tether_shared::{ObjectId, ParticipantKey, PropertyChangeLog, PropertyValue, SpawnSource};
use tether_test::{assert_single_owner, Loopback};

const PARTICIPANTS: u64 = 3;
const OBJECTS: usize = 3;

#[derive(Clone, Debug)]
enum ServerOp {
    Request(u64, usize),
    Release(u64, usize),
    Transfer(u64, usize, u64),
    Reclaim(usize),
    Disconnect(u64),
    Connect(u64),
    Tick,
}

fn participant_strategy() -> impl Strategy<Value = u64> {
    1u64..=PARTICIPANTS
}

fn object_strategy() -> impl Strategy<Value = usize> {
    0usize..OBJECTS
}

fn server_op_strategy() -> impl Strategy<Value = ServerOp> {
    prop_oneof![
        4 => (participant_strategy(), object_strategy()).prop_map(|(p, o)| ServerOp::Request(p, o)),
        2 => (participant_strategy(), object_strategy()).prop_map(|(p, o)| ServerOp::Release(p, o)),
        2 => (participant_strategy(), object_strategy(), participant_strategy())
            .prop_map(|(p, o, q)| ServerOp::Transfer(p, o, q)),
        1 => object_strategy().prop_map(ServerOp::Reclaim),
        1 => participant_strategy().prop_map(ServerOp::Disconnect),
        1 => participant_strategy().prop_map(ServerOp::Connect),
        3 => Just(ServerOp::Tick),
    ]
}

#[derive(Clone, Debug)]
enum ClientOp {
    Request(usize, usize),
    Release(usize, usize),
    Transfer(usize, usize, usize),
}

fn client_op_strategy() -> impl Strategy<Value = ClientOp> {
    let client = 0usize..PARTICIPANTS as usize;
    prop_oneof![
        (client.clone(), object_strategy()).prop_map(|(c, o)| ClientOp::Request(c, o)),
        (client.clone(), object_strategy()).prop_map(|(c, o)| ClientOp::Release(c, o)),
        (client.clone(), object_strategy(), client).prop_map(|(c, o, t)| ClientOp::Transfer(c, o, t)),
    ]
}

#[derive(Clone, Debug)]
enum LogOp {
    Set(usize, i64),
    Remove(usize),
    Flush,
}

fn log_op_strategy() -> impl Strategy<Value = LogOp> {
    prop_oneof![
        4 => (0usize..5, any::<i64>()).prop_map(|(k, v)| LogOp::Set(k, v)),
        2 => (0usize..5).prop_map(LogOp::Remove),
        1 => Just(LogOp::Flush),
    ]
}

fn check_owners(server: &Server, objects: &[ObjectId]) -> Result<(), TestCaseError> {
    for object in objects {
        if let Some(owner) = server.owner(object).unwrap() {
            prop_assert!(
                server.is_connected(&owner),
                "{} is owned by disconnected {:?}",
                object,
                owner
            );
            prop_assert!(server.owned_objects(&owner).unwrap().contains(object));
        }
    }
    for participant in server.participants() {
        for owned in server.owned_objects(&participant).unwrap() {
            prop_assert_eq!(server.owner(&owned).unwrap(), Some(participant));
        }
    }
    Ok(())
}

proptest! {
    /// Any sequence of ownership operations leaves every owner connected,
    /// with the per-participant index agreeing with the owner cells
    #[test]
    fn prop_owner_is_always_connected(ops in prop::collection::vec(server_op_strategy(), 1..60)) {
        let mut server = Server::new(ServerConfig::default());
        for key in 1..=PARTICIPANTS {
            server.connect_participant(&ParticipantKey::new(key)).unwrap();
        }
        let objects: Vec<ObjectId> = (0..OBJECTS)
            .map(|index| server.spawn_object(server.new_object(SpawnSource::Prefab(index as u32))).unwrap())
            .collect();

        for op in ops {
            // rejected operations are expected, only the invariants matter
            let _ = match op {
                ServerOp::Request(p, o) => server.request_ownership(&objects[o], &ParticipantKey::new(p)).map(|_| ()),
                ServerOp::Release(p, o) => server.release_ownership(&objects[o], &ParticipantKey::new(p)),
                ServerOp::Transfer(p, o, q) => server.transfer_ownership(&objects[o], &ParticipantKey::new(p), &ParticipantKey::new(q)),
                ServerOp::Reclaim(o) => server.reclaim_ownership(&objects[o]).map(|_| ()),
                ServerOp::Disconnect(p) => server.disconnect_participant(&ParticipantKey::new(p)).map(|_| ()),
                ServerOp::Connect(p) => server.connect_participant(&ParticipantKey::new(p)),
                ServerOp::Tick => server.tick().map(|_| ()),
            };
            check_owners(&server, &objects)?;
        }
    }

    /// After every full exchange, at most one client believes it owns each
    /// object, and that client is the owner the Server reports
    #[test]
    fn prop_no_two_clients_own_the_same_object(
        rounds in prop::collection::vec(prop::collection::vec(client_op_strategy(), 0..4), 1..25)
    ) {
        let mut loopback = Loopback::new(ServerConfig::default(), PARTICIPANTS);
        let keys: Vec<ParticipantKey> = (0..PARTICIPANTS as usize).map(|index| loopback.key(index)).collect();
        let objects: Vec<ObjectId> = (0..OBJECTS as u32).map(|prefab| loopback.spawn(prefab)).collect();

        for round in rounds {
            for op in round {
                // clients refuse actions their status does not allow
                let _ = match op {
                    ClientOp::Request(c, o) => loopback.client_mut(&keys[c]).request_ownership(&objects[o]),
                    ClientOp::Release(c, o) => loopback.client_mut(&keys[c]).release_ownership(&objects[o]),
                    ClientOp::Transfer(c, o, t) => {
                        let to = keys[t];
                        loopback.client_mut(&keys[c]).transfer_ownership(&objects[o], &to)
                    }
                };
            }
            let delivery = loopback.tick_and_exchange();
            prop_assert!(delivery.client_errors.is_empty());
            for object in &objects {
                assert_single_owner!(loopback, *object);
            }
        }
    }

    /// Each flush carries exactly the net effect of the writes made since
    /// the previous flush, and nothing else
    #[test]
    fn prop_flush_is_exactly_once(ops in prop::collection::vec(log_op_strategy(), 1..80)) {
        let mut log = PropertyChangeLog::new();
        let object = ObjectId::new(1);
        log.track(&object).unwrap();

        // key -> Some(value) for a set, None for a removal, within the open interval
        let mut interval: HashMap<String, Option<i64>> = HashMap::new();

        for op in ops.into_iter().chain(std::iter::once(LogOp::Flush)) {
            match op {
                LogOp::Set(key, value) => {
                    log.set_property(&object, format!("k{}", key), value).unwrap();
                    interval.insert(format!("k{}", key), Some(value));
                }
                LogOp::Remove(key) => {
                    log.remove_property(&object, format!("k{}", key)).unwrap();
                    interval.insert(format!("k{}", key), None);
                }
                LogOp::Flush => {
                    let changes = log.flush(&object).unwrap();
                    prop_assert_eq!(changes.len(), interval.len());
                    for (key, expected) in interval.drain() {
                        match expected {
                            Some(value) => {
                                prop_assert_eq!(changes.get(&key), Some(&PropertyValue::Int(value)));
                                prop_assert!(!changes.is_removed(&key));
                            }
                            None => {
                                prop_assert!(changes.is_removed(&key));
                                prop_assert!(changes.get(&key).is_none());
                            }
                        }
                    }
                }
            }
        }

        prop_assert!(log.flush(&object).unwrap().is_empty());
    }
}
