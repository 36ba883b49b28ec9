use tether_client::DespawnObjectEvent;
use tether_server::{
    DespawnObjectEvent as ServerDespawnEvent, DisconnectEvent, DisconnectPolicy,
    OwnershipReleaseEvent, ServerConfig, ServerError,
};
use tether_shared::{
    NewObject, OwnershipError, OwnershipStatus, ParticipantKey, ReleaseReason, SpawnSource,
};
use tether_test::{assert_single_owner, assert_status, Loopback};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn despawn_config() -> ServerConfig {
    ServerConfig {
        disconnect_policy: DisconnectPolicy::Despawn,
        ..ServerConfig::default()
    }
}

#[test]
fn leaving_owner_releases_everything_it_owned() {
    init_logger();

    let mut loopback = Loopback::new(ServerConfig::default(), 2);
    let a = loopback.key(0);
    let b = loopback.key(1);
    let first = loopback.spawn(1);
    let second = loopback.spawn(2);
    let kept = loopback.spawn(3);

    loopback.client_mut(&a).request_ownership(&first).unwrap();
    loopback.client_mut(&a).request_ownership(&second).unwrap();
    loopback.client_mut(&b).request_ownership(&kept).unwrap();
    loopback.tick_and_exchange();
    loopback.server.take_events();

    loopback.disconnect(&a);
    loopback.tick_and_exchange();

    assert_eq!(loopback.server.owner(&first).unwrap(), None);
    assert_eq!(loopback.server.owner(&second).unwrap(), None);
    assert_eq!(loopback.server.owner(&kept).unwrap(), Some(b));
    assert!(loopback.server.has_object(&first));
    assert_status!(loopback.client(&b), first, OwnershipStatus::Available);
    assert_status!(loopback.client(&b), second, OwnershipStatus::Available);
    assert_status!(loopback.client(&b), kept, OwnershipStatus::Granted);
    assert_single_owner!(loopback, kept);

    let mut events = loopback.server.take_events();
    assert_eq!(events.read::<DisconnectEvent>().collect::<Vec<_>>(), vec![a]);
    let mut releases: Vec<_> = events.read::<OwnershipReleaseEvent>().collect();
    releases.sort_by_key(|(object, _, _)| *object);
    assert_eq!(
        releases,
        vec![
            (first, a, ReleaseReason::OwnerDisconnected),
            (second, a, ReleaseReason::OwnerDisconnected),
        ]
    );
}

#[test]
fn leaving_participant_fails_its_queued_requests() {
    init_logger();

    let mut loopback = Loopback::new(ServerConfig::default(), 2);
    let a = loopback.key(0);
    let b = loopback.key(1);
    let object = loopback.spawn(1);

    let ticket_a = loopback.server.request_ownership(&object, &a).unwrap();
    let ticket_b = loopback.server.request_ownership(&object, &b).unwrap();
    let sweep = loopback.server.disconnect_participant(&a).unwrap();

    assert!(sweep.released.is_empty());
    assert_eq!(sweep.cancelled_requests, 1);
    assert_eq!(
        ticket_a.error(),
        Some(OwnershipError::Disconnected { participant: a })
    );

    loopback.server.tick().unwrap();
    assert!(ticket_b.is_granted());
    assert_eq!(loopback.server.owner(&object).unwrap(), Some(b));
}

#[test]
fn disconnecting_twice_is_an_error() {
    init_logger();

    let mut loopback = Loopback::new(ServerConfig::default(), 1);
    let a = loopback.key(0);
    loopback.disconnect(&a);

    assert_eq!(
        loopback.server.disconnect_participant(&a).unwrap_err(),
        ServerError::UnknownParticipant { participant: a }
    );
    let object = loopback.spawn(1);
    assert!(matches!(
        loopback.server.request_ownership(&object, &a).unwrap_err(),
        ServerError::Ownership(OwnershipError::Disconnected { .. })
    ));
}

#[test]
fn despawn_policy_removes_owned_objects_and_their_children() {
    init_logger();

    let mut loopback = Loopback::new(despawn_config(), 2);
    let a = loopback.key(0);
    let b = loopback.key(1);
    let vehicle = loopback.spawn(1);
    let wheel = loopback.spawn_object(NewObject::new(SpawnSource::Prefab(5)).with_parent(vehicle));
    let unowned = loopback.spawn(2);

    loopback.client_mut(&a).request_ownership(&vehicle).unwrap();
    loopback.tick_and_exchange();
    loopback.server.take_events();
    loopback.client_mut(&b).take_events();

    loopback.disconnect(&a);
    loopback.tick_and_exchange();

    assert!(!loopback.server.has_object(&vehicle));
    assert!(!loopback.server.has_object(&wheel));
    assert!(loopback.server.has_object(&unowned));
    assert!(!loopback.client(&b).has_object(&vehicle));
    assert!(!loopback.client(&b).has_object(&wheel));

    let mut despawned: Vec<_> = loopback
        .client_mut(&b)
        .take_events()
        .read::<DespawnObjectEvent>()
        .collect();
    despawned.sort();
    assert_eq!(despawned, vec![vehicle, wheel]);
    assert_eq!(
        loopback
            .server
            .take_events()
            .read::<ServerDespawnEvent>()
            .collect::<Vec<_>>(),
        vec![wheel, vehicle]
    );
}

#[test]
fn reconnecting_participant_is_caught_up() {
    init_logger();

    let mut loopback = Loopback::new(ServerConfig::default(), 2);
    let a = loopback.key(0);
    let b = loopback.key(1);
    let object = loopback.spawn(1);
    loopback.client_mut(&b).request_ownership(&object).unwrap();
    loopback.tick_and_exchange();

    loopback.disconnect(&a);
    loopback.connect(a);
    loopback.exchange();

    assert_status!(loopback.client(&a), object, OwnershipStatus::Denied);
    assert!(!loopback.client(&a).is_mine(&object));
    assert_eq!(
        loopback.server.participants(),
        vec![ParticipantKey::new(1), ParticipantKey::new(2)]
    );
}
