/// Regression tests for ownership edge cases found while wiring Clients to
/// the Server: duplicate requests, releases racing their own request,
/// Clients that miss status updates, and requests for despawned objects.
use tether_client::{OwnershipDeniedEvent, OwnershipResetEvent};
use tether_server::{
    OwnershipGrantEvent, OwnershipReclaimEvent, ServerConfig, ServerError,
};
use tether_shared::{OwnershipError, OwnershipStatus};
use tether_test::{assert_single_owner, assert_status, Loopback};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn duplicate_request_shares_one_ticket() {
    init_logger();
    let mut loopback = Loopback::new(ServerConfig::default(), 1);
    let a = loopback.key(0);
    let object = loopback.spawn(1);

    let first = loopback.server.request_ownership(&object, &a).unwrap();
    let second = loopback.server.request_ownership(&object, &a).unwrap();
    assert!(first.same_request(&second));

    loopback.tick_and_exchange();

    assert!(first.is_granted());
    assert!(second.is_granted());
    let mut events = loopback.server.take_events();
    assert_eq!(
        events.read::<OwnershipGrantEvent>().collect::<Vec<_>>(),
        vec![(object, a)]
    );
}

#[test]
fn release_racing_its_own_request_still_converges() {
    init_logger();
    let mut loopback = Loopback::new(ServerConfig::default(), 1);
    let a = loopback.key(0);
    let object = loopback.spawn(1);

    loopback.client_mut(&a).request_ownership(&object).unwrap();
    loopback.client_mut(&a).release_ownership(&object).unwrap();
    let delivery = loopback.tick_and_exchange();

    // the release reached the Server before the request was resolved
    assert_eq!(delivery.server_errors.len(), 1);
    assert!(matches!(
        delivery.server_errors[0].1,
        ServerError::Ownership(OwnershipError::NotOwner { .. })
    ));
    assert_eq!(loopback.server.owner(&object).unwrap(), Some(a));
    assert_status!(loopback.client(&a), object, OwnershipStatus::Granted);
    assert_single_owner!(loopback, object);
}

#[test]
fn muted_client_converges_after_unmute() {
    init_logger();
    let mut loopback = Loopback::new(ServerConfig::default(), 2);
    let a = loopback.key(0);
    let b = loopback.key(1);
    let object = loopback.spawn(1);

    loopback.mute(&b);
    loopback.client_mut(&a).request_ownership(&object).unwrap();
    loopback.tick_and_exchange();

    // b never heard about the grant
    assert_status!(loopback.client(&b), object, OwnershipStatus::Available);
    loopback.unmute(&b);

    loopback.client_mut(&b).request_ownership(&object).unwrap();
    loopback.tick_and_exchange();

    assert_status!(loopback.client(&b), object, OwnershipStatus::Denied);
    assert!(loopback
        .client_mut(&b)
        .take_events()
        .has::<OwnershipDeniedEvent>());
    assert_eq!(loopback.server.owner(&object).unwrap(), Some(a));
    assert_single_owner!(loopback, object);
}

#[test]
fn reclaim_makes_the_object_available_to_everyone() {
    init_logger();
    let mut loopback = Loopback::new(ServerConfig::default(), 2);
    let a = loopback.key(0);
    let b = loopback.key(1);
    let object = loopback.spawn(1);

    loopback.client_mut(&a).request_ownership(&object).unwrap();
    loopback.tick_and_exchange();
    loopback.client_mut(&a).take_events();
    loopback.server.take_events();

    assert!(loopback.server.reclaim_ownership(&object).unwrap());
    assert!(!loopback.server.reclaim_ownership(&object).unwrap());
    loopback.tick_and_exchange();

    assert_eq!(loopback.server.owner(&object).unwrap(), None);
    assert_status!(loopback.client(&a), object, OwnershipStatus::Available);
    assert_status!(loopback.client(&b), object, OwnershipStatus::Available);
    assert!(loopback
        .client_mut(&a)
        .take_events()
        .has::<OwnershipResetEvent>());
    let mut events = loopback.server.take_events();
    assert_eq!(
        events.read::<OwnershipReclaimEvent>().collect::<Vec<_>>(),
        vec![(object, a)]
    );
}

#[test]
fn request_for_despawned_object_is_answered_with_despawn() {
    init_logger();
    let mut loopback = Loopback::new(ServerConfig::default(), 1);
    let a = loopback.key(0);
    let object = loopback.spawn(1);

    loopback.client_mut(&a).request_ownership(&object).unwrap();
    loopback.server.despawn_object(&object).unwrap();
    let delivery = loopback.exchange();

    assert_eq!(delivery.server_errors.len(), 1);
    assert!(delivery.client_errors.is_empty());
    assert!(!loopback.client(&a).has_object(&object));
    assert!(!loopback.server.has_object(&object));
}
