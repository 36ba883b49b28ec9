use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};

use tether_server::{ErrorEvent, Server, ServerConfig, ServerError};
use tether_shared::{
    Actor, NewObject, OwnershipError, ParticipantKey, PropertyValue, SpawnSource, Transform,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// An observer polling the owner from another thread never sees the object
/// unowned while it is handed back and forth
#[test]
fn transfer_is_never_observed_halfway() {
    init_logger();

    let mut server = Server::new(ServerConfig::default());
    let a = ParticipantKey::new(1);
    let b = ParticipantKey::new(2);
    server.connect_participant(&a).unwrap();
    server.connect_participant(&b).unwrap();
    let object = server
        .spawn_object(NewObject::new(SpawnSource::Prefab(1)))
        .unwrap();
    server.request_ownership(&object, &a).unwrap();
    server.tick().unwrap();

    let accessor = server.owner_accessor(&object).unwrap();
    let done = Arc::new(AtomicBool::new(false));
    let observer = {
        let done = done.clone();
        thread::spawn(move || {
            let mut observations = 0u64;
            let mut last_generation = accessor.generation().unwrap();
            while !done.load(Ordering::Acquire) {
                let owner = accessor.owner().unwrap();
                assert!(owner.is_some(), "observed the object unowned mid-transfer");
                let generation = accessor.generation().unwrap();
                assert!(generation >= last_generation);
                last_generation = generation;
                observations += 1;
            }
            observations
        })
    };

    let mut holder = a;
    for _ in 0..2_000 {
        let next = if holder == a { b } else { a };
        server.transfer_ownership(&object, &holder, &next).unwrap();
        holder = next;
    }
    done.store(true, Ordering::Release);

    let observations = observer.join().unwrap();
    assert!(observations > 0);
    assert_eq!(server.owner(&object).unwrap(), Some(holder));
}

/// Lookups run from other threads while the authority spawns, writes and despawns
#[test]
fn lookups_run_alongside_mutation() {
    init_logger();

    let mut server = Server::default();
    let anchor = server
        .spawn_object(NewObject::new(SpawnSource::Scene("anchor".to_string())))
        .unwrap();
    let accessor = server.owner_accessor(&anchor).unwrap();

    let done = Arc::new(AtomicBool::new(false));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let accessor = accessor.clone();
            let done = done.clone();
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    assert_eq!(accessor.owner().unwrap(), None);
                }
            })
        })
        .collect();

    for step in 0..500 {
        let object = server
            .spawn_object(NewObject::new(SpawnSource::Prefab(step)))
            .unwrap();
        server
            .set_transform(
                &Actor::Server,
                &object,
                Transform::from_position([step as f32, 0.0, 0.0]),
            )
            .unwrap();
        assert_eq!(server.object(&anchor).unwrap().id, anchor);
        server.despawn_object(&object).unwrap();
    }
    done.store(true, Ordering::Release);

    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(server.objects().unwrap().len(), 1);
}

/// Property writes sent from worker threads land in the next flush
#[test]
fn property_commands_from_workers_are_flushed_once() {
    init_logger();

    let mut server = Server::default();
    let object = server
        .spawn_object(NewObject::new(SpawnSource::Prefab(1)))
        .unwrap();
    server.tick().unwrap();
    server.take_frames();

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let sender = server.property_command_sender();
            thread::spawn(move || {
                for index in 0..25 {
                    sender
                        .set_property(
                            &Actor::Server,
                            &object,
                            format!("w{}-{}", worker, index),
                            index,
                        )
                        .unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    server.tick().unwrap();
    let frames = server.take_frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].properties.as_ref().map(|changes| changes.len()), Some(100));
    assert_eq!(server.properties(&object).map(|values| values.len()), Some(100));

    server.tick().unwrap();
    assert!(server.take_frames().is_empty());
}

/// Worker threads write on behalf of an Actor, and only the owner's writes land
#[test]
fn worker_writes_respect_the_owner() {
    init_logger();

    let mut server = Server::default();
    let a = ParticipantKey::new(1);
    let b = ParticipantKey::new(2);
    server.connect_participant(&a).unwrap();
    server.connect_participant(&b).unwrap();
    let object = server
        .spawn_object(NewObject::new(SpawnSource::Prefab(1)))
        .unwrap();
    server.request_ownership(&object, &a).unwrap();
    server.tick().unwrap();
    server
        .set_property(&Actor::Participant(a), &object, "score", 5)
        .unwrap();
    assert!(server
        .set_property(&Actor::Participant(b), &object, "score", 99)
        .is_err());
    server.take_events();

    let sender = server.property_command_sender();
    thread::spawn(move || {
        sender
            .set_property(&Actor::Participant(b), &object, "score", 99)
            .unwrap();
    })
    .join()
    .unwrap();
    server.tick().unwrap();

    assert_eq!(server.owner(&object).unwrap(), Some(a));
    assert_eq!(server.property(&object, "score"), Some(&PropertyValue::Int(5)));
    let errors: Vec<ServerError> = server.take_events().read::<ErrorEvent>().collect();
    assert_eq!(
        errors,
        vec![ServerError::Ownership(OwnershipError::NotOwner {
            object,
            actor: Actor::Participant(b),
            owner: Some(a),
        })]
    );
}
