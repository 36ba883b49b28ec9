use log::debug;

use tether_client::{Client, ClientError};
use tether_server::{Server, ServerConfig, ServerError};
use tether_shared::{NewObject, ObjectId, ParticipantKey, SpawnSource};

/// What happened to the messages of one exchange
#[derive(Debug, Default)]
pub struct Delivery {
    /// Participant messages the Server turned down
    pub server_errors: Vec<(ParticipantKey, ServerError)>,
    /// Authority messages a Client turned down
    pub client_errors: Vec<(ParticipantKey, ClientError)>,
    /// Replication frames each Client applied
    pub frames_applied: usize,
}

/// One Server and a set of Clients wired together in memory.
///
/// Delivery is instant and lossless unless a Client is muted, in which case
/// everything addressed to it is dropped.
pub struct Loopback {
    pub server: Server,
    clients: Vec<Client>,
    muted: Vec<ParticipantKey>,
}

impl Loopback {
    /// A Server with `client_count` connected Clients, keyed 1..=client_count
    pub fn new(config: ServerConfig, client_count: u64) -> Self {
        let mut loopback = Self {
            server: Server::new(config),
            clients: Vec::new(),
            muted: Vec::new(),
        };
        for key in 1..=client_count {
            loopback.connect(ParticipantKey::new(key));
        }
        loopback.exchange();
        loopback
    }

    pub fn connect(&mut self, participant: ParticipantKey) -> &mut Client {
        self.server
            .connect_participant(&participant)
            .expect("participant should connect");
        self.clients.push(Client::new(participant));
        let index = self.clients.len() - 1;
        &mut self.clients[index]
    }

    /// Disconnects a participant on the Server and drops its Client
    pub fn disconnect(&mut self, participant: &ParticipantKey) {
        self.server
            .disconnect_participant(participant)
            .expect("participant should disconnect");
        self.clients
            .retain(|client| client.participant_key() != *participant);
    }

    pub fn key(&self, index: usize) -> ParticipantKey {
        self.clients[index].participant_key()
    }

    pub fn client(&self, participant: &ParticipantKey) -> &Client {
        self.clients
            .iter()
            .find(|client| client.participant_key() == *participant)
            .expect("no client for participant")
    }

    pub fn client_mut(&mut self, participant: &ParticipantKey) -> &mut Client {
        self.clients
            .iter_mut()
            .find(|client| client.participant_key() == *participant)
            .expect("no client for participant")
    }

    pub fn clients(&self) -> &[Client] {
        &self.clients
    }

    pub fn mute(&mut self, participant: &ParticipantKey) {
        self.muted.push(*participant);
    }

    pub fn unmute(&mut self, participant: &ParticipantKey) {
        self.muted.retain(|muted| muted != participant);
    }

    /// Spawns a prefab object and lets every Client hear about it
    pub fn spawn(&mut self, prefab: u32) -> ObjectId {
        let new_object = self.server.new_object(SpawnSource::Prefab(prefab));
        self.spawn_object(new_object)
    }

    pub fn spawn_object(&mut self, new_object: NewObject) -> ObjectId {
        let object = self
            .server
            .spawn_object(new_object)
            .expect("object should spawn");
        self.exchange();
        object
    }

    /// Delivers Client messages to the Server, then Server messages and
    /// frames to the Clients, without ticking
    pub fn exchange(&mut self) -> Delivery {
        let mut delivery = Delivery::default();
        self.deliver_to_server(&mut delivery);
        self.deliver_to_clients(&mut delivery);
        delivery
    }

    /// Delivers Client messages, ticks the Server once and delivers everything it produced
    pub fn tick_and_exchange(&mut self) -> Delivery {
        let mut delivery = Delivery::default();
        self.deliver_to_server(&mut delivery);
        self.server.tick().expect("server tick should succeed");
        self.deliver_to_clients(&mut delivery);
        delivery
    }

    pub fn tick_and_exchange_n_times(&mut self, n: usize) {
        for _ in 0..n {
            self.tick_and_exchange();
        }
    }

    fn deliver_to_server(&mut self, delivery: &mut Delivery) {
        for client in self.clients.iter_mut() {
            let participant = client.participant_key();
            for message in client.take_outgoing_messages() {
                debug!("Loopback: {:?} -> server: {:?}", participant, message);
                if let Err(error) = self.server.receive_message(&participant, message) {
                    delivery.server_errors.push((participant, error));
                }
            }
        }
    }

    fn deliver_to_clients(&mut self, delivery: &mut Delivery) {
        for (participant, message) in self.server.take_outgoing_messages() {
            if self.muted.contains(&participant) {
                continue;
            }
            let Some(client) = self
                .clients
                .iter_mut()
                .find(|client| client.participant_key() == participant)
            else {
                continue;
            };
            debug!("Loopback: server -> {:?}: {:?}", participant, message);
            if let Err(error) = client.receive_message(message) {
                delivery.client_errors.push((participant, error));
            }
        }

        let frames = self.server.take_frames();
        for client in self.clients.iter_mut() {
            if self.muted.contains(&client.participant_key()) {
                continue;
            }
            for frame in &frames {
                if client.receive_frame(frame) {
                    delivery.frames_applied += 1;
                }
            }
        }
    }
}
