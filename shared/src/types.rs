pub type Tick = u32;

/// Identity of a connected participant, assigned by the transport layer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParticipantKey(u64);

impl ParticipantKey {
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn to_u64(&self) -> u64 {
        self.0
    }
}

/// Whoever is performing a mutation on an object.
///
/// The Server acts as the implicit owner of every unowned object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Actor {
    Server,
    Participant(ParticipantKey),
}

impl Actor {
    /// Returns true if this Actor is the single writer for an object with the given owner
    pub fn is_owner_of(&self, owner: Option<ParticipantKey>) -> bool {
        match (self, owner) {
            (Actor::Server, None) => true,
            (Actor::Participant(participant), Some(owner)) => *participant == owner,
            _ => false,
        }
    }
}
