/// Where an object was instantiated from. Opaque to the ownership core, it is
/// only carried along so the spawn layer can recreate the object remotely.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SpawnSource {
    /// Instantiated from a registered network prefab
    Prefab(u32),
    /// Already present in a loaded scene, identified by the scene object's guid
    Scene(String),
}
