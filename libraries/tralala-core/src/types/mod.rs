mod engine;
mod settings;
mod track;

pub use engine::{
    Capability, EngineEvent, EngineItem, EngineState, RemoteCommand, COMPACT_CAPABILITIES,
    DEFAULT_CAPABILITIES,
};
pub use settings::{find_setting, SettingRow};
pub use track::{CatalogItem, Cover, Track};
