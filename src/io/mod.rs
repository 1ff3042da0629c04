//! I/O modules for the inventory service, the public bucket and external tools

pub mod command;
pub mod earthexplorer;
pub mod storage;

pub use command::{CommandRunner, DryRunner, ExternalCommand, ProcessRunner};
pub use earthexplorer::{EarthExplorer, InventoryEntry, SceneQuery, SceneSource};
