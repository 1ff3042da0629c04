//! Scene model and processing steps

pub mod satellite;
pub mod scene_id;
pub mod scene;
pub mod mosaic;
pub mod pipeline;

// Re-export main types
pub use satellite::{Satellite, dataset_name};
pub use scene_id::{SceneId, SCENE_ID_LEN};
pub use scene::{Scene, SceneOptions, MergeTool, Cutline, ColorCorrection, ChannelLevels, CorrectionMethod};
pub use mosaic::{find_tiles, merge_tiles, MosaicOutcome};
pub use pipeline::{Pipeline, RunSummary};
