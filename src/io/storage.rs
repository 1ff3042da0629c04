use crate::core::{Satellite, SceneId};
use crate::io::command::ExternalCommand;
use std::path::Path;

/// Public bucket holding the pre-collection Landsat archives
pub const PUBLIC_BUCKET: &str = "gs://earthengine-public";

/// File name of a scene archive
pub fn archive_name(scene_id: &SceneId) -> String {
    format!("{}.tar.bz", scene_id)
}

/// Object URL: `landsat/<google_id>/<path>/<row>/<scene_id>.tar.bz`
pub fn archive_url(scene_id: &SceneId, satellite: &Satellite) -> String {
    format!(
        "{}/landsat/{}/{}/{}/{}",
        PUBLIC_BUCKET,
        satellite.google_id(),
        scene_id.path(),
        scene_id.row(),
        archive_name(scene_id)
    )
}

/// `gsutil cp <url> <dest_dir>`
pub fn copy_command(url: &str, dest_dir: &Path) -> ExternalCommand {
    ExternalCommand::new("gsutil")
        .arg("cp")
        .arg(url)
        .path_arg(dest_dir)
}
