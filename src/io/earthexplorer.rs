//! USGS EarthExplorer inventory client.
//!
//! The inventory stream answers a GET with namespaced XML listing one
//! `metaData` element per scene. Only `sceneID` and `cloudCoverFull` are read.

use crate::core::satellite::dataset_name;
use crate::core::SceneId;
use crate::types::{BoundingBox, LandsatError, LandsatResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::time::Duration;

pub const DEFAULT_INVENTORY_URL: &str = "http://earthexplorer.usgs.gov/EE/InventoryStream";

/// Namespace of the inventory metadata elements
pub const METADATA_NAMESPACE: &str = "http://upe.ldcm.usgs.gov/schema/metadata";

/// Area to search the inventory for
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneQuery {
    /// WRS-2 path and row
    PathRow { path: u32, row: u32 },
    /// Latitude/longitude bounds
    BoundingBox(BoundingBox),
}

/// One scene entry from the inventory response
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryEntry {
    pub scene_id: String,
    pub cloud_cover: f64,
}

/// Anything that can list scene identifiers for a year and area
pub trait SceneSource {
    fn find_scenes(&self, year: i32, query: &SceneQuery) -> LandsatResult<Vec<SceneId>>;
}

/// Search USGS EarthExplorer for scene identifiers
pub struct EarthExplorer {
    base_url: String,
    max_cloud_cover: f64,
    client: reqwest::blocking::Client,
}

impl EarthExplorer {
    pub fn new(max_cloud_cover: f64, timeout: Duration) -> LandsatResult<Self> {
        Self::with_base_url(DEFAULT_INVENTORY_URL, max_cloud_cover, timeout)
    }

    pub fn with_base_url(
        base_url: &str,
        max_cloud_cover: f64,
        timeout: Duration,
    ) -> LandsatResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LandsatError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            max_cloud_cover,
            client,
        })
    }

    /// Inventory URL covering the full calendar year
    pub fn inventory_url(&self, year: i32, query: &SceneQuery) -> LandsatResult<String> {
        let sensor = dataset_name(year)?;
        let dates = format!("start_date={year}-01-01&end_date={year}-12-31");

        Ok(match query {
            SceneQuery::PathRow { path, row } => format!(
                "{}/pathrow?start_path={path}&end_path={path}&start_row={row}&end_row={row}&sensor={sensor}&{dates}",
                self.base_url
            ),
            SceneQuery::BoundingBox(bb) => format!(
                "{}/latlong?north={}&south={}&east={}&west={}&sensor={sensor}&{dates}",
                self.base_url, bb.north, bb.south, bb.east, bb.west
            ),
        })
    }

    /// Fetch the raw inventory XML
    pub fn fetch_inventory(&self, url: &str) -> LandsatResult<String> {
        log::info!("Querying inventory: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| LandsatError::Http(format!("Inventory request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(LandsatError::Http(format!(
                "Inventory request failed with status: {}",
                response.status()
            )));
        }

        response
            .text()
            .map_err(|e| LandsatError::Http(format!("Failed to read inventory response: {}", e)))
    }
}

impl SceneSource for EarthExplorer {
    fn find_scenes(&self, year: i32, query: &SceneQuery) -> LandsatResult<Vec<SceneId>> {
        let url = self.inventory_url(year, query)?;
        let xml = self.fetch_inventory(&url)?;
        let entries = parse_inventory(&xml)?;
        log::debug!("Inventory returned {} scenes", entries.len());
        Ok(filter_cloud_cover(entries, self.max_cloud_cover))
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Field {
    None,
    SceneId,
    CloudCover,
}

/// Parse `metaData` entries in document order.
///
/// Elements are matched on their local name so both prefixed and default
/// namespace documents are accepted.
pub fn parse_inventory(xml_content: &str) -> LandsatResult<Vec<InventoryEntry>> {
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut entries = Vec::new();
    let mut buf = Vec::new();

    let mut in_metadata = false;
    let mut field = Field::None;
    let mut scene_id: Option<String> = None;
    let mut cloud_cover: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"metaData" => {
                    in_metadata = true;
                    scene_id = None;
                    cloud_cover = None;
                }
                b"sceneID" if in_metadata => field = Field::SceneId,
                b"cloudCoverFull" if in_metadata => field = Field::CloudCover,
                _ => field = Field::None,
            },
            Ok(Event::Text(ref e)) => {
                if field != Field::None {
                    let text = e
                        .unescape()
                        .map_err(|e| LandsatError::XmlParsing(format!("Bad text node: {}", e)))?
                        .to_string();
                    match field {
                        Field::SceneId => scene_id = Some(text),
                        Field::CloudCover => cloud_cover = Some(text),
                        Field::None => {}
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.local_name().as_ref() == b"metaData" {
                    in_metadata = false;
                    entries.push(build_entry(scene_id.take(), cloud_cover.take())?);
                }
                field = Field::None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(LandsatError::XmlParsing(format!(
                    "Inventory XML error at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if in_metadata {
        return Err(LandsatError::XmlParsing(
            "Inventory XML ended inside a metaData element".to_string(),
        ));
    }

    Ok(entries)
}

fn build_entry(scene_id: Option<String>, cloud_cover: Option<String>) -> LandsatResult<InventoryEntry> {
    let scene_id = scene_id.ok_or_else(|| {
        LandsatError::XmlParsing("metaData element without sceneID".to_string())
    })?;
    let cloud_cover = cloud_cover.ok_or_else(|| {
        LandsatError::XmlParsing(format!("{} has no cloudCoverFull", scene_id))
    })?;
    let cloud_cover = cloud_cover.trim().parse::<f64>().map_err(|e| {
        LandsatError::XmlParsing(format!(
            "{} has invalid cloud cover '{}': {}",
            scene_id, cloud_cover, e
        ))
    })?;

    Ok(InventoryEntry {
        scene_id,
        cloud_cover,
    })
}

/// Drop scenes whose cloud cover exceeds the ceiling, keeping document order.
///
/// Identifiers that are not pre-collection scene ids are logged and skipped.
pub fn filter_cloud_cover(entries: Vec<InventoryEntry>, max_cloud_cover: f64) -> Vec<SceneId> {
    let mut scene_ids = Vec::new();

    for entry in entries {
        if entry.cloud_cover > max_cloud_cover {
            log::info!(
                "Skipping {}, {:.0}% cloud cover",
                entry.scene_id,
                entry.cloud_cover
            );
            continue;
        }
        match SceneId::new(entry.scene_id) {
            Ok(id) => scene_ids.push(id),
            Err(e) => log::warn!("Skipping inventory entry: {}", e),
        }
    }

    scene_ids
}
