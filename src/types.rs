use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Spectral band name as it appears in archive file names (e.g. `B4`, `B30`)
pub type Band = &'static str;

/// Ordered red/green/blue band selection
pub type BandTriplet = [Band; 3];

/// Landsat sensor codes, the second character of a scene identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sensor {
    /// Multispectral Scanner (Landsat 1-5)
    #[serde(rename = "M")]
    Mss,
    /// Thematic Mapper (Landsat 4-5)
    #[serde(rename = "T")]
    Tm,
    /// Enhanced Thematic Mapper Plus (Landsat 7)
    #[serde(rename = "E")]
    Etm,
    /// Combined OLI/TIRS (Landsat 8)
    #[serde(rename = "C")]
    OliTirs,
}

impl Sensor {
    pub fn from_code(code: char) -> LandsatResult<Self> {
        match code.to_ascii_uppercase() {
            'M' => Ok(Sensor::Mss),
            'T' => Ok(Sensor::Tm),
            'E' => Ok(Sensor::Etm),
            'C' => Ok(Sensor::OliTirs),
            other => Err(LandsatError::InvalidSatellite(format!(
                "Unknown sensor code: {}",
                other
            ))),
        }
    }

    pub fn code(&self) -> char {
        match self {
            Sensor::Mss => 'M',
            Sensor::Tm => 'T',
            Sensor::Etm => 'E',
            Sensor::OliTirs => 'C',
        }
    }
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Band combinations used for RGB composites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// 4-3-2 natural color
    #[default]
    Natural,
    /// 7-6-4 false color for urban areas
    Urban,
    /// 5-4-3 color infrared for vegetation
    Vegetation,
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMode::Natural => write!(f, "natural"),
            ColorMode::Urban => write!(f, "urban"),
            ColorMode::Vegetation => write!(f, "vegetation"),
        }
    }
}

impl std::str::FromStr for ColorMode {
    type Err = LandsatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "natural" => Ok(ColorMode::Natural),
            "urban" => Ok(ColorMode::Urban),
            "vegetation" => Ok(ColorMode::Vegetation),
            _ => Err(LandsatError::Config(format!("Invalid color mode: {}", s))),
        }
    }
}

/// Geographic bounding box in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl BoundingBox {
    /// Latitudes within ±90 with south <= north, longitudes within ±180
    pub fn validate(&self) -> LandsatResult<()> {
        for (name, value) in [("north", self.north), ("south", self.south)] {
            if !(-90.0..=90.0).contains(&value) {
                return Err(LandsatError::Config(format!(
                    "Bounding box {} latitude {} is outside -90..90",
                    name, value
                )));
            }
        }

        for (name, value) in [("west", self.west), ("east", self.east)] {
            if !(-180.0..=180.0).contains(&value) {
                return Err(LandsatError::Config(format!(
                    "Bounding box {} longitude {} is outside -180..180",
                    name, value
                )));
            }
        }

        if self.south > self.north {
            return Err(LandsatError::Config(format!(
                "Bounding box south ({}) is above north ({})",
                self.south, self.north
            )));
        }

        Ok(())
    }
}

impl std::str::FromStr for BoundingBox {
    type Err = LandsatError;

    /// Parse `north,west,south,east`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| LandsatError::Config(format!("Invalid bounding box '{}': {}", s, e)))?;

        if values.len() != 4 {
            return Err(LandsatError::Config(format!(
                "Bounding box needs 4 values (north,west,south,east), got {}",
                values.len()
            )));
        }

        let bbox = BoundingBox {
            north: values[0],
            west: values[1],
            south: values[2],
            east: values[3],
        };

        bbox.validate()?;
        Ok(bbox)
    }
}

/// Error types for Landsat processing
#[derive(Debug, thiserror::Error)]
pub enum LandsatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scene identifier: {0}")]
    InvalidSceneId(String),

    #[error("Invalid satellite: {0}")]
    InvalidSatellite(String),

    #[error("Unsupported band combination: {0}")]
    UnsupportedBands(String),

    #[error("Invalid year: {0}")]
    InvalidYear(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing input: {}", .0.display())]
    MissingInput(PathBuf),

    #[error("{program} exited with {status}: {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// Result type for Landsat operations
pub type LandsatResult<T> = Result<T, LandsatError>;
