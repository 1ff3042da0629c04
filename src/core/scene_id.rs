use crate::types::{LandsatError, LandsatResult, Sensor};
use chrono::NaiveDate;

/// Length of a pre-collection Landsat scene identifier
pub const SCENE_ID_LEN: usize = 21;

/// A Landsat scene identifier like `LT41910561988052AAA03`.
///
/// Layout: `L` + sensor + version + path(3) + row(3) + year(4) + day-of-year(3)
/// + ground station(3) + archive version(2). Only the length is validated;
/// the accessors are plain substrings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SceneId(String);

impl SceneId {
    pub fn new(id: impl Into<String>) -> LandsatResult<Self> {
        let id = id.into();
        let id = id.trim().to_string();

        if id.len() != SCENE_ID_LEN {
            return Err(LandsatError::InvalidSceneId(format!(
                "'{}' has {} characters, expected {}",
                id,
                id.len(),
                SCENE_ID_LEN
            )));
        }

        // Byte offsets below assume one byte per character
        if !id.is_ascii() {
            return Err(LandsatError::InvalidSceneId(format!(
                "'{}' contains non-ASCII characters",
                id
            )));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn sensor_code(&self) -> char {
        self.0.as_bytes()[1] as char
    }

    pub fn sensor(&self) -> LandsatResult<Sensor> {
        Sensor::from_code(self.sensor_code())
    }

    pub fn version(&self) -> LandsatResult<u8> {
        let c = self.0.as_bytes()[2] as char;
        c.to_digit(10).map(|d| d as u8).ok_or_else(|| {
            LandsatError::InvalidSceneId(format!("'{}' has non-numeric version '{}'", self.0, c))
        })
    }

    pub fn path(&self) -> &str {
        &self.0[3..6]
    }

    pub fn row(&self) -> &str {
        &self.0[6..9]
    }

    pub fn year(&self) -> &str {
        &self.0[9..13]
    }

    pub fn day(&self) -> &str {
        &self.0[13..16]
    }

    pub fn ground_station_id(&self) -> &str {
        &self.0[16..19]
    }

    pub fn archive_version(&self) -> &str {
        &self.0[19..21]
    }

    /// Calendar date of acquisition from the year and day-of-year fields
    pub fn acquisition_date(&self) -> LandsatResult<NaiveDate> {
        let year: i32 = self.year().parse().map_err(|_| {
            LandsatError::InvalidSceneId(format!("'{}' has non-numeric year", self.0))
        })?;
        let day: u32 = self.day().parse().map_err(|_| {
            LandsatError::InvalidSceneId(format!("'{}' has non-numeric day of year", self.0))
        })?;

        NaiveDate::from_yo_opt(year, day).ok_or_else(|| {
            LandsatError::InvalidSceneId(format!(
                "'{}' has out of range day of year {} for {}",
                self.0, day, year
            ))
        })
    }
}

impl std::fmt::Display for SceneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for SceneId {
    type Err = LandsatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for SceneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
