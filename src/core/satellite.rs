use crate::types::{BandTriplet, ColorMode, LandsatError, LandsatResult, Sensor};

/// Configuration data for a given Landsat satellite.
///
/// Band names follow the archive layout of the public bucket: Landsat 4/5 TM
/// scenes use the two-digit `B10`..`B70` naming, everything else single digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Satellite {
    version: u8,
    sensor: Sensor,
}

impl Satellite {
    /// Build a satellite with the sensor it carried by default
    pub fn new(version: u8) -> LandsatResult<Self> {
        Self::validate_version(version)?;
        Ok(Self {
            version,
            sensor: Self::default_sensor(version),
        })
    }

    /// Build a satellite with an explicit sensor, as encoded in a scene identifier
    pub fn with_sensor(version: u8, sensor: Sensor) -> LandsatResult<Self> {
        Self::validate_version(version)?;
        Ok(Self { version, sensor })
    }

    /// Build a satellite from a scene identifier's version and sensor letter.
    ///
    /// The letter only overrides the default sensor when that sensor flew on
    /// the satellite (MSS on Landsat 4/5). Other letters, like the `O` and `T`
    /// of OLI-only and TIRS-only Landsat 8 scenes, keep the default.
    pub fn for_scene(version: u8, sensor_code: char) -> LandsatResult<Self> {
        let mut satellite = Self::new(version)?;
        match Sensor::from_code(sensor_code) {
            Ok(sensor) if Self::flew(version, sensor) => satellite.sensor = sensor,
            _ => log::debug!(
                "Sensor code '{}' on Landsat {}, using {}",
                sensor_code,
                version,
                satellite.sensor
            ),
        }
        Ok(satellite)
    }

    fn flew(version: u8, sensor: Sensor) -> bool {
        match sensor {
            Sensor::Mss => version <= 5,
            Sensor::Tm => version == 4 || version == 5,
            Sensor::Etm => version == 7,
            Sensor::OliTirs => version == 8,
        }
    }

    fn validate_version(version: u8) -> LandsatResult<()> {
        match version {
            0 => Err(LandsatError::InvalidSatellite(
                "Landsat versions start at 1".to_string(),
            )),
            6 => Err(LandsatError::InvalidSatellite(
                "There is no Landsat 6 data due to a rocket failure".to_string(),
            )),
            v if v > 8 => Err(LandsatError::InvalidSatellite(format!(
                "Landsat 8 is the highest supported version, got {}",
                v
            ))),
            _ => Ok(()),
        }
    }

    fn default_sensor(version: u8) -> Sensor {
        match version {
            8 => Sensor::OliTirs,
            7 => Sensor::Etm,
            4 | 5 => Sensor::Tm,
            _ => Sensor::Mss,
        }
    }

    /// Preferred satellite for a given acquisition year
    pub fn for_year(year: i32) -> Self {
        let version = if year >= 2013 {
            8
        } else if (1999..2003).contains(&year) {
            7
        } else if year >= 1984 {
            5
        } else if year >= 1982 {
            4
        } else if year >= 1978 {
            3
        } else if year >= 1975 {
            2
        } else {
            1
        };

        Self {
            version,
            sensor: Self::default_sensor(version),
        }
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn sensor(&self) -> Sensor {
        self.sensor
    }

    fn is_thematic_mapper(&self) -> bool {
        self.version <= 5 && self.sensor == Sensor::Tm
    }

    /// Band triplet for the requested composite
    pub fn bands(&self, mode: ColorMode) -> LandsatResult<BandTriplet> {
        match mode {
            ColorMode::Natural => self.natural_color_bands(),
            ColorMode::Urban => self.urban_false_color_bands(),
            ColorMode::Vegetation => Ok(self.vegetation_false_color_bands()),
        }
    }

    /// 4-3-2 natural color
    pub fn natural_color_bands(&self) -> LandsatResult<BandTriplet> {
        if self.version < 4 {
            return Err(LandsatError::UnsupportedBands(format!(
                "Natural color is not possible for Landsat {} as it had no blue band",
                self.version
            )));
        }

        Ok(if self.is_thematic_mapper() {
            ["B30", "B20", "B10"]
        } else if self.version <= 7 {
            ["B3", "B2", "B1"]
        } else {
            ["B4", "B3", "B2"]
        })
    }

    /// 7-6-4 false color for analyzing urban areas
    pub fn urban_false_color_bands(&self) -> LandsatResult<BandTriplet> {
        if self.version < 4 {
            return Err(LandsatError::UnsupportedBands(format!(
                "Urban false color is not possible for Landsat {} as it had no short-wave infrared bands",
                self.version
            )));
        }

        Ok(if self.is_thematic_mapper() {
            ["B70", "B50", "B30"]
        } else if self.version <= 7 {
            ["B7", "B5", "B3"]
        } else {
            ["B7", "B6", "B4"]
        })
    }

    /// 5-4-3 color infrared for analyzing vegetation
    pub fn vegetation_false_color_bands(&self) -> BandTriplet {
        if self.version < 4 {
            ["B6", "B5", "B4"]
        } else if self.is_thematic_mapper() {
            ["B40", "B30", "B20"]
        } else if self.version <= 5 {
            ["B4", "B2", "B1"]
        } else if self.version == 7 {
            ["B4", "B3", "B2"]
        } else {
            ["B5", "B4", "B3"]
        }
    }

    /// Collection directory in the public bucket (`L8`, `L7`, `LT4`, `LM2`, ...)
    pub fn google_id(&self) -> String {
        if self.version > 4 {
            format!("L{}", self.version)
        } else {
            format!("L{}{}", self.sensor.code(), self.version)
        }
    }

    /// Whether band files ship as 16-bit and need rescaling before warping
    pub fn needs_8bit_conversion(&self) -> bool {
        self.version > 7
    }
}

/// EarthExplorer dataset name covering the given year
pub fn dataset_name(year: i32) -> LandsatResult<&'static str> {
    if year >= 2013 {
        Ok("LANDSAT_8")
    } else if year >= 2003 {
        // Landsat 7 scan line corrector failed in 2003
        Ok("LANDSAT_COMBINED")
    } else if year >= 1999 {
        Ok("LANDSAT_ETM")
    } else if year >= 1984 {
        Ok("LANDSAT_COMBINED")
    } else if year >= 1972 {
        Ok("LANDSAT_MSS1")
    } else {
        Err(LandsatError::InvalidYear(format!(
            "Landsat 1 did not come online until 1972, got {}",
            year
        )))
    }
}
