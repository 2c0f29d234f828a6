//! Conversion of projected source coordinates to geographic degrees.
//!
//! Some registries publish UTM eastings and northings instead of latitude
//! and longitude. The inverse transverse Mercator series (Snyder, *Map
//! Projections: A Working Manual*, pp. 63-64) brings them back to degrees.
//! Datum shifts are ignored: NAD83 and WGS84 agree to within a metre, which
//! is below the precision of the registries.

use std::fmt;
use std::str::FromStr;

use geo::Coord;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Reference ellipsoid of a projected system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Datum {
    /// WGS 84.
    Wgs84,
    /// North American Datum 1983 (GRS 80 ellipsoid).
    Nad83,
    /// North American Datum 1927 (Clarke 1866 ellipsoid).
    Nad27,
}

impl Datum {
    const fn semi_major_axis(self) -> f64 {
        match self {
            Self::Wgs84 | Self::Nad83 => 6_378_137.0,
            Self::Nad27 => 6_378_206.4,
        }
    }

    const fn flattening(self) -> f64 {
        match self {
            Self::Wgs84 => 1.0 / 298.257_223_563,
            Self::Nad83 => 1.0 / 298.257_222_101,
            Self::Nad27 => 1.0 / 294.978_698_2,
        }
    }
}

/// Errors raised while parsing a coordinate system code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CrsError {
    /// The code is not of the form `EPSG:<number>`.
    #[error("malformed coordinate system code {code:?}")]
    Malformed {
        /// Code as written.
        code: String,
    },
    /// The EPSG code is well formed but not supported.
    #[error("unsupported coordinate system EPSG:{epsg}")]
    Unsupported {
        /// Numeric EPSG code.
        epsg: u32,
    },
}

/// Coordinate system of a source's position columns.
///
/// # Examples
/// ```
/// use orphan_wells_core::CoordinateSystem;
///
/// # fn main() -> Result<(), orphan_wells_core::CrsError> {
/// let utm: CoordinateSystem = "EPSG:32617".parse()?;
/// let coord = utm.to_geographic(500_000.0, 0.0);
/// assert!((coord.x + 81.0).abs() < 1e-9);
/// assert!(coord.y.abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum CoordinateSystem {
    /// Latitude and longitude in degrees (`EPSG:4326`, `EPSG:4269`,
    /// `EPSG:4267`).
    #[default]
    Geographic,
    /// Universal Transverse Mercator.
    Utm {
        /// Zone number, 1 to 60.
        zone: u8,
        /// Southern hemisphere false northing applies.
        south: bool,
        /// Reference ellipsoid.
        datum: Datum,
    },
}

impl CoordinateSystem {
    /// Convert a `(x, y)` pair in this system to longitude and latitude.
    ///
    /// Geographic input is returned unchanged with `x` as longitude.
    #[must_use]
    pub fn to_geographic(self, x: f64, y: f64) -> Coord<f64> {
        match self {
            Self::Geographic => Coord { x, y },
            Self::Utm { zone, south, datum } => utm_inverse(zone, south, datum, x, y),
        }
    }

    fn epsg(self) -> u32 {
        match self {
            Self::Geographic => 4326,
            Self::Utm { zone, south, datum } => {
                let base = match (datum, south) {
                    (Datum::Wgs84, false) => 32_600,
                    (Datum::Wgs84, true) => 32_700,
                    (Datum::Nad83, _) => 26_900,
                    (Datum::Nad27, _) => 26_700,
                };
                base + u32::from(zone)
            }
        }
    }
}

impl FromStr for CoordinateSystem {
    type Err = CrsError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let malformed = || CrsError::Malformed {
            code: code.to_owned(),
        };
        let trimmed = code.trim();
        let (authority, number) = trimmed.split_once(':').ok_or_else(malformed)?;
        if !authority.eq_ignore_ascii_case("epsg") {
            return Err(malformed());
        }
        let epsg: u32 = number.trim().parse().map_err(|_| malformed())?;
        let utm = |datum, south, base: u32, zones: std::ops::RangeInclusive<u32>| {
            let zone = epsg - base;
            if zones.contains(&zone) {
                u8::try_from(zone)
                    .map(|zone| Self::Utm { zone, south, datum })
                    .map_err(|_| CrsError::Unsupported { epsg })
            } else {
                Err(CrsError::Unsupported { epsg })
            }
        };
        match epsg {
            4326 | 4269 | 4267 => Ok(Self::Geographic),
            32_601..=32_660 => utm(Datum::Wgs84, false, 32_600, 1..=60),
            32_701..=32_760 => utm(Datum::Wgs84, true, 32_700, 1..=60),
            26_901..=26_923 => utm(Datum::Nad83, false, 26_900, 1..=23),
            26_703..=26_722 => utm(Datum::Nad27, false, 26_700, 3..=22),
            _ => Err(CrsError::Unsupported { epsg }),
        }
    }
}

impl TryFrom<String> for CoordinateSystem {
    type Error = CrsError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<CoordinateSystem> for String {
    fn from(system: CoordinateSystem) -> Self {
        system.to_string()
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

fn utm_inverse(zone: u8, south: bool, datum: Datum, easting: f64, northing: f64) -> Coord<f64> {
    let a = datum.semi_major_axis();
    let f = datum.flattening();
    let e2 = f * (2.0 - f);
    let ep2 = e2 / (1.0 - e2);
    let e4 = e2 * e2;
    let e6 = e4 * e2;

    let x = easting - FALSE_EASTING;
    let y = if south {
        northing - FALSE_NORTHING_SOUTH
    } else {
        northing
    };
    let central_meridian = (f64::from(zone) * 6.0 - 183.0).to_radians();

    let m = y / SCALE_FACTOR;
    let mu = m / (a * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));
    let root = (1.0 - e2).sqrt();
    let e1 = (1.0 - root) / (1.0 + root);
    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1.powi(2) / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

    let (sin_phi, cos_phi) = phi1.sin_cos();
    let tan_phi = sin_phi / cos_phi;
    let c1 = ep2 * cos_phi * cos_phi;
    let t1 = tan_phi * tan_phi;
    let denom = 1.0 - e2 * sin_phi * sin_phi;
    let n1 = a / denom.sqrt();
    let r1 = a * (1.0 - e2) / denom.powf(1.5);
    let d = x / (n1 * SCALE_FACTOR);

    let latitude = phi1
        - (n1 * tan_phi / r1)
            * (d.powi(2) / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d.powi(6)
                    / 720.0);
    let longitude = central_meridian
        + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                * d.powi(5)
                / 120.0)
            / cos_phi;

    Coord {
        x: longitude.to_degrees(),
        y: latitude.to_degrees(),
    }
}

/// Alternative system used when the primary conversion lands in a
/// longitude band.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ZoneFallback {
    /// System used for points inside the band.
    pub system: CoordinateSystem,
    /// Inclusive western edge of the band, in degrees.
    pub min_longitude: f64,
    /// Exclusive eastern edge of the band, in degrees.
    pub max_longitude: f64,
}

/// How a source's position columns become WGS84 coordinates.
///
/// # Examples
/// ```
/// use orphan_wells_core::{CoordinateSystem, Reprojection, ZoneFallback};
///
/// # fn main() -> Result<(), orphan_wells_core::CrsError> {
/// let indiana = Reprojection {
///     primary: "EPSG:32616".parse()?,
///     fallback: Some(ZoneFallback {
///         system: "EPSG:32617".parse()?,
///         min_longitude: -84.0,
///         max_longitude: -78.0,
///     }),
/// };
/// // Zone 16 puts this point near 83.5 degrees west, inside the band.
/// let coord = indiana.apply(800_000.0, 4_400_000.0);
/// assert!(coord.x > -78.0 && coord.x < -77.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reprojection {
    /// System the source publishes.
    pub primary: CoordinateSystem,
    /// Optional zone correction.
    pub fallback: Option<ZoneFallback>,
}

impl Reprojection {
    /// Report whether conversion is the identity.
    #[must_use]
    pub fn is_geographic(&self) -> bool {
        self.primary == CoordinateSystem::Geographic && self.fallback.is_none()
    }

    /// Convert `(x, y)` to longitude and latitude.
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> Coord<f64> {
        let coord = self.primary.to_geographic(x, y);
        match self.fallback {
            Some(fallback)
                if coord.x >= fallback.min_longitude && coord.x < fallback.max_longitude =>
            {
                fallback.system.to_geographic(x, y)
            }
            _ => coord,
        }
    }
}
