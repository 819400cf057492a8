//! Compact Position Reporting
//!
//! Latitude and longitude information is reported using two alternating
//! messages (called even and odd). The original position can be recovered using
//! two methods:
//!
//! - global: needs an even and an odd message, but fails if the two positions
//!   are in different latitude zones.
//! - local: needs one message and a reference position within 180 NM of the
//!   actual position.
//!
//! Both messages for a global decode are expected to be received within about
//! 10 seconds of each other. This can't be checked from the messages
//! themselves, so it's up to the caller (see [`Decoder`]).
//!
//! <https://mode-s.org/1090mhz/content/ads-b/3-airborne-position.html>

use std::ops::Not;

/// Number of bits per coordinate in airborne position messages.
pub const AIRBORNE_BITS: u8 = 17;

const N_Z: f64 = 15.0;

/// Latitudes at which the number of longitude zones drops by one, starting at
/// 59 zones around the equator.
///
/// Computed as `acos(sqrt((1 - cos(pi / 30)) / (1 - cos(2 pi / nl))))` for
/// `nl = 59..=2`.
#[rustfmt::skip]
const NL_TABLE: [f64; 58] = [
    10.4704713, 14.82817437, 18.18626357, 21.02939493, 23.54504487, 25.82924707,
    27.9389871, 29.91135686, 31.77209708, 33.53993436, 35.22899598, 36.85025108,
    38.41241892, 39.92256684, 41.38651832, 42.80914012, 44.19454951, 45.54626723,
    46.86733252, 48.16039128, 49.42776439, 50.67150166, 51.89342469, 53.09516153,
    54.27817472, 55.44378444, 56.59318756, 57.72747354, 58.84763776, 59.95459277,
    61.04917774, 62.13216659, 63.20427479, 64.26616523, 65.3184531, 66.36171008,
    67.39646774, 68.42322022, 69.44242631, 70.45451075, 71.45986473, 72.45884545,
    73.45177442, 74.43893416, 75.42056257, 76.39684391, 77.36789461, 78.33374083,
    79.29428225, 80.24923213, 81.19801349, 82.13956981, 83.07199445, 83.99173563,
    84.89166191, 85.75541621, 86.53536998, 87.0,
];

/// Number of longitude zones at the given latitude.
pub fn nl(latitude: f64) -> u8 {
    let latitude = latitude.abs();
    NL_TABLE
        .iter()
        .position(|boundary| latitude < *boundary)
        .map_or(1, |k| 59 - k as u8)
}

// mod(x, y) = x.rem_euclid(y)

#[inline(always)]
fn fix_lat(lat: f64) -> f64 {
    if lat >= 270.0 { lat - 360.0 } else { lat }
}

#[inline(always)]
fn fix_lon(lon: f64) -> f64 {
    if lon >= 180.0 { lon - 360.0 } else { lon }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Format {
    Even,
    Odd,
}

impl Format {
    /// Returns the CPR format from the value of the F bit.
    pub fn from_bit(bit: bool) -> Self {
        if bit { Format::Odd } else { Format::Even }
    }

    /// The value of the F bit.
    pub fn as_bit(&self) -> bool {
        matches!(self, Format::Odd)
    }

    pub fn is_even(&self) -> bool {
        matches!(self, Format::Even)
    }

    #[inline(always)]
    pub fn is_odd(&self) -> bool {
        !self.is_even()
    }

    /// If this is even, returns odd. If this is odd, returns even.
    pub fn other(&self) -> Self {
        match self {
            Self::Even => Self::Odd,
            Self::Odd => Self::Even,
        }
    }

    #[inline(always)]
    fn i(&self) -> f64 {
        match self {
            Format::Even => 0.0,
            Format::Odd => 1.0,
        }
    }
}

impl Not for Format {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.other()
    }
}

/// 17 bit encoded latitude/longitude
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CoordinateCode(u32);

impl CoordinateCode {
    pub const fn from_u32_unchecked(word: u32) -> Self {
        Self(word)
    }

    pub const fn from_u32(word: u32) -> Option<Self> {
        if word & 0xfffe0000 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PositionCode {
    pub latitude: CoordinateCode,
    pub longitude: CoordinateCode,
}

/// A compact position report
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cpr {
    pub format: Format,

    /// T bit: the position is valid at a UTC second boundary.
    pub time_synchronized: bool,

    /// Number of bits per coordinate
    pub bits: u8,

    pub position: PositionCode,
}

impl Cpr {
    /// Creates an airborne (17 bit) position report.
    pub fn airborne(format: Format, time_synchronized: bool, position: PositionCode) -> Self {
        Self {
            format,
            time_synchronized,
            bits: AIRBORNE_BITS,
            position,
        }
    }

    /// Encodes an airborne position.
    pub fn encode(position: Position, format: Format) -> Self {
        let scale = 2.0f64.powi(AIRBORNE_BITS.into());
        let i = format.i();

        let d_lat = 360.0 / (4.0 * N_Z - i);
        let yz = (scale * position.latitude.rem_euclid(d_lat) / d_lat + 0.5).floor();
        let r_lat = d_lat * (yz / scale + (position.latitude / d_lat).floor());

        let d_lon = 360.0 / (f64::from(nl(r_lat)) - i).max(1.0);
        let xz = (scale * position.longitude.rem_euclid(d_lon) / d_lon + 0.5).floor();

        Self::airborne(
            format,
            false,
            PositionCode {
                latitude: CoordinateCode(yz.rem_euclid(scale) as u32),
                longitude: CoordinateCode(xz.rem_euclid(scale) as u32),
            },
        )
    }

    /// Latitude and longitude as fractions of a zone.
    #[inline(always)]
    fn scaled(&self) -> [f64; 2] {
        let scale = 2.0f64.powi(self.bits.into());
        [
            f64::from(self.position.latitude.0) / scale,
            f64::from(self.position.longitude.0) / scale,
        ]
    }

    /// Decodes a single CPR using a reference position.
    ///
    /// The reference position must be close to the actual position (see module
    /// documentation), otherwise the result will be off by a zone.
    pub fn decode_local(&self, reference: Position) -> Result<Position, DecodeError> {
        if !reference.is_valid() {
            return Err(DecodeError::ReferenceOutOfRange { reference });
        }

        let i = self.format.i();
        let lat_s = reference.latitude;
        let lon_s = reference.longitude;
        let [yz, xz] = self.scaled();

        let d_lat = 360.0 / (4.0 * N_Z - i);

        // latitude zone index
        let j = (lat_s / d_lat).floor() + (lat_s.rem_euclid(d_lat) / d_lat - yz + 0.5).floor();
        let r_lat = d_lat * (j + yz);

        let n = f64::from(nl(r_lat)) - i;
        let d_lon = if n > 0.0 { 360.0 / n } else { 360.0 };

        // longitude zone index
        let m = (lon_s / d_lon).floor() + (lon_s.rem_euclid(d_lon) / d_lon - xz + 0.5).floor();
        let r_lon = fix_lon(d_lon * (m + xz));

        Ok(Position {
            latitude: r_lat,
            longitude: r_lon,
        })
    }
}

/// Decodes an even and an odd CPR.
///
/// `later` must be the more recently received report. The returned position
/// is the position at the time of `later`.
///
/// This fails if the two positions are in different latitude zones. In that
/// case you can still use [`Cpr::decode_local`].
pub fn decode_global(earlier: &Cpr, later: &Cpr) -> Result<Position, DecodeError> {
    if earlier.bits != later.bits {
        return Err(DecodeError::EncodingMismatch {
            earlier: earlier.bits,
            later: later.bits,
        });
    }
    if earlier.format == later.format {
        return Err(DecodeError::SameFormat {
            format: later.format,
        });
    }

    let (even, odd) = match later.format {
        Format::Even => (later, earlier),
        Format::Odd => (earlier, later),
    };
    let [yz_even, xz_even] = even.scaled();
    let [yz_odd, xz_odd] = odd.scaled();

    let d_lat_even = 360.0 / (4.0 * N_Z);
    let d_lat_odd = 360.0 / (4.0 * N_Z - 1.0);

    // latitude zone index
    let j = (59.0 * yz_even - 60.0 * yz_odd + 0.5).floor();

    let r_lat_even = fix_lat(d_lat_even * (j.rem_euclid(60.0) + yz_even));
    let r_lat_odd = fix_lat(d_lat_odd * (j.rem_euclid(59.0) + yz_odd));

    for latitude in [r_lat_even, r_lat_odd] {
        if latitude.abs() > 90.0 {
            return Err(DecodeError::LatitudeOutOfRange { latitude });
        }
    }

    let nl_even = nl(r_lat_even);
    let nl_odd = nl(r_lat_odd);
    if nl_even != nl_odd {
        return Err(DecodeError::CrossesLatitudeBoundary { nl_even, nl_odd });
    }
    let nl_lat = f64::from(nl_even);

    let (r_lat, xz, n) = match later.format {
        Format::Even => (r_lat_even, xz_even, nl_lat.max(1.0)),
        Format::Odd => (r_lat_odd, xz_odd, (nl_lat - 1.0).max(1.0)),
    };

    // longitude index
    let m = (xz_even * (nl_lat - 1.0) - xz_odd * nl_lat + 0.5).floor();

    let d_lon = 360.0 / n;
    let r_lon = fix_lon(d_lon * (m.rem_euclid(n) + xz));

    Ok(Position {
        latitude: r_lat,
        longitude: r_lon,
    })
}

/// Geodetic position in degrees
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Returns `true` if the latitude is within ±90° and the longitude within
    /// ±180°.
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, thiserror::Error)]
pub enum DecodeError {
    #[error("reference position out of range: {reference:?}")]
    ReferenceOutOfRange { reference: Position },

    #[error("reports use different encodings: {earlier} and {later} bits")]
    EncodingMismatch { earlier: u8, later: u8 },

    #[error("both reports have the same format: {format:?}")]
    SameFormat { format: Format },

    #[error("positions cross a latitude zone boundary (NL {nl_even} and {nl_odd})")]
    CrossesLatitudeBoundary { nl_even: u8, nl_odd: u8 },

    #[error("decoded latitude out of range: {latitude}")]
    LatitudeOutOfRange { latitude: f64 },
}

#[derive(Clone, Copy, Debug)]
struct DecoderBin<T> {
    cpr: Cpr,
    time: T,
}

/// Pairs up even and odd reports of one aircraft.
///
/// This is generic over the type of time you use. All `T` needs to support is
/// comparisons (i.e. [`Ord`]).
#[derive(Clone, Copy, Debug)]
pub struct Decoder<T> {
    even: Option<DecoderBin<T>>,
    odd: Option<DecoderBin<T>>,
}

impl<T> Default for Decoder<T> {
    fn default() -> Self {
        Self {
            even: None,
            odd: None,
        }
    }
}

impl<T: Ord> Decoder<T> {
    /// Pushes a report into the decoder.
    ///
    /// The report is first decoded globally with the latest report of the
    /// other format. If there is none, or the global decode fails, it is
    /// decoded with the reference position, if available.
    ///
    /// Reports older than the buffered one of the same format are ignored.
    /// Discarding stale reports (e.g. older than 10 seconds) is up to the
    /// caller.
    pub fn push(&mut self, cpr: Cpr, time: T, reference: Option<Position>) -> Option<Position> {
        let (this_bin, other_bin) = match cpr.format {
            Format::Even => (&mut self.even, &self.odd),
            Format::Odd => (&mut self.odd, &self.even),
        };

        if this_bin.as_ref().is_some_and(|bin| bin.time >= time) {
            return None;
        }

        let global = other_bin.as_ref().and_then(|other| {
            let result = if time > other.time {
                decode_global(&other.cpr, &cpr)
            }
            else {
                decode_global(&cpr, &other.cpr)
            };
            result
                .inspect_err(|error| tracing::debug!(%error, "global cpr decode failed"))
                .ok()
        });

        let position = global.or_else(|| {
            reference.and_then(|reference| cpr.decode_local(reference).ok())
        });

        *this_bin = Some(DecoderBin { cpr, time });

        position
    }

    /// Drops buffered reports received before `time`.
    pub fn expire(&mut self, time: &T) {
        for bin in [&mut self.even, &mut self.odd] {
            if bin.as_ref().is_some_and(|report| report.time < *time) {
                *bin = None;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.even.is_none() && self.odd.is_none()
    }

    pub fn clear(&mut self) {
        self.even = None;
        self.odd = None;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::{
        CoordinateCode,
        Cpr,
        DecodeError,
        Decoder,
        Format,
        Position,
        PositionCode,
        decode_global,
        nl,
    };

    fn cpr(format: Format, latitude: u32, longitude: u32) -> Cpr {
        Cpr::airborne(
            format,
            false,
            PositionCode {
                latitude: CoordinateCode::from_u32(latitude).unwrap(),
                longitude: CoordinateCode::from_u32(longitude).unwrap(),
            },
        )
    }

    fn assert_position_eq(actual: Position, expected: Position) {
        assert_abs_diff_eq!(actual.latitude, expected.latitude, epsilon = 0.001);
        assert_abs_diff_eq!(actual.longitude, expected.longitude, epsilon = 0.001);
    }

    const EXAMPLE_POSITION: Position = Position {
        latitude: 52.2572,
        longitude: 3.91937,
    };

    fn example_even() -> Cpr {
        cpr(Format::Even, 0b10110101101001000, 0b01100100010101100)
    }

    fn example_odd() -> Cpr {
        cpr(Format::Odd, 0b10010000110101110, 0b01100010000010010)
    }

    #[test]
    fn it_looks_up_longitude_zones() {
        assert_eq!(nl(0.0), 59);
        assert_eq!(nl(10.47), 59);
        assert_eq!(nl(10.4704713), 58);
        assert_eq!(nl(-45.0), 42);
        assert_eq!(nl(86.9), 2);
        assert_eq!(nl(87.0), 1);
        assert_eq!(nl(-90.0), 1);
    }

    #[test]
    fn it_decodes_the_global_example() {
        let position = decode_global(&example_even(), &example_odd()).unwrap();
        assert_position_eq(position, EXAMPLE_POSITION);
    }

    #[test]
    fn it_decodes_the_local_example() {
        let position = example_even()
            .decode_local(Position {
                latitude: 52.258,
                longitude: 3.918,
            })
            .unwrap();
        assert_position_eq(position, EXAMPLE_POSITION);
    }

    #[test]
    fn it_decodes_locally_with_a_reference() {
        // 8da9450d60bde138e8638c939134
        let position = cpr(Format::Even, 40052, 25484)
            .decode_local(Position {
                latitude: 43.14,
                longitude: -89.33,
            })
            .unwrap();
        assert_position_eq(
            position,
            Position {
                latitude: 43.83300781,
                longitude: -90.46484375,
            },
        );
    }

    #[test]
    fn it_decodes_globally_with_the_later_report() {
        let position = decode_global(
            &cpr(Format::Even, 5231, 1926),
            &cpr(Format::Odd, 120924, 34670),
        )
        .unwrap();
        assert_position_eq(
            position,
            Position {
                latitude: 42.23945229,
                longitude: -89.87851165,
            },
        );

        let position = decode_global(
            &cpr(Format::Odd, 1319, 25254),
            &cpr(Format::Even, 16861, 123448),
        )
        .unwrap();
        assert_position_eq(
            position,
            Position {
                latitude: 42.77183532,
                longitude: -90.47590775,
            },
        );
    }

    #[test]
    fn it_rejects_invalid_pairs() {
        assert_eq!(
            decode_global(&example_even(), &example_even()),
            Err(DecodeError::SameFormat {
                format: Format::Even
            })
        );

        let mut odd = example_odd();
        odd.bits = 19;
        assert_eq!(
            decode_global(&example_even(), &odd),
            Err(DecodeError::EncodingMismatch {
                earlier: 17,
                later: 19
            })
        );
    }

    #[test]
    fn it_rejects_latitudes_beyond_the_poles() {
        let even = cpr(Format::Even, 65536, 0);
        let odd = cpr(Format::Odd, 29491, 0);

        for (earlier, later) in [(&even, &odd), (&odd, &even)] {
            assert!(matches!(
                decode_global(earlier, later),
                Err(DecodeError::LatitudeOutOfRange { latitude }) if latitude > 90.0
            ));
        }
    }

    #[test]
    fn it_rejects_invalid_references() {
        for (latitude, longitude) in [(90.5, 0.0), (-91.0, 0.0), (0.0, 180.5), (0.0, -190.0)] {
            assert!(matches!(
                example_even().decode_local(Position {
                    latitude,
                    longitude
                }),
                Err(DecodeError::ReferenceOutOfRange { .. })
            ));
        }
        assert!(
            example_even()
                .decode_local(Position {
                    latitude: f64::NAN,
                    longitude: 0.0
                })
                .is_err()
        );
    }

    const P1: Position = Position {
        latitude: 48.729381,
        longitude: 2.916458,
    };
    const P2: Position = Position {
        latitude: 48.715478,
        longitude: 2.943659,
    };

    #[test]
    fn global_round_trip() {
        let even = Cpr::encode(P1, Format::Even);
        let odd = Cpr::encode(P2, Format::Odd);

        assert_position_eq(decode_global(&even, &odd).unwrap(), P2);
        assert_position_eq(decode_global(&odd, &even).unwrap(), P1);
    }

    #[test]
    fn global_decode_is_symmetric_for_the_same_position() {
        let even = Cpr::encode(P1, Format::Even);
        let odd = Cpr::encode(P1, Format::Odd);

        assert_position_eq(decode_global(&even, &odd).unwrap(), P1);
        assert_position_eq(decode_global(&odd, &even).unwrap(), P1);
    }

    #[test]
    fn local_round_trip() {
        for (latitude, longitude) in [
            (-33.9, 151.2),
            (64.1, -21.9),
            (-0.001, -179.999),
            (10.0, 179.99),
            (80.5, -100.0),
        ] {
            let position = Position {
                latitude,
                longitude,
            };
            let reference = Position {
                latitude: latitude + 0.3,
                longitude: longitude - 0.3 * longitude.signum(),
            };
            for format in [Format::Even, Format::Odd] {
                let decoded = Cpr::encode(position, format)
                    .decode_local(reference)
                    .unwrap();
                assert_abs_diff_eq!(decoded.latitude, latitude, epsilon = 0.0001);
                assert_abs_diff_eq!(decoded.longitude, longitude, epsilon = 0.0001);
            }
        }
    }

    #[test]
    fn decoder_pairs_reports() {
        let mut decoder = Decoder::default();

        assert_eq!(decoder.push(example_even(), 1, None), None);
        assert_position_eq(
            decoder.push(example_odd(), 2, None).unwrap(),
            EXAMPLE_POSITION,
        );

        // stale report
        assert_eq!(decoder.push(example_odd(), 2, None), None);
    }

    #[test]
    fn decoder_expires_old_reports() {
        let mut decoder = Decoder::default();
        assert!(decoder.is_empty());

        assert_eq!(decoder.push(example_even(), 1, None), None);
        decoder.expire(&1);
        assert!(!decoder.is_empty());

        decoder.expire(&2);
        assert!(decoder.is_empty());
        assert_eq!(decoder.push(example_odd(), 3, None), None);
    }

    #[test]
    fn decoder_falls_back_to_the_reference() {
        let mut decoder = Decoder::default();
        let reference = Position {
            latitude: 52.258,
            longitude: 3.918,
        };
        assert_position_eq(
            decoder.push(example_even(), 1, Some(reference)).unwrap(),
            EXAMPLE_POSITION,
        );
    }
}
