//! Flexible polyline codec.
//!
//! An encoded polyline is a stream of unsigned integers, each packed five bits
//! per character over a 64-symbol URL-safe alphabet. Bit `0x20` of a symbol
//! marks that more bit groups follow; groups are little-endian.
//!
//! The first value is the header:
//!
//! | bits  | meaning                              |
//! |-------|--------------------------------------|
//! | 0-3   | coordinate precision (decimal digits)|
//! | 4-6   | third dimension type                 |
//! | 7-10  | third dimension precision            |
//!
//! Every following value is a zig-zag encoded delta against the previous
//! coordinate tuple, `(lat, lng)` or `(lat, lng, z)`.
//!
//! The public wire format additionally starts with a format version value.
//! [`strip_format_version`] removes it; everything else here is header-first.

use thiserror::Error;

use crate::point::GeoPoint;

const ENCODING_TABLE: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Inverse of [`ENCODING_TABLE`], indexed by `byte - b'-'`
const DECODING_TABLE: [i8; 78] = build_decoding_table();

const DECODING_OFFSET: u8 = b'-';

const FORMAT_VERSION: u64 = 1;
const MAX_PRECISION: u8 = 15;
const HEADER_BITS: u32 = 11;

const fn build_decoding_table() -> [i8; 78] {
    let mut table = [-1i8; 78];
    let mut i = 0;
    while i < ENCODING_TABLE.len() {
        table[(ENCODING_TABLE[i] - DECODING_OFFSET) as usize] = i as i8;
        i += 1;
    }
    table
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolylineError {
    #[error("empty polyline")]
    Empty,

    #[error("invalid character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },

    #[error("polyline ends in the middle of a value")]
    Truncated,

    #[error("encoded value does not fit in 64 bits")]
    Overflow,

    #[error("coordinate tuple is missing a component")]
    IncompleteCoordinate,

    #[error("invalid header value {0:#x}")]
    InvalidHeader(u64),

    #[error("precision {0} exceeds the maximum of 15")]
    InvalidPrecision(u8),

    #[error("third dimension type {0} is reserved")]
    ReservedThirdDimension(u8),

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u64),

    #[error("coordinate is not a finite number")]
    NonFinite,

    #[error("expected {expected} third dimension values, got {actual}")]
    ThirdDimensionMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, PolylineError>;

/// Meaning of the optional third coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThirdDimension {
    #[default]
    Absent,
    Level,
    Altitude,
    Elevation,
    Custom1,
    Custom2,
}

impl ThirdDimension {
    fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0 => Ok(Self::Absent),
            1 => Ok(Self::Level),
            2 => Ok(Self::Altitude),
            3 => Ok(Self::Elevation),
            6 => Ok(Self::Custom1),
            7 => Ok(Self::Custom2),
            other => Err(PolylineError::ReservedThirdDimension(other)),
        }
    }

    fn bits(self) -> u8 {
        match self {
            Self::Absent => 0,
            Self::Level => 1,
            Self::Altitude => 2,
            Self::Elevation => 3,
            Self::Custom1 => 6,
            Self::Custom2 => 7,
        }
    }

    pub fn is_present(self) -> bool {
        self != Self::Absent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Header {
    pub precision: u8,
    pub third_dimension: ThirdDimension,
    pub third_dimension_precision: u8,
}

impl Header {
    pub fn new(precision: u8) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }

    fn unpack(value: u64) -> Result<Self> {
        if value >> HEADER_BITS != 0 {
            return Err(PolylineError::InvalidHeader(value));
        }
        Ok(Self {
            precision: (value & 0x0f) as u8,
            third_dimension: ThirdDimension::from_bits(((value >> 4) & 0x07) as u8)?,
            third_dimension_precision: ((value >> 7) & 0x0f) as u8,
        })
    }

    fn pack(&self) -> Result<u64> {
        for precision in [self.precision, self.third_dimension_precision] {
            if precision > MAX_PRECISION {
                return Err(PolylineError::InvalidPrecision(precision));
            }
        }
        Ok(self.precision as u64
            | (self.third_dimension.bits() as u64) << 4
            | (self.third_dimension_precision as u64) << 7)
    }

    fn dimensions(&self) -> usize {
        if self.third_dimension.is_present() { 3 } else { 2 }
    }
}

/// A fully decoded polyline, header and third dimension included
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlexPolyline {
    pub header: Header,
    pub points: Vec<GeoPoint>,
    /// One value per point when the header declares a third dimension, else empty
    pub third_dimension: Vec<f64>,
}

impl FlexPolyline {
    pub fn decode(encoded: &str) -> Result<Self> {
        let mut values = UnsignedValues::new(encoded);
        let header = match values.next() {
            Some(value) => Header::unpack(value?)?,
            None => return Err(PolylineError::Empty),
        };

        let dims = header.dimensions();
        let scale = 10f64.powi(header.precision as i32);
        let z_scale = 10f64.powi(header.third_dimension_precision as i32);

        let mut points = Vec::new();
        let mut third_dimension = Vec::new();
        let mut last = [0i64; 3];

        loop {
            let Some(first) = values.next() else { break };
            last[0] = accumulate(last[0], first?)?;
            for slot in last.iter_mut().take(dims).skip(1) {
                let value = values.next().ok_or(PolylineError::IncompleteCoordinate)??;
                *slot = accumulate(*slot, value)?;
            }

            points.push(GeoPoint::new(last[0] as f64 / scale, last[1] as f64 / scale));
            if dims == 3 {
                third_dimension.push(last[2] as f64 / z_scale);
            }
        }

        Ok(Self {
            header,
            points,
            third_dimension,
        })
    }

    pub fn encode(&self) -> Result<String> {
        let header = self.header.pack()?;
        let dims = self.header.dimensions();

        if dims == 3 && self.third_dimension.len() != self.points.len() {
            return Err(PolylineError::ThirdDimensionMismatch {
                expected: self.points.len(),
                actual: self.third_dimension.len(),
            });
        }

        let scale = 10f64.powi(self.header.precision as i32);
        let z_scale = 10f64.powi(self.header.third_dimension_precision as i32);

        let mut out = String::with_capacity(2 + self.points.len() * dims * 4);
        encode_unsigned(header, &mut out);

        let mut last = [0i64; 3];
        for (i, point) in self.points.iter().enumerate() {
            let mut current = [scaled(point.lat, scale)?, scaled(point.lng, scale)?, 0];
            if dims == 3 {
                current[2] = scaled(self.third_dimension[i], z_scale)?;
            }
            for d in 0..dims {
                let delta = current[d]
                    .checked_sub(last[d])
                    .ok_or(PolylineError::Overflow)?;
                encode_unsigned(zigzag_encode(delta), &mut out);
                last[d] = current[d];
            }
        }

        Ok(out)
    }
}

/// Decode a header-first polyline into its 2D points
pub fn decode_polyline(encoded: &str) -> Result<Vec<GeoPoint>> {
    FlexPolyline::decode(encoded).map(|polyline| polyline.points)
}

/// Encode 2D points at the given decimal precision
pub fn encode_polyline(points: &[GeoPoint], precision: u8) -> Result<String> {
    FlexPolyline {
        header: Header::new(precision),
        points: points.to_vec(),
        third_dimension: Vec::new(),
    }
    .encode()
}

/// Strip the leading format version value of the public wire format
pub fn strip_format_version(encoded: &str) -> Result<&str> {
    let mut values = UnsignedValues::new(encoded);
    match values.next() {
        Some(Ok(FORMAT_VERSION)) => Ok(&encoded[values.position..]),
        Some(Ok(other)) => Err(PolylineError::UnsupportedVersion(other)),
        Some(Err(err)) => Err(err),
        None => Err(PolylineError::Empty),
    }
}

fn scaled(value: f64, scale: f64) -> Result<i64> {
    if !value.is_finite() {
        return Err(PolylineError::NonFinite);
    }
    Ok((value * scale).round() as i64)
}

/// Apply one zig-zag delta to a running coordinate
fn accumulate(running: i64, value: u64) -> Result<i64> {
    running
        .checked_add(zigzag_decode(value))
        .ok_or(PolylineError::Overflow)
}

fn zigzag_decode(value: u64) -> i64 {
    let magnitude = (value >> 1) as i64;
    if value & 1 == 1 { !magnitude } else { magnitude }
}

fn zigzag_encode(value: i64) -> u64 {
    if value < 0 {
        ((!value) as u64) << 1 | 1
    } else {
        (value as u64) << 1
    }
}

fn encode_unsigned(mut value: u64, out: &mut String) {
    while value > 0x1f {
        let chunk = (value & 0x1f) | 0x20;
        out.push(ENCODING_TABLE[chunk as usize] as char);
        value >>= 5;
    }
    out.push(ENCODING_TABLE[value as usize] as char);
}

fn decode_char(byte: u8) -> Option<u64> {
    let index = byte.checked_sub(DECODING_OFFSET)? as usize;
    match DECODING_TABLE.get(index) {
        Some(&v) if v >= 0 => Some(v as u64),
        _ => None,
    }
}

/// Iterator over the unsigned values of an encoded string
struct UnsignedValues<'a> {
    bytes: &'a [u8],
    position: usize,
    source: &'a str,
}

impl<'a> UnsignedValues<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            bytes: source.as_bytes(),
            position: 0,
            source,
        }
    }

    fn invalid_at(&self, position: usize) -> PolylineError {
        let character = self.source[position..].chars().next().unwrap_or('\u{fffd}');
        PolylineError::InvalidCharacter {
            character,
            position,
        }
    }
}

impl Iterator for UnsignedValues<'_> {
    type Item = Result<u64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.bytes.len() {
            return None;
        }

        let mut result = 0u64;
        let mut shift = 0u32;
        loop {
            let Some(&byte) = self.bytes.get(self.position) else {
                self.position = self.bytes.len();
                return Some(Err(PolylineError::Truncated));
            };
            let Some(chunk) = decode_char(byte) else {
                let err = self.invalid_at(self.position);
                self.position = self.bytes.len();
                return Some(Err(err));
            };
            self.position += 1;

            let bits = chunk & 0x1f;
            if shift >= 64 || (shift > 59 && bits >> (64 - shift) != 0) {
                self.position = self.bytes.len();
                return Some(Err(PolylineError::Overflow));
            }
            result |= bits << shift;

            if chunk & 0x20 == 0 {
                return Some(Ok(result));
            }
            shift += 5;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn frankfurt() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(50.10228, 8.69821),
            GeoPoint::new(50.10201, 8.69567),
            GeoPoint::new(50.10063, 8.69150),
            GeoPoint::new(50.09878, 8.68752),
        ]
    }

    #[test]
    fn test_decode_known_polyline() {
        let points = decode_polyline("Foz5xJ67i1B1B7PzIhaxL7Y").unwrap();
        let expected = frankfurt();
        assert_eq!(points.len(), expected.len());
        for (got, want) in points.iter().zip(&expected) {
            assert_abs_diff_eq!(got.lat, want.lat, epsilon = 1e-9);
            assert_abs_diff_eq!(got.lng, want.lng, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_encode_known_polyline() {
        assert_eq!(
            encode_polyline(&frankfurt(), 5).unwrap(),
            "Foz5xJ67i1B1B7PzIhaxL7Y"
        );
    }

    #[test]
    fn test_round_trip_2d() {
        let points = vec![
            GeoPoint::new(52.5199356, 13.3985054),
            GeoPoint::new(52.5164153, 13.3777091),
            GeoPoint::new(-33.8688197, 151.2092955),
            GeoPoint::new(0.0, -0.0000001),
        ];

        for precision in [5u8, 6, 7] {
            let encoded = encode_polyline(&points, precision).unwrap();
            let decoded = decode_polyline(&encoded).unwrap();
            let tolerance = 0.5 / 10f64.powi(precision as i32) + 1e-12;

            assert_eq!(decoded.len(), points.len());
            for (got, want) in decoded.iter().zip(&points) {
                assert_abs_diff_eq!(got.lat, want.lat, epsilon = tolerance);
                assert_abs_diff_eq!(got.lng, want.lng, epsilon = tolerance);
            }

            // Decoded values are exact at this precision, so re-encoding is stable
            assert_eq!(encode_polyline(&decoded, precision).unwrap(), encoded);
        }
    }

    #[test]
    fn test_decode_3d() {
        let polyline = FlexPolyline::decode("nB6mg07d0--8lFUhsFl1xBUl8atwxCU").unwrap();

        assert_eq!(polyline.header.precision, 7);
        assert_eq!(polyline.header.third_dimension, ThirdDimension::Altitude);
        assert_eq!(polyline.header.third_dimension_precision, 0);
        assert_eq!(polyline.points.len(), 3);
        assert_eq!(polyline.third_dimension, vec![10.0, 20.0, 30.0]);
        assert_abs_diff_eq!(polyline.points[1].lat, 50.1020076, epsilon = 1e-9);
        assert_abs_diff_eq!(polyline.points[2].lng, 8.6914960, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip_3d() {
        let original = FlexPolyline {
            header: Header {
                precision: 6,
                third_dimension: ThirdDimension::Elevation,
                third_dimension_precision: 2,
            },
            points: vec![
                GeoPoint::new(47.3769, 8.5417),
                GeoPoint::new(46.0207, 7.7491),
                GeoPoint::new(45.8326, 6.8652),
            ],
            third_dimension: vec![408.0, 1608.25, -12.5],
        };

        let decoded = FlexPolyline::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded.header, original.header);
        for (got, want) in decoded.third_dimension.iter().zip(&original.third_dimension) {
            assert_abs_diff_eq!(got, want, epsilon = 1e-9);
        }
        for (got, want) in decoded.points.iter().zip(&original.points) {
            assert_abs_diff_eq!(got.lat, want.lat, epsilon = 1e-9);
            assert_abs_diff_eq!(got.lng, want.lng, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_zigzag() {
        for v in [0i64, 1, -1, 2, -2, 12345, -12345, i64::MAX, i64::MIN] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
    }

    #[test]
    fn test_header_only_is_empty_route() {
        let polyline = FlexPolyline::decode("F").unwrap();
        assert_eq!(polyline.header.precision, 5);
        assert!(polyline.points.is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert_eq!(decode_polyline(""), Err(PolylineError::Empty));
        assert_eq!(
            decode_polyline("Foz5x!"),
            Err(PolylineError::InvalidCharacter {
                character: '!',
                position: 5
            })
        );
        // 'z' carries the continuation bit and nothing follows
        assert_eq!(decode_polyline("Foz"), Err(PolylineError::Truncated));
        // One complete latitude without its longitude
        assert_eq!(
            decode_polyline("Foz5xJ"),
            Err(PolylineError::IncompleteCoordinate)
        );
        // Third dimension type 4 is reserved
        assert_eq!(
            decode_polyline("lC"),
            Err(PolylineError::ReservedThirdDimension(4))
        );
        assert_eq!(
            decode_polyline(&"_".repeat(20)),
            Err(PolylineError::Overflow)
        );
        // Two latitude deltas of i64::MAX overflow the running sum
        assert_eq!(
            decode_polyline("F-___________PA-___________PA"),
            Err(PolylineError::Overflow)
        );
        let extremes = FlexPolyline {
            header: Header {
                precision: 5,
                third_dimension: ThirdDimension::Elevation,
                third_dimension_precision: 0,
            },
            points: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.0)],
            third_dimension: vec![1e300, -1e300],
        };
        assert_eq!(extremes.encode(), Err(PolylineError::Overflow));
        assert_eq!(
            encode_polyline(&frankfurt(), 16),
            Err(PolylineError::InvalidPrecision(16))
        );
        assert_eq!(
            encode_polyline(&[GeoPoint::new(f64::NAN, 0.0)], 5),
            Err(PolylineError::NonFinite)
        );
    }

    #[test]
    fn test_strip_format_version() {
        assert_eq!(
            strip_format_version("BFoz5xJ67i1B1B7PzIhaxL7Y").unwrap(),
            "Foz5xJ67i1B1B7PzIhaxL7Y"
        );
        assert_eq!(
            strip_format_version("CFoz5xJ"),
            Err(PolylineError::UnsupportedVersion(2))
        );
        assert_eq!(strip_format_version(""), Err(PolylineError::Empty));
    }
}
