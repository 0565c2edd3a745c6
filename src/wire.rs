//! Fixed-size binary encodings for inter-process transport.
//!
//! Each coordinate is one big-endian IEEE-754 double; records are the plain
//! field sequence with no framing. Like the textual parser's counterpart on
//! the receiving side of a trusted channel, decoding performs no range
//! checks: the bytes are expected to come from [`to_be_bytes`]
//! (`Point::to_be_bytes`) of a peer. Clusters have no binary form.

use crate::{Bbox, Circle, Point};

impl Point {
    /// Encodes the point as latitude then longitude, 16 bytes.
    pub fn to_be_bytes(&self) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[..8].copy_from_slice(&self.lat().to_be_bytes());
        buf[8..].copy_from_slice(&self.lon().to_be_bytes());
        buf
    }

    /// Decodes a point previously encoded with
    /// [`to_be_bytes`](Point::to_be_bytes). The input is trusted.
    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Point::raw(
            f64::from_be_bytes(bytes[..8].try_into().expect("slice length is eight")),
            f64::from_be_bytes(bytes[8..].try_into().expect("slice length is eight")),
        )
    }
}

impl Bbox {
    /// Encodes the box as `lat_min`, `lat_max`, `lon_min`, `lon_max`,
    /// 32 bytes.
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        buf[..8].copy_from_slice(&self.lat_min().to_be_bytes());
        buf[8..16].copy_from_slice(&self.lat_max().to_be_bytes());
        buf[16..24].copy_from_slice(&self.lon_min().to_be_bytes());
        buf[24..].copy_from_slice(&self.lon_max().to_be_bytes());
        buf
    }

    /// Decodes a box previously encoded with
    /// [`to_be_bytes`](Bbox::to_be_bytes). The input is trusted.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        let field = |range: std::ops::Range<usize>| {
            f64::from_be_bytes(bytes[range].try_into().expect("slice length is eight"))
        };
        Bbox::raw(field(0..8), field(8..16), field(16..24), field(24..32))
    }
}

impl Circle {
    /// Encodes the circle as latitude, longitude, radius, 24 bytes.
    pub fn to_be_bytes(&self) -> [u8; 24] {
        let mut buf = [0u8; 24];
        buf[..8].copy_from_slice(&self.center().lat().to_be_bytes());
        buf[8..16].copy_from_slice(&self.center().lon().to_be_bytes());
        buf[16..].copy_from_slice(&self.radius().to_be_bytes());
        buf
    }

    /// Decodes a circle previously encoded with
    /// [`to_be_bytes`](Circle::to_be_bytes). The input is trusted.
    pub fn from_be_bytes(bytes: [u8; 24]) -> Self {
        let field = |range: std::ops::Range<usize>| {
            f64::from_be_bytes(bytes[range].try_into().expect("slice length is eight"))
        };
        Circle::raw(Point::raw(field(0..8), field(8..16)), field(16..24))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn point_wire_round_trip() {
        let p = Point::new(53.123456789012, -170.5).unwrap();
        assert_eq!(Point::from_be_bytes(p.to_be_bytes()), p);
    }

    #[test]
    fn point_wire_is_big_endian() {
        let p = Point::new(1.0, -1.0).unwrap();
        let bytes = p.to_be_bytes();
        assert_eq!(bytes[0], 0x3f);
        assert_eq!(bytes[1], 0xf0);
        assert_eq!(bytes[8], 0xbf);
    }

    #[test]
    fn bbox_wire_round_trip() {
        let b = Bbox::new(-5.0, 5.0, 170.0, -170.0).unwrap();
        assert_eq!(Bbox::from_be_bytes(b.to_be_bytes()), b);
        let empty = Bbox::empty();
        assert_eq!(Bbox::from_be_bytes(empty.to_be_bytes()), empty);
    }

    #[test]
    fn circle_wire_round_trip() {
        for radius in [0.0, 12_500.0, f64::INFINITY, f64::NEG_INFINITY] {
            let c = Circle::new(10.0, 20.0, radius).unwrap();
            assert_eq!(Circle::from_be_bytes(c.to_be_bytes()), c);
        }
    }
}
