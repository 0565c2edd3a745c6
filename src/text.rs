//! Canonical textual forms.
//!
//! Coordinates print as `N`/`S`/`E`/`W` tags followed by zero-padded
//! degrees with 12 fractional digits, which round-trips every stored value
//! exactly. Parsers are case-insensitive and accept the latitude and the
//! longitude of a pair in either order.

use std::fmt;
use std::str::FromStr;

use crate::{Bbox, Circle, Cluster, EntryKind, Error, Point};

struct Lat(f64);

impl fmt::Display for Lat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        // negative zero is south, positive zero is north
        if self.0.is_sign_negative() {
            write!(f, "S{:015.12}", -self.0)
        } else {
            write!(f, "N{:015.12}", self.0)
        }
    }
}

struct Lon(f64);

impl fmt::Display for Lon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_sign_negative() {
            write!(f, "W{:016.12}", -self.0)
        } else {
            write!(f, "E{:016.12}", self.0)
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", Lat(self.lat()), Lon(self.lon()))
    }
}

impl fmt::Display for Bbox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("empty");
        }
        let mut lon_min = self.lon_min();
        let mut lon_max = self.lon_max();
        // Print boundaries beyond W180/E180 when the 180th meridian is
        // enclosed: the parser orders the longitude values, so the ordered
        // over-range form is what round-trips.
        if lon_min > lon_max {
            if lon_min + lon_max >= 0.0 {
                lon_min -= 360.0;
            } else {
                lon_max += 360.0;
            }
        }
        write!(
            f,
            "{} {} {} {}",
            Lat(self.lat_min()),
            Lon(lon_min),
            Lat(self.lat_max()),
            Lon(lon_max)
        )
    }
}

impl fmt::Display for Circle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            Lat(self.center().lat()),
            Lon(self.center().lon()),
            self.radius()
        )
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("empty");
        }
        for (i, entry) in self.entries().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            let keyword = match entry.kind() {
                EntryKind::Point => "point",
                EntryKind::Path => "path",
                EntryKind::Outline => "outline",
                EntryKind::Polygon => "polygon",
            };
            write!(f, "{keyword} (")?;
            for (j, point) in entry.points().iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{point}")?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

enum CoordToken {
    Lat(f64),
    Lon(f64),
}

// One compact coordinate token: a hemisphere tag directly followed by a
// number, e.g. "N53.5" or "w170".
fn coord_token(token: &str) -> Option<CoordToken> {
    let tag = token.chars().next()?;
    let value: f64 = token[tag.len_utf8()..].parse().ok()?;
    match tag.to_ascii_lowercase() {
        'n' => Some(CoordToken::Lat(value)),
        's' => Some(CoordToken::Lat(-value)),
        'e' => Some(CoordToken::Lon(value)),
        'w' => Some(CoordToken::Lon(-value)),
        _ => None,
    }
}

impl FromStr for Point {
    type Err = Error;

    /// Parses `'{N|S}<degrees> {E|W}<degrees>'`, tags case-insensitive,
    /// coordinates in either order.
    fn from_str(s: &str) -> Result<Self, Error> {
        let err = || Error::syntax("point", s);
        let mut lat = None;
        let mut lon = None;
        let mut tokens = s.split_whitespace();
        for _ in 0..2 {
            let token = tokens.next().ok_or_else(err)?;
            match coord_token(token).ok_or_else(err)? {
                CoordToken::Lat(value) => lat = Some(value),
                CoordToken::Lon(value) => lon = Some(value),
            }
        }
        if tokens.next().is_some() {
            return Err(err());
        }
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(err());
        };
        Point::new(lat, lon)
    }
}

impl FromStr for Bbox {
    type Err = Error;

    /// Parses four coordinate tokens in any order, or `"empty"`. The two
    /// latitudes and the two longitudes are sorted, so a box crossing the
    /// 180th meridian is written with an over-range boundary (e.g. `W190`).
    fn from_str(s: &str) -> Result<Self, Error> {
        let err = || Error::syntax("box", s);
        if s.trim().eq_ignore_ascii_case("empty") {
            return Ok(Bbox::empty());
        }
        let mut lats = Vec::with_capacity(2);
        let mut lons = Vec::with_capacity(2);
        for token in s.split_whitespace() {
            match coord_token(token).ok_or_else(err)? {
                CoordToken::Lat(value) => lats.push(value),
                CoordToken::Lon(value) => lons.push(value),
            }
            if lats.len() > 2 || lons.len() > 2 {
                return Err(err());
            }
        }
        if lats.len() != 2 || lons.len() != 2 {
            return Err(err());
        }
        let (lat_min, lat_max) = ordered(lats[0], lats[1]);
        let (lon_min, lon_max) = ordered(lons[0], lons[1]);
        Bbox::new(lat_min, lat_max, lon_min, lon_max)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

impl FromStr for Circle {
    type Err = Error;

    /// Parses `'{N|S}<degrees> {E|W}<degrees> <radius-meters>'`.
    fn from_str(s: &str) -> Result<Self, Error> {
        let err = || Error::syntax("circle", s);
        let tokens: Vec<&str> = s.split_whitespace().collect();
        let &[first, second, third] = tokens.as_slice() else {
            return Err(err());
        };
        let mut lat = None;
        let mut lon = None;
        for token in [first, second] {
            match coord_token(token).ok_or_else(err)? {
                CoordToken::Lat(value) => lat = Some(value),
                CoordToken::Lon(value) => lon = Some(value),
            }
        }
        let (Some(lat), Some(lon)) = (lat, lon) else {
            return Err(err());
        };
        let radius: f64 = third.parse().map_err(|_| err())?;
        Circle::new(lat, lon, radius)
    }
}

impl FromStr for Cluster {
    type Err = Error;

    /// Parses a sequence of `point (…)`, `path (…)`, `outline (…)`, and
    /// `polygon (…)` groups; `empty` tokens are ignored. Each group holds
    /// one or more whitespace-separated coordinate pairs.
    fn from_str(s: &str) -> Result<Self, Error> {
        let err = || Error::syntax("cluster", s);
        let mut parts: Vec<(EntryKind, Vec<Point>)> = Vec::new();
        let mut rest = s;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if let Some(after) = strip_keyword(rest, "empty") {
                if !after.is_empty() && !after.starts_with(char::is_whitespace) {
                    return Err(err());
                }
                rest = after;
                continue;
            }
            let (kind, after) = strip_entry_keyword(rest).ok_or_else(err)?;
            let mut body = after
                .trim_start()
                .strip_prefix('(')
                .ok_or_else(err)?;
            let mut points = Vec::new();
            loop {
                body = body.trim_start();
                if let Some(after) = body.strip_prefix(')') {
                    body = after;
                    break;
                }
                if body.is_empty() {
                    return Err(err());
                }
                let (first, after) = cut_token(body);
                let (second, after) = cut_token(after.trim_start());
                let mut lat = None;
                let mut lon = None;
                for token in [first, second] {
                    match coord_token(token).ok_or_else(err)? {
                        CoordToken::Lat(value) => lat = Some(value),
                        CoordToken::Lon(value) => lon = Some(value),
                    }
                }
                let (Some(lat), Some(lon)) = (lat, lon) else {
                    return Err(err());
                };
                points.push(Point::new(lat, lon)?);
                body = after;
            }
            if points.is_empty() {
                return Err(err());
            }
            parts.push((kind, points));
            rest = body;
        }
        Cluster::new(parts)
    }
}

// The longest prefix up to whitespace or a closing parenthesis.
fn cut_token(s: &str) -> (&str, &str) {
    let end = s
        .find(|c: char| c.is_whitespace() || c == ')')
        .unwrap_or(s.len());
    s.split_at(end)
}

fn strip_keyword<'a>(s: &'a str, keyword: &str) -> Option<&'a str> {
    let head = s.get(..keyword.len())?;
    head.eq_ignore_ascii_case(keyword)
        .then(|| &s[keyword.len()..])
}

fn strip_entry_keyword(s: &str) -> Option<(EntryKind, &str)> {
    for (keyword, kind) in [
        ("point", EntryKind::Point),
        ("path", EntryKind::Path),
        ("outline", EntryKind::Outline),
        ("polygon", EntryKind::Polygon),
    ] {
        if let Some(rest) = strip_keyword(s, keyword) {
            return Some((kind, rest));
        }
    }
    None
}
