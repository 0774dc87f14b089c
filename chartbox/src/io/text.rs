//! [`TextFeatureSource`]: a minimal line-oriented feature source.
//!
//! Deliberately not GeoJSON/Shapefile -- full vector-GIS ingest is out of
//! scope. This exists so the CLI and tests have a concrete
//! [`super::FeatureSource`] to drive: one bbox line, then one `role, class`
//! header line per feature followed by its vertex lines.
//!
//! ```text
//! BBOX 41.2 -70.3 41.3 -70.2
//! FEATURE BOUNDARY CLEAR
//! 41.20 -70.30
//! 41.20 -70.20
//! 41.30 -70.20
//! 41.30 -70.30
//! END
//! FEATURE CONTOUR BLOCK
//! 41.22 -70.28
//! 41.22 -70.24
//! 41.26 -70.24
//! 41.26 -70.28
//! END
//! HOLE
//! 41.23 -70.27
//! 41.23 -70.26
//! 41.24 -70.26
//! 41.24 -70.27
//! END
//! ```

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::multispace1;
use nom::combinator::{map_res, value};
use nom::number::complete::recognize_float;
use nom::sequence::{preceded, separated_pair};
use nom::IResult;

use crate::cell::{BLOCK, CLEAR};
use crate::chart_box::Role;
use crate::error::Error;
use crate::geometry::{BoundBox, Global, Point, Polygon};
use crate::io::{Feature, FeatureSource};

fn float(input: &str) -> IResult<&str, f64> {
    map_res(recognize_float, str::parse)(input)
}

fn role(input: &str) -> IResult<&str, Role> {
    alt((
        value(Role::Boundary, tag("BOUNDARY")),
        value(Role::Contour, tag("CONTOUR")),
    ))(input)
}

fn fill_class(input: &str) -> IResult<&str, u8> {
    alt((value(BLOCK, tag("BLOCK")), value(CLEAR, tag("CLEAR"))))(input)
}

fn bbox_line(input: &str) -> IResult<&str, BoundBox<Global>> {
    let (input, _) = tag("BBOX")(input)?;
    let (input, min_lat) = preceded(multispace1, float)(input)?;
    let (input, min_lon) = preceded(multispace1, float)(input)?;
    let (input, max_lat) = preceded(multispace1, float)(input)?;
    let (input, max_lon) = preceded(multispace1, float)(input)?;
    Ok((
        input,
        BoundBox::new(
            Point::from_lat_lon(min_lat, min_lon),
            Point::from_lat_lon(max_lat, max_lon),
        ),
    ))
}

fn feature_header(input: &str) -> IResult<&str, (Role, u8)> {
    let (input, _) = tag("FEATURE")(input)?;
    let (input, role) = preceded(multispace1, role)(input)?;
    let (input, class) = preceded(multispace1, fill_class)(input)?;
    Ok((input, (role, class)))
}

fn vertex_line(input: &str) -> IResult<&str, Point<Global>> {
    let (input, (lat, lon)) = separated_pair(float, multispace1, float)(input)?;
    Ok((input, Point::from_lat_lon(lat, lon)))
}

fn hole_header(input: &str) -> IResult<&str, &str> {
    tag("HOLE")(input)
}

fn end_line(input: &str) -> IResult<&str, &str> {
    tag("END")(input)
}

fn trimmed(line: &str) -> &str {
    line.trim()
}

/// Parses a ring of vertex lines up to (and consuming) an `END` line.
fn parse_ring<'a, I>(lines: &mut I) -> Result<Polygon<Global>, Error>
where
    I: Iterator<Item = &'a str>,
{
    let mut points = Vec::new();
    loop {
        let Some(raw) = lines.next() else {
            return Err(Error::InvalidGeometry("ring missing END line".into()));
        };
        let line = trimmed(raw);
        if line.is_empty() {
            continue;
        }
        if end_line(line).is_ok() {
            break;
        }
        let (_, p) = vertex_line(line)
            .map_err(|e| Error::InvalidGeometry(format!("bad vertex line {line:?}: {e}")))?;
        points.push(p);
    }
    let mut polygon = Polygon::new(points)?;
    polygon.complete(1e-6);
    Ok(polygon)
}

/// A [`FeatureSource`] over an in-memory text buffer in the format
/// documented on [`self`].
pub struct TextFeatureSource {
    lines: Vec<String>,
    cursor: usize,
    bbox: Option<BoundBox<Global>>,
}

impl TextFeatureSource {
    /// # Errors
    /// [`Error::InvalidGeometry`] if the first non-blank line is not a
    /// `BBOX` line.
    pub fn from_str(contents: &str) -> Result<Self, Error> {
        let lines: Vec<String> = contents.lines().map(str::to_owned).collect();
        let mut source = Self {
            lines,
            cursor: 0,
            bbox: None,
        };
        source.parse_bbox()?;
        Ok(source)
    }

    /// # Errors
    /// [`Error::IoError`] if `path` cannot be read; see [`Self::from_str`]
    /// for parse errors.
    pub fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| Error::IoError { path: path.to_owned(), source })?;
        Self::from_str(&contents)
    }

    fn parse_bbox(&mut self) -> Result<(), Error> {
        while self.cursor < self.lines.len() {
            let line = trimmed(&self.lines[self.cursor]);
            self.cursor += 1;
            if line.is_empty() {
                continue;
            }
            let (_, bbox) = bbox_line(line)
                .map_err(|e| Error::InvalidGeometry(format!("bad BBOX line {line:?}: {e}")))?;
            self.bbox = Some(bbox);
            return Ok(());
        }
        Err(Error::InvalidGeometry("missing BBOX line".into()))
    }

    fn next_nonblank(&mut self) -> Option<&str> {
        while self.cursor < self.lines.len() {
            let line = trimmed(&self.lines[self.cursor]);
            self.cursor += 1;
            if !line.is_empty() {
                return Some(&self.lines[self.cursor - 1]);
            }
        }
        None
    }

    fn peek_nonblank(&self) -> Option<&str> {
        self.lines[self.cursor..]
            .iter()
            .map(String::as_str)
            .find(|l| !trimmed(l).is_empty())
    }
}

impl FeatureSource for TextFeatureSource {
    fn bounding_box(&mut self) -> Result<BoundBox<Global>, Error> {
        self.bbox
            .ok_or_else(|| Error::InvalidGeometry("bounding_box called before BBOX parsed".into()))
    }

    fn next_feature(&mut self) -> Result<Option<Feature>, Error> {
        let Some(header_line) = self.next_nonblank() else {
            return Ok(None);
        };
        let header_line = trimmed(header_line).to_owned();
        let (_, (role, fill_value)) = feature_header(&header_line)
            .map_err(|e| Error::InvalidGeometry(format!("bad FEATURE line {header_line:?}: {e}")))?;

        let mut remaining_lines = self.lines[self.cursor..].iter().map(String::as_str);
        let outer = parse_ring(&mut remaining_lines)?;
        let mut consumed = self.lines.len() - self.cursor - remaining_lines.count();
        self.cursor += consumed;

        let mut holes = Vec::new();
        while let Some(peeked) = self.peek_nonblank() {
            if hole_header(trimmed(peeked)).is_err() {
                break;
            }
            self.next_nonblank(); // consume HOLE line
            let mut remaining_lines = self.lines[self.cursor..].iter().map(String::as_str);
            let hole = parse_ring(&mut remaining_lines)?;
            consumed = self.lines.len() - self.cursor - remaining_lines.count();
            self.cursor += consumed;
            holes.push(hole);
        }

        Ok(Some(Feature {
            role,
            outer,
            holes,
            fill_value,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
BBOX 41.2 -70.3 41.3 -70.2
FEATURE BOUNDARY CLEAR
41.20 -70.30
41.20 -70.20
41.30 -70.20
41.30 -70.30
END
FEATURE CONTOUR BLOCK
41.22 -70.28
41.22 -70.24
41.26 -70.24
41.26 -70.28
END
HOLE
41.23 -70.27
41.23 -70.26
41.24 -70.26
41.24 -70.27
END
";

    #[test]
    fn parses_bbox_and_two_features() {
        let mut source = TextFeatureSource::from_str(SAMPLE).unwrap();
        let bbox = source.bounding_box().unwrap();
        assert_eq!(bbox.min, Point::from_lat_lon(41.2, -70.3));

        let first = source.next_feature().unwrap().unwrap();
        assert_eq!(first.role, Role::Boundary);
        assert_eq!(first.fill_value, CLEAR);
        assert!(first.holes.is_empty());

        let second = source.next_feature().unwrap().unwrap();
        assert_eq!(second.role, Role::Contour);
        assert_eq!(second.fill_value, BLOCK);
        assert_eq!(second.holes.len(), 1);

        assert!(source.next_feature().unwrap().is_none());
    }

    #[test]
    fn missing_bbox_errors() {
        assert!(TextFeatureSource::from_str("FEATURE BOUNDARY CLEAR\n").is_err());
    }
}
