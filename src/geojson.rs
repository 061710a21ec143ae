/*!
This module contains the struct definition for the GeoJSON format.
They are use to (de)serialize vector files of labeled shapes.
 */
use std::{fs::File, io::BufReader, path::Path};

use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    error::{Error, Result},
    shapes::Shape,
};

pub type Position = Vec<f64>;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum GeoJsonGeometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub typ: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Vec<f64>>,
    pub geometry: GeoJsonGeometry,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub typ: String,
    pub features: Vec<Feature>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn coord(position: &Position) -> Result<Coord<f64>> {
    match position.as_slice() {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(Error::InvalidInput(format!("position {position:?} needs at least 2 values"))),
    }
}

fn line(positions: &[Position]) -> Result<LineString<f64>> {
    Ok(LineString::new(positions.iter().map(coord).collect::<Result<_>>()?))
}

fn polygon(rings: &[Vec<Position>]) -> Result<Polygon<f64>> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| Error::InvalidInput("polygon without exterior ring".to_string()))?;
    Ok(Polygon::new(
        line(exterior)?,
        interiors.iter().map(|ring| line(ring)).collect::<Result<_>>()?,
    ))
}

fn positions(line: &LineString<f64>) -> Vec<Position> {
    line.coords().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Position>> {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(positions)
        .collect()
}

impl GeoJsonGeometry {
    pub fn to_geometry(&self) -> Result<Geometry<f64>> {
        Ok(match self {
            GeoJsonGeometry::Point { coordinates } => Geometry::Point(Point(coord(coordinates)?)),
            GeoJsonGeometry::MultiPoint { coordinates } => Geometry::MultiPoint(MultiPoint::new(
                coordinates.iter().map(|p| coord(p).map(Point)).collect::<Result<_>>()?,
            )),
            GeoJsonGeometry::LineString { coordinates } => Geometry::LineString(line(coordinates)?),
            GeoJsonGeometry::MultiLineString { coordinates } => Geometry::MultiLineString(MultiLineString::new(
                coordinates.iter().map(|l| line(l)).collect::<Result<_>>()?,
            )),
            GeoJsonGeometry::Polygon { coordinates } => Geometry::Polygon(polygon(coordinates)?),
            GeoJsonGeometry::MultiPolygon { coordinates } => Geometry::MultiPolygon(MultiPolygon::new(
                coordinates.iter().map(|p| polygon(p)).collect::<Result<_>>()?,
            )),
        })
    }

    pub fn from_geometry(geometry: &Geometry<f64>) -> Result<Self> {
        Ok(match geometry {
            Geometry::Point(p) => GeoJsonGeometry::Point { coordinates: vec![p.x(), p.y()] },
            Geometry::MultiPoint(points) => GeoJsonGeometry::MultiPoint {
                coordinates: points.iter().map(|p| vec![p.x(), p.y()]).collect(),
            },
            Geometry::LineString(l) => GeoJsonGeometry::LineString { coordinates: positions(l) },
            Geometry::MultiLineString(lines) => GeoJsonGeometry::MultiLineString {
                coordinates: lines.iter().map(positions).collect(),
            },
            Geometry::Polygon(p) => GeoJsonGeometry::Polygon { coordinates: polygon_rings(p) },
            Geometry::MultiPolygon(polygons) => GeoJsonGeometry::MultiPolygon {
                coordinates: polygons.iter().map(polygon_rings).collect(),
            },
            other => return Err(Error::InvalidType(format!("no GeoJSON mapping for {other:?}"))),
        })
    }
}

impl Feature {
    /// The `label` property, or `name` when there is no label.
    pub fn label(&self) -> Option<String> {
        let properties = self.properties.as_ref()?;
        let value = properties.get("label").or_else(|| properties.get("name"))?;
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    pub fn from_shape(shape: &Shape) -> Result<Self> {
        let mut properties = Map::new();
        properties.insert("label".to_string(), Value::String(shape.label().to_string()));
        Ok(Self {
            typ: feature_type(),
            bbox: None,
            geometry: GeoJsonGeometry::from_geometry(shape.geometry())?,
            properties: Some(properties),
        })
    }
}

impl FeatureCollection {
    pub fn from_shapes<'a>(shapes: impl IntoIterator<Item = &'a Shape>) -> Result<Self> {
        Ok(Self {
            typ: feature_collection_type(),
            features: shapes.into_iter().map(Feature::from_shape).collect::<Result<_>>()?,
        })
    }
}

/**
Read a GeoJSON feature collection.

# Errors
`FileNotFound` when the path does not exist, `InvalidInput` when it cannot be parsed.
 */
pub fn read_feature_collection(path: impl AsRef<Path>) -> Result<FeatureCollection> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }
    let file = BufReader::new(File::open(path)?);
    serde_json::from_reader(file)
        .map_err(|err| Error::InvalidInput(format!("Couldn't parse GeoJSON {path:?} : {err}")))
}

/**
Every feature of the file as its own shape. Features without label are named after their position in the file.
 */
pub fn read_shapes(path: impl AsRef<Path>) -> Result<Vec<Shape>> {
    read_feature_collection(path)?
        .features
        .iter()
        .enumerate()
        .map(|(i, feature)| {
            let label = feature.label().unwrap_or_else(|| i.to_string());
            Shape::from_geometry(feature.geometry.to_geometry()?, label)
        })
        .collect()
}

pub fn write_shapes<'a>(path: impl AsRef<Path>, shapes: impl IntoIterator<Item = &'a Shape>) -> Result<()> {
    let collection = FeatureCollection::from_shapes(shapes)?;
    let file = File::create(path.as_ref())?;
    serde_json::to_writer(file, &collection)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 0]]]},
                "properties": {"label": "leaf"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [1.5, 2.5, 0.0]},
                "properties": {"name": 7}
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[0, 0], [3, 3]]},
                "properties": null
            }
        ]
    }"#;

    #[test]
    fn reads_labeled_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shapes.geojson");
        std::fs::write(&path, SAMPLE).unwrap();

        let shapes = read_shapes(&path).unwrap();
        assert_eq!(shapes.len(), 3);
        assert_eq!(shapes[0].label(), "leaf");
        assert!(shapes[0].is_polygon());
        assert_eq!(shapes[1].label(), "7");
        assert!(shapes[1].is_point());
        assert_eq!(shapes[2].label(), "2");
        assert!(shapes[2].is_line());
    }

    #[test]
    fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.geojson");
        let shapes = vec![
            Shape::from_rectangle(0.0, 0.0, 2.0, 3.0).unwrap().with_label("box"),
            Shape::from_point(1.0, 1.0).with_label("dot"),
        ];
        write_shapes(&path, &shapes).unwrap();
        assert_eq!(read_shapes(&path).unwrap(), shapes);
    }

    #[test]
    fn errors() {
        assert!(matches!(
            read_feature_collection("/no/such/file.geojson"),
            Err(Error::FileNotFound(_))
        ));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.geojson");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(read_feature_collection(&path), Err(Error::InvalidInput(_))));
    }
}
