/*!
Labeled geometric regions in pixel coordinate space and their rasterization into pixels.
 */
mod buffer;
mod collection;
pub(crate) mod prepared;

use std::path::Path;

use geo::{
    BooleanOps, BoundingRect, Centroid, ConvexHull, Coord, CoordsIter, Geometry, Intersects, LineString,
    MultiLineString, MultiPoint, MultiPolygon, Point, Polygon, Rect,
};
use log::debug;

use crate::{
    error::{Error, Result},
    geojson::{self, FeatureCollection},
    pixels::{PixelCoordinate, Pixels},
    utils::{self, CoordExt, PixelsExt},
};

pub use self::buffer::{buffer_geometry, circle, CIRCLE_SEGMENTS};
pub use self::collection::GeometricShapes;
use self::prepared::PreparedPolygon;

/// How a shape was built. Rectangles and circles are carried as polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Point,
    MultiPoint,
    Line,
    MultiLine,
    Polygon,
    MultiPolygon,
    Rectangle,
    Circle,
}

impl ShapeKind {
    fn of(geometry: &Geometry<f64>) -> Result<Self> {
        match geometry {
            Geometry::Point(_) => Ok(ShapeKind::Point),
            Geometry::MultiPoint(_) => Ok(ShapeKind::MultiPoint),
            Geometry::LineString(_) => Ok(ShapeKind::Line),
            Geometry::MultiLineString(_) => Ok(ShapeKind::MultiLine),
            Geometry::Polygon(_) => Ok(ShapeKind::Polygon),
            Geometry::MultiPolygon(_) => Ok(ShapeKind::MultiPolygon),
            other => Err(Error::InvalidType(format!("unsupported geometry {other:?}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Shape {
    label: String,
    kind: ShapeKind,
    geometry: Geometry<f64>,
}

/// Shapes are equal when their label and geometry are, however they were built.
impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label && self.geometry == other.geometry
    }
}

fn check_len(what: &str, found: usize, minimum: usize) -> Result<()> {
    if found < minimum {
        return Err(Error::Configuration(format!(
            "{what} needs at least {minimum} points, got {found}"
        )));
    }
    Ok(())
}

fn ring(what: &str, pixels: &Pixels) -> Result<LineString<f64>> {
    check_len(what, pixels.len(), 3)?;
    Ok(pixels.to_closed_ring())
}

/// Distinct vertices of a ring, the closing coordinate excluded.
fn check_ring(what: &str, ring: &LineString<f64>) -> Result<()> {
    let distinct = if ring.is_closed() { ring.0.len().saturating_sub(1) } else { ring.0.len() };
    check_len(what, distinct, 3)
}

fn check_polygon(polygon: &Polygon<f64>) -> Result<()> {
    check_ring("polygon", polygon.exterior())?;
    polygon.interiors().iter().try_for_each(|hole| check_ring("polygon hole", hole))
}

/// Same minimum point counts as the named constructors, applied to every part of a raw geometry.
fn check_parts(geometry: &Geometry<f64>) -> Result<()> {
    match geometry {
        Geometry::MultiPoint(points) => check_len("multipoint", points.0.len(), 1),
        Geometry::LineString(line) => check_len("line", line.0.len(), 2),
        Geometry::MultiLineString(lines) => {
            check_len("multiline", lines.0.len(), 1)?;
            lines.iter().try_for_each(|line| check_len("line", line.0.len(), 2))
        }
        Geometry::Polygon(polygon) => check_polygon(polygon),
        Geometry::MultiPolygon(polygons) => {
            check_len("multipolygon", polygons.0.len(), 1)?;
            polygons.iter().try_for_each(check_polygon)
        }
        _ => Ok(()),
    }
}

impl Shape {
    fn build(kind: ShapeKind, geometry: Geometry<f64>) -> Self {
        Self { label: String::new(), kind, geometry }
    }

    /**
    Wrap a raw geometry. `Line` is promoted to a line string, `Rect` and `Triangle` to polygons.

    # Errors
    `InvalidType` for geometry collections, `Configuration` for empty geometries and for parts with fewer
    points than the matching named constructor accepts.
     */
    pub fn from_geometry(geometry: Geometry<f64>, label: impl Into<String>) -> Result<Self> {
        let (kind, geometry) = match geometry {
            Geometry::Line(line) => (ShapeKind::Line, Geometry::LineString(LineString::from(line))),
            Geometry::Rect(rect) => (ShapeKind::Rectangle, Geometry::Polygon(rect.to_polygon())),
            Geometry::Triangle(triangle) => (ShapeKind::Polygon, Geometry::Polygon(triangle.to_polygon())),
            geometry => (ShapeKind::of(&geometry)?, geometry),
        };
        if geometry.coords_count() == 0 {
            return Err(Error::Configuration("empty geometry".to_string()));
        }
        check_parts(&geometry)?;
        Ok(Self { label: label.into(), kind, geometry })
    }

    /**
    Build from exactly one of a raw geometry or a loaded feature collection.
    Several features are merged into the matching multi geometry.
     */
    pub fn from_source(
        geometry: Option<Geometry<f64>>,
        features: Option<FeatureCollection>,
        label: Option<String>,
    ) -> Result<Self> {
        match (geometry, features) {
            (Some(_), Some(_)) => Err(Error::Configuration(
                "a shape is built from a geometry or from loaded features, not both".to_string(),
            )),
            (None, None) => Err(Error::Configuration(
                "a shape needs a geometry or loaded features".to_string(),
            )),
            (Some(geometry), None) => Self::from_geometry(geometry, label.unwrap_or_default()),
            (None, Some(features)) => {
                let label = label
                    .or_else(|| features.features.first().and_then(|f| f.label()))
                    .unwrap_or_default();
                let geometries = features
                    .features
                    .iter()
                    .map(|feature| feature.geometry.to_geometry())
                    .collect::<Result<Vec<_>>>()?;
                Self::from_geometry(merge_geometries(geometries)?, label)
            }
        }
    }

    /**
    Load a vector file (GeoJSON feature collection) as a single shape.

    # Errors
    `FileNotFound` if the path does not exist, `InvalidInput` if it cannot be parsed.
     */
    pub fn open_shapefile(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let features = geojson::read_feature_collection(path)?;
        debug!("Loaded {} features from {:?}", features.features.len(), path);
        Self::from_source(None, Some(features), None)
    }

    pub fn from_point(x: f64, y: f64) -> Self {
        Self::build(ShapeKind::Point, Geometry::Point(Point::new(x, y)))
    }

    pub fn from_multipoint(pixels: &Pixels) -> Result<Self> {
        check_len("multipoint", pixels.len(), 1)?;
        let points = pixels.to_coords().into_iter().map(Point::from).collect();
        Ok(Self::build(ShapeKind::MultiPoint, Geometry::MultiPoint(MultiPoint::new(points))))
    }

    pub fn from_line(pixels: &Pixels) -> Result<Self> {
        check_len("line", pixels.len(), 2)?;
        Ok(Self::build(ShapeKind::Line, Geometry::LineString(LineString::new(pixels.to_coords()))))
    }

    pub fn from_multiline(lines: &[Pixels]) -> Result<Self> {
        check_len("multiline", lines.len(), 1)?;
        let lines = lines
            .iter()
            .map(|pixels| {
                check_len("line", pixels.len(), 2)?;
                Ok(LineString::new(pixels.to_coords()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::build(ShapeKind::MultiLine, Geometry::MultiLineString(MultiLineString::new(lines))))
    }

    /**
    Polygon from an exterior ring and optional holes. Rings are closed if needed.
     */
    pub fn from_polygon(exterior: &Pixels, holes: Option<&[Pixels]>) -> Result<Self> {
        let exterior = ring("polygon", exterior)?;
        let holes = holes
            .unwrap_or_default()
            .iter()
            .map(|hole| ring("polygon hole", hole))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::build(ShapeKind::Polygon, Geometry::Polygon(Polygon::new(exterior, holes))))
    }

    pub fn from_rectangle(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Result<Self> {
        if x_min > x_max || y_min > y_max {
            return Err(Error::Configuration(format!(
                "rectangle corners ({x_min}, {y_min}) and ({x_max}, {y_max}) are swapped"
            )));
        }
        let exterior = LineString::from(vec![
            (x_min, y_min),
            (x_max, y_min),
            (x_max, y_max),
            (x_min, y_max),
            (x_min, y_min),
        ]);
        Ok(Self::build(ShapeKind::Rectangle, Geometry::Polygon(Polygon::new(exterior, vec![]))))
    }

    pub fn from_multipolygon(rings: &[Pixels]) -> Result<Self> {
        check_len("multipolygon", rings.len(), 1)?;
        let polygons = rings
            .iter()
            .map(|pixels| Ok(Polygon::new(ring("polygon", pixels)?, vec![])))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::build(ShapeKind::MultiPolygon, Geometry::MultiPolygon(MultiPolygon::new(polygons))))
    }

    pub fn from_circle(center: PixelCoordinate, radius: f64) -> Result<Self> {
        if !(radius > 0.0) || !radius.is_finite() {
            return Err(Error::Configuration(format!("circle radius must be positive, got {radius}")));
        }
        let polygon = circle(Coord::from(center), radius, CIRCLE_SEGMENTS);
        Ok(Self::build(ShapeKind::Circle, Geometry::Polygon(polygon)))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn geometry(&self) -> &Geometry<f64> {
        &self.geometry
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Lowercased geometry kind: `point`, `multipoint`, `linestring`, `multilinestring`, `polygon` or
    /// `multipolygon`.
    pub fn shape_type(&self) -> &'static str {
        match self.geometry {
            Geometry::Point(_) => "point",
            Geometry::MultiPoint(_) => "multipoint",
            Geometry::LineString(_) => "linestring",
            Geometry::MultiLineString(_) => "multilinestring",
            Geometry::Polygon(_) => "polygon",
            Geometry::MultiPolygon(_) => "multipolygon",
            _ => "geometry",
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(
            self.geometry,
            Geometry::MultiPoint(_) | Geometry::MultiLineString(_) | Geometry::MultiPolygon(_)
        )
    }

    pub fn is_point(&self) -> bool {
        matches!(self.geometry, Geometry::Point(_) | Geometry::MultiPoint(_))
    }

    pub fn is_line(&self) -> bool {
        matches!(self.geometry, Geometry::LineString(_) | Geometry::MultiLineString(_))
    }

    pub fn is_polygon(&self) -> bool {
        matches!(self.geometry, Geometry::Polygon(_) | Geometry::MultiPolygon(_))
    }

    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.geometry.bounding_rect()
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.geometry.centroid()
    }

    pub fn convex_hull(&self) -> Polygon<f64> {
        MultiPoint::from(self.geometry.coords_iter().collect::<Vec<_>>()).convex_hull()
    }

    pub fn envelope(&self) -> Option<Polygon<f64>> {
        self.bounds().map(|rect| rect.to_polygon())
    }

    /**
    Exterior ring of a polygon shape.

    # Errors
    `Configuration` when the shape is not a single polygon.
     */
    pub fn exterior(&self) -> Result<&LineString<f64>> {
        match &self.geometry {
            Geometry::Polygon(polygon) => Ok(polygon.exterior()),
            _ => Err(Error::Configuration(format!(
                "exterior is only defined for polygons, not {}",
                self.shape_type()
            ))),
        }
    }

    pub fn buffer(&self, distance: f64) -> Result<Self> {
        let geometry = buffer_geometry(&self.geometry, distance)?;
        Self::from_geometry(geometry, self.label.clone())
    }

    /**
    Union with another shape of the same dimension (points, lines or polygons).
     */
    pub fn union(&self, other: &Shape) -> Result<Self> {
        let geometry = match (&self.geometry, &other.geometry) {
            (a, b) if self.is_polygon() && other.is_polygon() => {
                buffer::collapse(to_multipolygon(a).union(&to_multipolygon(b)))
            }
            _ if self.is_point() && other.is_point() => {
                let mut points = self.geometry.coords_iter().collect::<Vec<_>>();
                for coord in other.geometry.coords_iter() {
                    if !points.contains(&coord) {
                        points.push(coord);
                    }
                }
                single_or_multipoint(points)
            }
            _ if self.is_line() && other.is_line() => {
                Geometry::MultiLineString(MultiLineString::new(
                    lines_of(&self.geometry).into_iter().chain(lines_of(&other.geometry)).collect(),
                ))
            }
            _ => {
                return Err(Error::InvalidType(format!(
                    "cannot union a {} with a {}",
                    self.shape_type(),
                    other.shape_type()
                )))
            }
        };
        Self::from_geometry(geometry, self.label.clone())
    }

    /**
    Intersection with another shape. Points are kept where they touch the other shape, lines are clipped by
    polygons, polygons are intersected.

    # Errors
    `InvalidType` for two line shapes, `InvalidInput` when the intersection is empty.
     */
    pub fn intersection(&self, other: &Shape) -> Result<Self> {
        let geometry = if self.is_polygon() && other.is_polygon() {
            buffer::collapse(to_multipolygon(&self.geometry).intersection(&to_multipolygon(&other.geometry)))
        } else if self.is_point() || other.is_point() {
            let (points, area) = if self.is_point() { (self, other) } else { (other, self) };
            let kept = points
                .geometry
                .coords_iter()
                .filter(|coord| area.geometry.intersects(&Point::from(*coord)))
                .collect::<Vec<_>>();
            if kept.is_empty() {
                return Err(Error::InvalidInput("empty intersection".to_string()));
            }
            single_or_multipoint(kept)
        } else if self.is_line() != other.is_line() {
            let (lines, area) = if self.is_line() { (self, other) } else { (other, self) };
            let clipped = to_multipolygon(&area.geometry)
                .clip(&MultiLineString::new(lines_of(&lines.geometry)), false);
            Geometry::MultiLineString(clipped)
        } else {
            return Err(Error::InvalidType(format!(
                "cannot intersect a {} with a {}",
                self.shape_type(),
                other.shape_type()
            )));
        };
        if geometry.coords_count() == 0 {
            return Err(Error::InvalidInput("empty intersection".to_string()));
        }
        Self::from_geometry(geometry, self.label.clone())
    }

    /**
    Disjoint regions making up the shape. A polygon is its own region (holes included), a line is reduced to
    the convex hull of its vertices.
     */
    pub(crate) fn hull_components(&self) -> Vec<Polygon<f64>> {
        match &self.geometry {
            Geometry::Polygon(polygon) => vec![polygon.clone()],
            Geometry::MultiPolygon(polygons) => polygons.0.clone(),
            Geometry::LineString(line) => vec![line.convex_hull()],
            Geometry::MultiLineString(lines) => lines.iter().map(|line| line.convex_hull()).collect(),
            Geometry::Point(_) | Geometry::MultiPoint(_) => vec![self.convex_hull()],
            _ => vec![],
        }
    }

    /**
    Enumerate the pixels on a grid of step `resolution` that lie inside or on the boundary of the shape.

    Point shapes give back their own coordinates, unmodified, as a single collection. Other shapes give one
    collection per disjoint component, scanned column by column.

    # Errors
    `InvalidInput` if `resolution` is not strictly positive.
     */
    pub fn get_pixels_within_convex_hull(&self, resolution: f64) -> Result<Vec<Pixels>> {
        if !(resolution > 0.0) || !resolution.is_finite() {
            return Err(Error::InvalidInput(format!(
                "resolution must be strictly positive, got {resolution}"
            )));
        }
        if self.is_point() {
            return Ok(vec![point_pixels(&self.geometry)?]);
        }
        Ok(self
            .hull_components()
            .iter()
            .map(|hull| rasterize(hull, resolution))
            .collect())
    }
}

fn rasterize(hull: &Polygon<f64>, resolution: f64) -> Pixels {
    let Some(bounds) = hull.bounding_rect() else {
        return Pixels::default();
    };
    let xs = utils::grid_axis(bounds.min().x, bounds.max().x, resolution);
    let ys = utils::grid_axis(bounds.min().y, bounds.max().y, resolution);
    let prepared = PreparedPolygon::new(hull);
    let rows = ys.iter().map(|y| prepared.row(*y)).collect::<Vec<_>>();

    xs.iter()
        .flat_map(|x| {
            ys.iter()
                .zip(&rows)
                .filter(move |(_, row)| row.contains(*x))
                .map(move |(y, _)| PixelCoordinate::new(*x, *y))
        })
        .collect()
}

/// Coordinates of a point or multipoint geometry, in order.
pub(crate) fn point_pixels(geometry: &Geometry<f64>) -> Result<Pixels> {
    match geometry {
        Geometry::Point(point) => Ok(Pixels::new(vec![point.0.to_pixel()])),
        Geometry::MultiPoint(points) => Ok(points.iter().map(|point| point.0.to_pixel()).collect()),
        other => Err(Error::InvalidType(format!("expected a point geometry, got {other:?}"))),
    }
}

fn to_multipolygon(geometry: &Geometry<f64>) -> MultiPolygon<f64> {
    match geometry {
        Geometry::Polygon(polygon) => MultiPolygon::new(vec![polygon.clone()]),
        Geometry::MultiPolygon(polygons) => polygons.clone(),
        _ => MultiPolygon::new(vec![]),
    }
}

fn lines_of(geometry: &Geometry<f64>) -> Vec<LineString<f64>> {
    match geometry {
        Geometry::LineString(line) => vec![line.clone()],
        Geometry::MultiLineString(lines) => lines.0.clone(),
        _ => vec![],
    }
}

fn single_or_multipoint(mut coords: Vec<Coord<f64>>) -> Geometry<f64> {
    if coords.len() == 1 {
        Geometry::Point(Point::from(coords.remove(0)))
    } else {
        Geometry::MultiPoint(coords.into_iter().map(Point::from).collect())
    }
}

/// Merge loaded geometries into one. A single geometry is kept, several of the same dimension become a multi
/// geometry.
fn merge_geometries(mut geometries: Vec<Geometry<f64>>) -> Result<Geometry<f64>> {
    if geometries.len() == 1 {
        return Ok(geometries.remove(0));
    }
    let mut points = Vec::new();
    let mut lines = Vec::new();
    let mut polygons = Vec::new();
    for geometry in geometries {
        match geometry {
            Geometry::Point(p) => points.push(p),
            Geometry::MultiPoint(mp) => points.extend(mp.0),
            Geometry::LineString(l) => lines.push(l),
            Geometry::MultiLineString(ml) => lines.extend(ml.0),
            Geometry::Polygon(p) => polygons.push(p),
            Geometry::MultiPolygon(mp) => polygons.extend(mp.0),
            other => return Err(Error::InvalidType(format!("unsupported geometry {other:?}"))),
        }
    }
    match (points.is_empty(), lines.is_empty(), polygons.is_empty()) {
        (false, true, true) => Ok(Geometry::MultiPoint(MultiPoint::new(points))),
        (true, false, true) => Ok(Geometry::MultiLineString(MultiLineString::new(lines))),
        (true, true, false) => Ok(Geometry::MultiPolygon(MultiPolygon::new(polygons))),
        (true, true, true) => Err(Error::Configuration("no geometry to load".to_string())),
        _ => Err(Error::InvalidType("loaded features mix geometry dimensions".to_string())),
    }
}
