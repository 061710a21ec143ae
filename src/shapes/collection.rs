/*!
The list of regions of interest attached to one image.

Every mutating method converts and validates all of its incoming items before touching the list, so a failed
call leaves the collection as it was.
 */
use std::{cmp::Ordering, ops::Index};

use geo::Geometry;

use crate::error::{Error, Result};

use super::Shape;

impl TryFrom<Geometry<f64>> for Shape {
    type Error = Error;

    fn try_from(geometry: Geometry<f64>) -> Result<Self> {
        Shape::from_geometry(geometry, String::new())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GeometricShapes {
    owner: String,
    shapes: Vec<Shape>,
}

fn validate<T>(item: T) -> Result<Shape>
where
    T: TryInto<Shape>,
    Error: From<T::Error>,
{
    Ok(item.try_into()?)
}

impl GeometricShapes {
    /// Empty collection owned by the image identified by `owner`.
    pub fn new(owner: impl Into<String>) -> Self {
        Self { owner: owner.into(), shapes: Vec::new() }
    }

    pub fn with_shapes<I, T>(owner: impl Into<String>, shapes: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: TryInto<Shape>,
        Error: From<T::Error>,
    {
        let mut collection = Self::new(owner);
        collection.extend(shapes)?;
        Ok(collection)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Copy of the current shapes.
    pub fn shapes(&self) -> Vec<Shape> {
        self.shapes.clone()
    }

    pub fn append<T>(&mut self, item: T) -> Result<()>
    where
        T: TryInto<Shape>,
        Error: From<T::Error>,
    {
        self.shapes.push(validate(item)?);
        Ok(())
    }

    pub fn extend<I, T>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: TryInto<Shape>,
        Error: From<T::Error>,
    {
        let shapes = items.into_iter().map(validate).collect::<Result<Vec<_>>>()?;
        self.shapes.extend(shapes);
        Ok(())
    }

    /// Insert before `index`. An index past the end appends.
    pub fn insert<T>(&mut self, index: usize, item: T) -> Result<()>
    where
        T: TryInto<Shape>,
        Error: From<T::Error>,
    {
        let shape = validate(item)?;
        self.shapes.insert(index.min(self.shapes.len()), shape);
        Ok(())
    }

    pub fn set<T>(&mut self, index: usize, item: T) -> Result<()>
    where
        T: TryInto<Shape>,
        Error: From<T::Error>,
    {
        let shape = validate(item)?;
        let len = self.shapes.len();
        let slot = self
            .shapes
            .get_mut(index)
            .ok_or_else(|| Error::InvalidInput(format!("index {index} out of range for {len} shapes")))?;
        *slot = shape;
        Ok(())
    }

    /// Remove the first shape equal to `shape`.
    pub fn remove(&mut self, shape: &Shape) -> Result<()> {
        let index = self
            .index(shape)
            .ok_or_else(|| Error::InvalidInput(format!("shape {:?} is not in the collection", shape.label())))?;
        self.shapes.remove(index);
        Ok(())
    }

    /// Remove and return the shape at `index`, or the last one.
    pub fn pop(&mut self, index: Option<usize>) -> Result<Shape> {
        let len = self.shapes.len();
        let index = index.unwrap_or(len.wrapping_sub(1));
        if index >= len {
            return Err(Error::InvalidInput(format!("pop index {index} out of range for {len} shapes")));
        }
        Ok(self.shapes.remove(index))
    }

    pub fn index(&self, shape: &Shape) -> Option<usize> {
        self.shapes.iter().position(|s| s == shape)
    }

    pub fn count(&self, shape: &Shape) -> usize {
        self.shapes.iter().filter(|s| *s == shape).count()
    }

    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Shape, &Shape) -> Ordering,
    {
        self.shapes.sort_by(compare);
    }

    pub fn sort_by_label(&mut self) {
        self.shapes.sort_by(|a, b| a.label().cmp(b.label()));
    }

    pub fn reverse(&mut self) {
        self.shapes.reverse();
    }

    pub fn clear(&mut self) {
        self.shapes.clear();
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Shape> {
        self.shapes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shape> {
        self.shapes.iter()
    }

    /// First shape carrying `label`. Duplicated labels are allowed, only the first match is returned.
    pub fn get_by_name(&self, label: &str) -> Option<&Shape> {
        self.shapes.iter().find(|shape| shape.label() == label)
    }
}

impl Index<usize> for GeometricShapes {
    type Output = Shape;

    fn index(&self, index: usize) -> &Shape {
        &self.shapes[index]
    }
}

impl<'a> IntoIterator for &'a GeometricShapes {
    type Item = &'a Shape;
    type IntoIter = std::slice::Iter<'a, Shape>;

    fn into_iter(self) -> Self::IntoIter {
        self.shapes.iter()
    }
}
