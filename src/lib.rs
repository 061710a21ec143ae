/*!
Spectral signature extraction from hyperspectral and multispectral image cubes.

Regions of interest are described as [`Shape`]s in pixel coordinates. They are rasterized into [`Pixels`] and
paired with the spectral vectors of an image cube into row aligned [`Signatures`], ready to be turned into
tabular datasets.
 */
pub mod cube;
pub mod error;
pub mod extract;
pub mod geojson;
pub mod io;
pub mod pixels;
pub mod shapes;
pub mod signals;
pub mod signatures;
mod utils;

pub use cube::{ImageCube, SpectralImage};
pub use error::{Error, Result};
pub use extract::{get_signatures_from_pixels, get_signatures_within_convex_hull};
pub use pixels::{PixelCoordinate, Pixels};
pub use shapes::{GeometricShapes, Shape, ShapeKind};
pub use signals::Signals;
pub use signatures::Signatures;
