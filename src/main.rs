mod args;

use std::process::exit;

use log::{error, info, LevelFilter};
use polars::prelude::*;
use rayon::prelude::*;
use spectral_signatures::{geojson, get_signatures_within_convex_hull, io, ImageCube, Shape};

use crate::args::{Extraction, ARGS};

fn init_logger(verbose: bool) {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(if verbose { LevelFilter::Debug } else { LevelFilter::Info });
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

/**
Prefix a per component table with the shape label and the component index.
 */
fn labeled(label: &str, component: usize, df: DataFrame) -> spectral_signatures::Result<DataFrame> {
    let height = df.height();
    let mut columns = vec![
        Series::new("label", vec![label.to_string(); height]),
        Series::new("component", vec![component as u32; height]),
    ];
    columns.extend(df.get_columns().iter().cloned());
    Ok(DataFrame::new(columns)?)
}

fn shape_table(image: &ImageCube, shape: &Shape) -> spectral_signatures::Result<Vec<DataFrame>> {
    match ARGS.extraction {
        Extraction::Signatures => get_signatures_within_convex_hull(image, shape)?
            .iter()
            .enumerate()
            .map(|(i, signatures)| labeled(shape.label(), i, signatures.to_dataframe()?))
            .collect(),
        Extraction::Pixels => shape
            .get_pixels_within_convex_hull(ARGS.resolution)?
            .iter()
            .enumerate()
            .map(|(i, pixels)| labeled(shape.label(), i, pixels.to_dataframe()?))
            .collect(),
    }
}

fn main() {
    init_logger(ARGS.verbose);
    ARGS.handle_verbose();
    ARGS.validate_paths();
    ARGS.validate_resolution();
    ARGS.handle_thread_count();

    let mut image = match ImageCube::open(&ARGS.image) {
        Ok(ok) => ok,
        Err(err) => {
            error!("Couldn't open image : {}", err);
            exit(1);
        }
    };

    let shapes = match geojson::read_shapes(&ARGS.geometry) {
        Ok(ok) => ok,
        Err(err) => {
            error!("Couldn't load shapes : {}", err);
            exit(1);
        }
    };
    if let Err(err) = image.geometric_shapes_mut().extend(shapes) {
        error!("Couldn't attach shapes to the image : {}", err);
        exit(1);
    }
    info!("Extracting {} shapes from {:?}", image.geometric_shapes().len(), ARGS.image);

    let shapes = image.geometric_shapes().shapes();
    let tables = shapes
        .par_iter()
        .map(|shape| shape_table(&image, shape))
        .collect::<spectral_signatures::Result<Vec<_>>>();
    let tables = match tables {
        Ok(ok) => ok,
        Err(err) => {
            error!("Extraction failed : {}", err);
            exit(1);
        }
    };

    let mut frames = tables.into_iter().flatten();
    let Some(mut output) = frames.next() else {
        error!("No shape found in {:?}", ARGS.geometry);
        exit(1);
    };
    for df in frames {
        if let Err(err) = output.vstack_mut(&df) {
            error!("Couldn't merge tables : {}", err);
            exit(1);
        }
    }

    info!("Writing {} rows to {:?}", output.height(), ARGS.output);
    if let Err(err) = io::write_table(&ARGS.output, &mut output) {
        error!("Couldn't write output : {}", err);
        exit(1);
    }
}
