use std::{path::PathBuf, process::exit};
use clap::Parser;
use log::error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Extraction {
    Signatures,
    Pixels,
}

impl std::str::FromStr for Extraction {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signatures" => Ok(Extraction::Signatures),
            "pixels" => Ok(Extraction::Pixels),
            _ => Err(format!("{} is not a valid extraction", s)),
        }
    }
}

#[derive(Debug, Parser, Clone)]
pub struct Args {
    /// Extraction to run :
    /// "signatures" pairs every covered pixel with its spectral vector,
    /// "pixels" only enumerates the covered pixel coordinates on a grid of step --resolution
    pub extraction: Extraction,
    /// Input geometry file (.geojson), one shape per feature
    pub geometry: PathBuf,
    /// Input image file
    pub image: PathBuf,
    /// Output file (.parquet, or .ipc/.arrow for Arrow IPC)
    pub output: PathBuf,
    /// Overwrite :
    /// if specified, will overwrite the output file if it already exists
    #[clap(short, long)]
    pub overwrite: bool,
    /// Resolution :
    /// grid step used by the "pixels" extraction
    #[clap(short, long, default_value = "1.0")]
    pub resolution: f64,
    /// Thread count :
    /// the number of threads used by rayon
    /// if not specified, rayon will use the number of cores available on the machine
    #[clap(short, long)]
    pub thread_count: Option<usize>,
    /// verbose :
    /// if specified, will print more information
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn handle_verbose(&self) {
        if !self.verbose {
            return;
        }
        println!("Called Args :");
        println!("{:#?}", self);
        log::set_max_level(log::LevelFilter::Debug);
    }

    pub fn handle_thread_count(&self) {
        if let Some(thread_count) = self.thread_count {
            if let Err(err) = rayon::ThreadPoolBuilder::new()
                .num_threads(thread_count)
                .build_global()
            {
                error!("Couldn't configure the thread pool : {}", err);
                exit(1);
            }
        }
    }

    pub fn validate_paths(&self) {
        if !self.geometry.exists() {
            error!("Geometry file does not exist : {:?}", self.geometry);
            exit(1);
        }
        if !self.image.exists() {
            error!("Image file does not exist : {:?}", self.image);
            exit(1);
        }

        if self.output.exists() && !self.overwrite {
            error!("Output file already exists : {:?}\nUse --overwrite to overwrite it", self.output);
            exit(1);
        }
    }

    pub fn validate_resolution(&self) {
        if !(self.resolution > 0.0) {
            error!("Resolution must be strictly positive : {}", self.resolution);
            exit(1);
        }
    }
}

lazy_static::lazy_static! {
    pub static ref ARGS: Args = Args::parse();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arguments() {
        let args = Args::parse_from([
            "spectral-extract",
            "pixels",
            "rois.geojson",
            "scene.png",
            "out.parquet",
            "--resolution",
            "2.5",
            "-v",
        ]);
        assert_eq!(args.extraction, Extraction::Pixels);
        assert_eq!(args.resolution, 2.5);
        assert!(args.verbose);
        assert!(!args.overwrite);
    }

    #[test]
    fn rejects_unknown_extraction() {
        assert!(Args::try_parse_from(["spectral-extract", "glcm", "a", "b", "c"]).is_err());
    }
}
