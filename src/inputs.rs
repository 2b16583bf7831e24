//! One-time loading of the case directory inputs.
//!
//! A case directory holds two files: the station locations (one `x,y` pair
//! per line) and the observed displacement vector (whitespace separated
//! floats, three components per station). Both are loaded exactly once
//! during model initialization; any failure aborts initialization with no
//! partial state.

use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Read};
use std::path::Path;

use crate::model::ModelError;

/// An observation location on the surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Station {
    pub x: f64,
    pub y: f64,
}

/// The in-memory inputs of one case.
#[derive(Clone, Debug)]
pub struct Inputs {
    pub stations: Vec<Station>,
    pub displacements: Vec<f64>,
}

pub(crate) fn load_inputs(
    case: &Path,
    stations_file: &str,
    displacements_file: &str,
    observations: usize,
) -> Result<Inputs, ModelError> {
    if !case.is_dir() {
        log::error!("bad case name: '{}'", case.display());
        return Err(ModelError::CaseNotFound {
            case: case.to_path_buf(),
        });
    }

    let stations = load_stations(case, stations_file)?;
    let displacements = load_displacements(case, displacements_file)?;

    if displacements.len() != observations {
        return Err(ModelError::ShapeMismatch {
            file: displacements_file.to_string(),
            expected: observations,
            actual: displacements.len(),
        });
    }
    if observations != 3 * stations.len() {
        return Err(ModelError::ObservationCount {
            stations: stations.len(),
            observations,
        });
    }

    Ok(Inputs {
        stations,
        displacements,
    })
}

fn load_stations(case: &Path, file: &str) -> Result<Vec<Station>, ModelError> {
    let stream = match File::open(case.join(file)) {
        Ok(stream) => stream,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::error!(
                "missing station locations: no '{file}' in '{}'",
                case.display()
            );
            return Err(ModelError::MissingStations {
                file: file.to_string(),
                case: case.to_path_buf(),
            });
        }
        Err(err) => return Err(io_error(file, case, err)),
    };

    let mut stations = Vec::new();
    for (number, line) in BufReader::new(stream).lines().enumerate() {
        let line = line.map_err(|err| io_error(file, case, err))?;
        let record = line.trim();
        if record.is_empty() {
            continue;
        }
        let malformed = || ModelError::MalformedStations {
            file: file.to_string(),
            line: number + 1,
        };
        let (x, y) = record.split_once(',').ok_or_else(malformed)?;
        let x = x.trim().parse().map_err(|_| malformed())?;
        let y = y.trim().parse().map_err(|_| malformed())?;
        stations.push(Station { x, y });
    }
    Ok(stations)
}

fn load_displacements(case: &Path, file: &str) -> Result<Vec<f64>, ModelError> {
    let mut stream = match File::open(case.join(file)) {
        Ok(stream) => stream,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            log::error!("missing displacements: no '{file}' in '{}'", case.display());
            return Err(ModelError::MissingDisplacements {
                file: file.to_string(),
                case: case.to_path_buf(),
            });
        }
        Err(err) => return Err(io_error(file, case, err)),
    };

    let mut contents = String::new();
    stream
        .read_to_string(&mut contents)
        .map_err(|err| io_error(file, case, err))?;

    contents
        .split_whitespace()
        .map(|value| value.parse())
        .collect::<Result<Vec<f64>, _>>()
        .map_err(|_| ModelError::MalformedDisplacements {
            file: file.to_string(),
        })
}

fn io_error(file: &str, case: &Path, source: std::io::Error) -> ModelError {
    ModelError::Io {
        file: file.to_string(),
        case: case.to_path_buf(),
        source,
    }
}
