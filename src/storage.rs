use crate::gesture_model::GestureModel;
use crate::hmm::HiddenMarkovModel;
use crate::quantizer::Quantizer;
use crate::types::{NUM_OBSERVATIONS, NUM_STATES};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Fallos de carga/guardado de modelos. El lector distingue "no existe"
/// de "existe pero está corrupto" de "las dimensiones no cuadran":
/// nunca devuelve un modelo a medias con parámetros a cero.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("model file not found: {0:?}")]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt model file: {0}")]
    Corrupt(String),

    #[error("dimension mismatch: stored {stored_states}x{stored_observations}, expected {expected_states}x{expected_observations}")]
    DimensionMismatch {
        stored_states: usize,
        stored_observations: usize,
        expected_states: usize,
        expected_observations: usize,
    },

    #[error("no trained model with id {0}")]
    UnknownModel(usize),
}

/// Guarda un modelo en texto plano, un modelo por archivo. Vectores
/// separados por comas con marcadores de sección comentados: simple y
/// legible, sin formatos anidados para matrices grandes.
pub fn save_model(model: &GestureModel, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let mut out = String::new();
    let num_states = model.num_states();
    let num_observations = model.num_observations();

    out.push_str("# numStates:\n");
    let _ = writeln!(out, "{num_states}");
    out.push_str("# numObservations:\n");
    let _ = writeln!(out, "{num_observations}");
    out.push_str("# defaultProbability:\n");
    let _ = writeln!(out, "{}", model.default_probability());

    out.push_str("# Quantizer: Radius\n");
    let _ = writeln!(out, "{}", model.quantizer().radius());
    out.push_str("# Quantizer: MAP\n");
    for reference in model.quantizer().map() {
        let _ = writeln!(out, "{}, {}, {}", reference[0], reference[1], reference[2]);
    }

    out.push_str("# HMM: PI\n");
    let _ = writeln!(out, "{}", join_row(model.hmm().pi()));

    out.push_str("# HMM: A\n");
    for row in model.hmm().a() {
        let _ = writeln!(out, "{}", join_row(row));
    }

    out.push_str("# HMM: B\n");
    for row in model.hmm().b() {
        let _ = writeln!(out, "{}", join_row(row));
    }

    out.push_str("# END\n");

    std::fs::write(path, out)?;
    Ok(())
}

/// Lee un modelo guardado por `save_model`. Las líneas que empiezan por
/// `#` son marcadores y se saltan; los datos son posicionales.
pub fn load_model(path: impl AsRef<Path>) -> Result<GestureModel, StorageError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|error| {
        if error.kind() == ErrorKind::NotFound {
            StorageError::NotFound(path.to_path_buf())
        } else {
            StorageError::Io(error)
        }
    })?;

    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));
    let mut next_line = |section: &str| {
        lines
            .next()
            .ok_or_else(|| StorageError::Corrupt(format!("missing data in section {section}")))
    };

    let num_states: usize = parse_value(next_line("numStates")?, "numStates")?;
    let num_observations: usize =
        parse_value(next_line("numObservations")?, "numObservations")?;

    if num_states != NUM_STATES || num_observations != NUM_OBSERVATIONS {
        return Err(StorageError::DimensionMismatch {
            stored_states: num_states,
            stored_observations: num_observations,
            expected_states: NUM_STATES,
            expected_observations: NUM_OBSERVATIONS,
        });
    }

    let default_probability: f64 =
        parse_value(next_line("defaultProbability")?, "defaultProbability")?;
    let radius: f64 = parse_value(next_line("Quantizer: Radius")?, "Quantizer radius")?;

    let mut map = Vec::with_capacity(num_observations);
    for index in 0..num_observations {
        let row = parse_row(next_line("Quantizer: MAP")?, &format!("map[{index}]"))?;
        if row.len() != 3 {
            return Err(StorageError::Corrupt(format!(
                "map[{index}] has {} components, expected 3",
                row.len()
            )));
        }
        map.push([row[0], row[1], row[2]]);
    }

    let pi = parse_row(next_line("HMM: PI")?, "pi")?;
    if pi.len() != num_states {
        return Err(StorageError::Corrupt(format!(
            "pi has {} entries, expected {num_states}",
            pi.len()
        )));
    }

    let mut a = Vec::with_capacity(num_states);
    for index in 0..num_states {
        let row = parse_row(next_line("HMM: A")?, &format!("a[{index}]"))?;
        if row.len() != num_states {
            return Err(StorageError::Corrupt(format!(
                "a[{index}] has {} entries, expected {num_states}",
                row.len()
            )));
        }
        a.push(row);
    }

    let mut b = Vec::with_capacity(num_states);
    for index in 0..num_states {
        let row = parse_row(next_line("HMM: B")?, &format!("b[{index}]"))?;
        if row.len() != num_observations {
            return Err(StorageError::Corrupt(format!(
                "b[{index}] has {} entries, expected {num_observations}",
                row.len()
            )));
        }
        b.push(row);
    }

    let mut quantizer = Quantizer::new(num_states);
    quantizer.restore(map, radius);

    let mut hmm = HiddenMarkovModel::new(num_states, num_observations);
    hmm.restore(pi, a, b);

    Ok(GestureModel::from_parts(quantizer, hmm, default_probability))
}

fn join_row(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_value<T: std::str::FromStr>(line: &str, what: &str) -> Result<T, StorageError> {
    line.parse()
        .map_err(|_| StorageError::Corrupt(format!("invalid {what}: {line:?}")))
}

fn parse_row(line: &str, what: &str) -> Result<Vec<f64>, StorageError> {
    line.split(',')
        .map(|field| {
            field
                .trim()
                .parse::<f64>()
                .map_err(|_| StorageError::Corrupt(format!("invalid number in {what}: {line:?}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::Gesture;

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gestoscopio_{}_{}", std::process::id(), name));
        path
    }

    fn trained_model() -> GestureModel {
        let mut corpus = Vec::new();
        for seed in [0.0, 0.3, 0.6] {
            let mut gesture = Gesture::new();
            for i in 0..18 {
                let phase = seed + i as f64 * 0.4;
                gesture.add_vector([2.0 * phase.cos(), 2.0 * phase.sin(), 0.3]);
            }
            corpus.push(gesture);
        }
        let mut model = GestureModel::new();
        model.train(&corpus).unwrap();
        model
    }

    #[test]
    fn round_trip_preserves_every_parameter() {
        let model = trained_model();
        let path = temp_path("roundtrip.txt");

        save_model(&model, &path).unwrap();
        let loaded = load_model(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.num_states(), model.num_states());
        assert_eq!(loaded.num_observations(), model.num_observations());
        // el texto usa la representación de ida y vuelta exacta de f64,
        // así que la comparación puede ser bit a bit
        assert_eq!(loaded.default_probability(), model.default_probability());
        assert_eq!(loaded.quantizer().radius(), model.quantizer().radius());
        assert_eq!(loaded.quantizer().map(), model.quantizer().map());
        assert_eq!(loaded.hmm().pi(), model.hmm().pi());
        assert_eq!(loaded.hmm().a(), model.hmm().a());
        assert_eq!(loaded.hmm().b(), model.hmm().b());
    }

    #[test]
    fn missing_file_is_not_found() {
        let result = load_model(temp_path("no_existe.txt"));
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let path = temp_path("truncado.txt");
        std::fs::write(&path, "# numStates:\n8\n# numObservations:\n14\n").unwrap();

        let result = load_model(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn garbage_number_is_corrupt() {
        let path = temp_path("basura.txt");
        std::fs::write(&path, "# numStates:\nocho\n").unwrap();

        let result = load_model(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn wrong_dimensions_are_rejected() {
        let path = temp_path("dimensiones.txt");
        std::fs::write(&path, "# numStates:\n5\n# numObservations:\n14\n0.5\n").unwrap();

        let result = load_model(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(StorageError::DimensionMismatch {
                stored_states: 5,
                ..
            })
        ));
    }
}
