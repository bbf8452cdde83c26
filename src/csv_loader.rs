use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use csv::ReaderBuilder;

use crate::types::AccelVector;

/// Carga una traza de aceleración desde un CSV en el formato
/// `sample,ax,ay,az`, ordenada por índice de muestra.
pub fn load_samples_from_csv(path: impl AsRef<Path>) -> Result<Vec<AccelVector>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("No se pudo abrir el CSV {:?}", path))?;

    let mut samples: BTreeMap<usize, AccelVector> = BTreeMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record =
            result.with_context(|| format!("Fila {} inválida en {:?}", row_idx + 1, path))?;
        if record.len() < 4 {
            bail!("La fila {} no tiene 4 columnas", row_idx + 1);
        }

        let sample: usize = record[0]
            .parse()
            .with_context(|| format!("sample inválido en fila {}", row_idx + 1))?;
        let ax: f64 = record[1]
            .parse()
            .with_context(|| format!("ax inválido en fila {}", row_idx + 1))?;
        let ay: f64 = record[2]
            .parse()
            .with_context(|| format!("ay inválido en fila {}", row_idx + 1))?;
        let az: f64 = record[3]
            .parse()
            .with_context(|| format!("az inválido en fila {}", row_idx + 1))?;

        samples.insert(sample, [ax, ay, az]);
    }

    if samples.is_empty() {
        return Err(anyhow!("El CSV {:?} no contiene datos", path));
    }

    Ok(samples.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_csv(name: &str, content: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("gestoscopio_csv_{}_{}", std::process::id(), name));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_samples_in_index_order() {
        let path = temp_csv(
            "orden.csv",
            "sample,ax,ay,az\n1,0.4,0.5,0.6\n0,0.1,0.2,0.3\n2,0.7,0.8,0.9\n",
        );
        let samples = load_samples_from_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], [0.1, 0.2, 0.3]);
        assert_eq!(samples[2], [0.7, 0.8, 0.9]);
    }

    #[test]
    fn empty_file_is_an_error() {
        let path = temp_csv("vacio.csv", "sample,ax,ay,az\n");
        let result = load_samples_from_csv(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn short_row_is_an_error() {
        let path = temp_csv("corto.csv", "sample,ax,ay,az\n0,0.1,0.2\n");
        let result = load_samples_from_csv(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
