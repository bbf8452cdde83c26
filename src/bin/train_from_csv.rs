//! Entrena una clase de gesto desde capturas CSV y guarda el modelo.
//!
//! Uso: train_from_csv <modelo_salida.txt> <gesto1.csv> <gesto2.csv> ...
//!
//! Cada CSV es una ejecución del mismo gesto en formato sample,ax,ay,az.
//! Las muestras pasan por la misma sesión (filtros incluidos) que usa el
//! demonio, sintetizando las pulsaciones de botón.

use anyhow::{bail, Result};
use std::env;

use gestoscopio::config::{ButtonConfig, FilterParams};
use gestoscopio::csv_loader::load_samples_from_csv;
use gestoscopio::session::GestureSession;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!(
            "Uso: {} <modelo_salida.txt> <gesto1.csv> [gesto2.csv ...]",
            args[0]
        );
    }

    let model_path = &args[1];
    let buttons = ButtonConfig::default();
    let mut session = GestureSession::new(buttons, FilterParams::default());

    for csv_path in &args[2..] {
        let samples = load_samples_from_csv(csv_path)?;
        println!("📄 {}: {} muestras", csv_path, samples.len());

        session.button_pressed(buttons.train);
        for vector in samples {
            session.acceleration(vector);
        }
        session.button_released(buttons.train);
    }

    if session.corpus_len() == 0 {
        bail!("Ningún gesto sobrevivió a los filtros: nada que entrenar");
    }

    session.button_pressed(buttons.close_gesture);
    let Some(model) = session.classifier().model(0) else {
        bail!("El entrenamiento no produjo ningún modelo");
    };

    println!(
        "📊 Probabilidad a priori del modelo: {:.6e}",
        model.default_probability()
    );

    session.save_model(0, model_path)?;
    println!("💾 Modelo guardado en {}", model_path);

    Ok(())
}
