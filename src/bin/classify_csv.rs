//! Clasifica una captura CSV contra uno o más modelos guardados.
//!
//! Uso: classify_csv <gesto.csv> <modelo1.txt> [modelo2.txt ...]
//!
//! Devuelve código de salida 0 si algún modelo reconoce el gesto y 1 si
//! ninguno coincide.

use anyhow::{bail, Result};
use std::env;
use std::sync::{Arc, Mutex};

use gestoscopio::config::{ButtonConfig, FilterParams};
use gestoscopio::csv_loader::load_samples_from_csv;
use gestoscopio::session::{GestureSession, RecognitionEvent};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        bail!("Uso: {} <gesto.csv> <modelo1.txt> [modelo2.txt ...]", args[0]);
    }

    let buttons = ButtonConfig::default();
    let mut session = GestureSession::new(buttons, FilterParams::default());

    for model_path in &args[2..] {
        let id = session.load_model(model_path)?;
        println!("📦 Modelo {} cargado desde {}", id, model_path);
    }

    let outcome: Arc<Mutex<Option<RecognitionEvent>>> = Arc::new(Mutex::new(None));
    let outcome_clone = Arc::clone(&outcome);
    session.set_gesture_callback(move |event| {
        *outcome_clone.lock().unwrap() = Some(event);
    });

    let samples = load_samples_from_csv(&args[1])?;
    println!("📄 {}: {} muestras\n", args[1], samples.len());

    session.button_pressed(buttons.recognize);
    for vector in samples {
        session.acceleration(vector);
    }
    session.button_released(buttons.recognize);

    let result = *outcome.lock().unwrap();
    match result {
        Some(event) if event.valid => {
            println!(
                "🎯 Clase {} (posterior {:.2}%)",
                event.class_id,
                event.probability * 100.0
            );
            Ok(())
        }
        _ => {
            println!("⚠️  Ningún modelo coincide con el gesto");
            std::process::exit(1);
        }
    }
}
