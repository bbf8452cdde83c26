/*
Gestoscopio - Reconocimiento de gestos por aceleración en Rust puro

Demonio interactivo que:
1. Reproduce una captura CSV (sample,ax,ay,az) como fuente de aceleración
2. Mapea tres teclas del teclado a los botones Entrenar / Reconocer / Cerrar
3. Graba gestos mientras la tecla está pulsada y entrena/clasifica al soltar

Uso:
    ./target/release/gestoscopio [config.json]

Teclas por defecto (configurables en el JSON):
    T (mantener) → grabar gesto de entrenamiento
    R (mantener) → grabar gesto y reconocerlo
    C            → cerrar clase: entrenar modelo con el corpus grabado
    G            → guardar los modelos entrenados en modelos/
    Q            → salir

Para leer el teclado global hace falta permiso sobre /dev/input:
    sg input -c './target/debug/gestoscopio'
*/

use anyhow::Result;
use crossbeam_channel::{bounded, select, unbounded};
use std::env;
use std::thread;
use std::time::Duration;

use gestoscopio::config::{load_config, DaemonConfig};
use gestoscopio::csv_loader::load_samples_from_csv;
use gestoscopio::filter::MotionTransition;
use gestoscopio::session::{DeviceEvent, GestureSession};
use gestoscopio::types::SAMPLING_RATE;

/// Órdenes del teclado que no son botones de la sesión
enum Command {
    SaveModels,
    Quit,
}

fn main() -> Result<()> {
    println!("🎯 Gestoscopio - Reconocimiento de gestos por aceleración\n");

    let args: Vec<String> = env::args().collect();
    let config = if args.len() > 1 {
        println!("🔧 Configuración: {}", args[1]);
        load_config(&args[1])?
    } else {
        println!("🔧 Configuración por defecto");
        DaemonConfig::default()
    };

    let capture = config
        .capture
        .clone()
        .unwrap_or_else(|| "capturas/sesion.csv".to_string());

    // Canal serializado hacia la sesión: los filtros y la máquina de
    // estados no admiten mutación concurrente, así que todo productor
    // pasa por aquí
    let (tx_events, rx_events) = bounded::<DeviceEvent>(100);
    let (tx_commands, rx_commands) = unbounded::<Command>();

    // Hilo de replay: reproduce la captura en tiempo real, en bucle
    let replay_samples = load_samples_from_csv(&capture)?;
    println!(
        "📄 Captura: {} ({} muestras a {} Hz)\n",
        capture,
        replay_samples.len(),
        SAMPLING_RATE
    );
    let tx_accel = tx_events.clone();
    thread::spawn(move || {
        let interval = Duration::from_secs_f64(1.0 / SAMPLING_RATE);
        loop {
            for &vector in &replay_samples {
                if tx_accel.send(DeviceEvent::Acceleration(vector)).is_err() {
                    return;
                }
                thread::sleep(interval);
            }
        }
    });

    // Hilo de teclado: botones de sesión y órdenes de control
    let buttons = config.buttons;
    thread::spawn(move || {
        if let Err(e) = keyboard_loop(tx_events, tx_commands, buttons) {
            eprintln!("❌ Error leyendo el teclado: {}", e);
        }
    });

    let mut session = GestureSession::new(config.buttons, config.filters);
    session.set_motion_callback(|transition| match transition {
        MotionTransition::Started => println!("🏃 Movimiento detectado"),
        MotionTransition::Stopped => println!("🧘 Reposo"),
    });
    session.set_gesture_callback(|event| {
        if event.valid {
            println!(
                "🎯 Gesto reconocido: clase {} (posterior {:.2}%)",
                event.class_id,
                event.probability * 100.0
            );
        } else {
            println!("⚠️  Ningún gesto coincide");
        }
    });

    println!("✅ Sistema listo\n");
    println!("  T (mantener) → entrenar   R (mantener) → reconocer");
    println!("  C → cerrar clase   G → guardar modelos   Q → salir\n");

    loop {
        select! {
            recv(rx_events) -> event => {
                match event {
                    Ok(event) => session.process_event(event),
                    Err(_) => break,
                }
            }
            recv(rx_commands) -> command => {
                match command {
                    Ok(Command::SaveModels) => save_models(&session),
                    Ok(Command::Quit) | Err(_) => break,
                }
            }
        }
    }

    println!("\n👋 Saliendo...");
    Ok(())
}

/// Busca un teclado en /dev/input y traduce sus teclas a eventos de
/// botón de la sesión u órdenes de control.
fn keyboard_loop(
    tx_events: crossbeam_channel::Sender<DeviceEvent>,
    tx_commands: crossbeam_channel::Sender<Command>,
    buttons: gestoscopio::config::ButtonConfig,
) -> Result<()> {
    use evdev::{Device, InputEventKind, Key};
    use std::fs;

    println!("🔍 Buscando teclado...");

    let mut keyboard_device: Option<Device> = None;
    for entry in fs::read_dir("/dev/input")? {
        let Ok(entry) = entry else { continue };
        let path = entry.path();
        let Some(name) = path.file_name() else { continue };
        if !name.to_string_lossy().starts_with("event") {
            continue;
        }
        if let Ok(device) = Device::open(&path) {
            if let Some(dev_name) = device.name() {
                let dev_name_lc = dev_name.to_lowercase();
                if dev_name_lc.contains("keyboard") || dev_name_lc.contains("at translated") {
                    println!("✅ Teclado encontrado: {} ({})", dev_name, path.display());
                    keyboard_device = Some(device);
                    break;
                }
            }
        }
    }

    let mut device = keyboard_device.ok_or_else(|| {
        anyhow::anyhow!("No se encontró ningún dispositivo de teclado en /dev/input")
    })?;

    loop {
        for ev in device.fetch_events()? {
            let InputEventKind::Key(key) = ev.kind() else {
                continue;
            };

            // 1 = pulsación, 0 = suelta; el autorepeat (2) se ignora
            match ev.value() {
                1 => {
                    if key == Key::KEY_Q {
                        let _ = tx_commands.send(Command::Quit);
                        return Ok(());
                    }
                    if key == Key::KEY_G {
                        let _ = tx_commands.send(Command::SaveModels);
                        continue;
                    }
                    if is_session_button(key.code(), buttons) {
                        let _ = tx_events.send(DeviceEvent::ButtonPressed(key.code()));
                    }
                }
                0 => {
                    if is_session_button(key.code(), buttons) {
                        let _ = tx_events.send(DeviceEvent::ButtonReleased(key.code()));
                    }
                }
                _ => {}
            }
        }

        thread::sleep(Duration::from_millis(10));
    }
}

fn is_session_button(code: u16, buttons: gestoscopio::config::ButtonConfig) -> bool {
    code == buttons.train || code == buttons.recognize || code == buttons.close_gesture
}

/// Vuelca todos los modelos entrenados a modelos/modelo_NN.txt
fn save_models(session: &GestureSession) {
    let count = session.classifier().count();
    if count == 0 {
        println!("⚠️  No hay modelos entrenados que guardar");
        return;
    }

    if let Err(e) = std::fs::create_dir_all("modelos") {
        eprintln!("❌ No se pudo crear el directorio modelos/: {}", e);
        return;
    }

    for id in 0..count {
        let path = format!("modelos/modelo_{:02}.txt", id);
        match session.save_model(id, &path) {
            Ok(()) => println!("💾 Modelo {} guardado en {}", id, path),
            Err(e) => eprintln!("❌ Error guardando el modelo {}: {}", id, e),
        }
    }
}
