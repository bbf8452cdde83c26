use crate::classifier::Classifier;
use crate::config::{ButtonConfig, FilterParams};
use crate::filter::{FilterChain, MotionTransition};
use crate::gesture::Gesture;
use crate::gesture_model::GestureModel;
use crate::storage::{self, StorageError};
use crate::types::AccelVector;
use std::path::Path;
use std::time::{Duration, Instant};

/// Estados de la máquina de la sesión
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Esperando una orden de botón
    Idle,
    /// Grabando un gesto para el corpus de entrenamiento
    Learning,
    /// Grabando un gesto para clasificarlo
    Analyzing,
}

/// Señal externa que consume la sesión. Quien hable con el hardware
/// debe serializarlas en un solo consumidor: el estado de los filtros y
/// de la sesión no admite mutación concurrente.
#[derive(Debug, Clone, Copy)]
pub enum DeviceEvent {
    Acceleration(AccelVector),
    ButtonPressed(u16),
    ButtonReleased(u16),
}

/// Resultado de reconocimiento que se emite al soltar el botón de
/// reconocer: o una clase con su posterior, o "sin coincidencia".
#[derive(Debug, Clone, Copy)]
pub struct RecognitionEvent {
    pub valid: bool,
    pub class_id: usize,
    pub probability: f64,
}

type GestureCallback = Box<dyn FnMut(RecognitionEvent) + Send>;
type MotionCallback = Box<dyn FnMut(MotionTransition) + Send>;

/// La sesión de reconocimiento: posee la cadena de filtros, el buffer
/// del gesto en curso, el corpus de entrenamiento y el clasificador, y
/// gobierna las transiciones Idle/Learning/Analyzing a golpe de botón.
pub struct GestureSession {
    state: SessionState,
    buttons: ButtonConfig,
    chain: FilterChain,
    current: Gesture,
    corpus: Vec<Gesture>,
    classifier: Classifier,
    on_gesture: Option<GestureCallback>,
    on_motion: Option<MotionCallback>,
}

impl GestureSession {
    pub fn new(buttons: ButtonConfig, filters: FilterParams) -> Self {
        Self {
            state: SessionState::Idle,
            buttons,
            chain: FilterChain::with_default_filters(
                filters.idle_sensitivity,
                filters.directional_sensitivity,
                Duration::from_millis(filters.motion_change_ms),
            ),
            current: Gesture::new(),
            corpus: Vec::new(),
            classifier: Classifier::new(),
            on_gesture: None,
            on_motion: None,
        }
    }

    /// Callback de resultado de reconocimiento.
    pub fn set_gesture_callback<F>(&mut self, callback: F)
    where
        F: FnMut(RecognitionEvent) + Send + 'static,
    {
        self.on_gesture = Some(Box::new(callback));
    }

    /// Callback de inicio/fin de movimiento. Informativo: en esta
    /// política las transiciones de movimiento no arrancan ni paran
    /// grabaciones (el gancho queda para políticas alternativas).
    pub fn set_motion_callback<F>(&mut self, callback: F)
    where
        F: FnMut(MotionTransition) + Send + 'static,
    {
        self.on_motion = Some(Box::new(callback));
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    /// Punto de entrada único para las señales del dispositivo.
    pub fn process_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Acceleration(vector) => self.acceleration(vector),
            DeviceEvent::ButtonPressed(code) => self.button_pressed(code),
            DeviceEvent::ButtonReleased(code) => self.button_released(code),
        }
    }

    pub fn acceleration(&mut self, vector: AccelVector) {
        self.acceleration_at(vector, Instant::now());
    }

    /// Variante con reloj inyectado, para poder probar los filtros
    /// temporales sin esperas reales.
    pub fn acceleration_at(&mut self, vector: AccelVector, now: Instant) {
        // los filtros corren siempre, también en Idle: el detector de
        // movimiento necesita ver pasar el tiempo
        let accepted = self.chain.process(vector, now);

        while let Some(transition) = self.chain.poll_transition() {
            if let Some(callback) = self.on_motion.as_mut() {
                callback(transition);
            }
        }

        if let Some(vector) = accepted {
            if matches!(self.state, SessionState::Learning | SessionState::Analyzing) {
                self.current.add_vector(vector);
            }
        }
    }

    pub fn button_pressed(&mut self, code: u16) {
        // exclusión mutua: con una grabación en marcha se ignoran los
        // botones hasta volver a Idle
        if self.state != SessionState::Idle {
            return;
        }

        if code == self.buttons.train {
            println!("[SESION] Grabando gesto de entrenamiento...");
            self.start_recording(SessionState::Learning);
        } else if code == self.buttons.recognize {
            println!("[SESION] Grabando gesto para reconocer...");
            self.start_recording(SessionState::Analyzing);
        } else if code == self.buttons.close_gesture {
            self.close_gesture();
        }
    }

    pub fn button_released(&mut self, code: u16) {
        match self.state {
            SessionState::Learning if code == self.buttons.train => self.finish_learning(),
            SessionState::Analyzing if code == self.buttons.recognize => self.finish_analyzing(),
            _ => {}
        }
    }

    fn start_recording(&mut self, state: SessionState) {
        self.current = Gesture::new();
        self.chain.reset_all();
        self.state = state;
    }

    fn finish_learning(&mut self) {
        self.state = SessionState::Idle;
        if self.current.is_empty() {
            println!("[SESION] Grabación vacía, no se añade al corpus");
            return;
        }
        let gesture = std::mem::take(&mut self.current);
        println!(
            "[SESION] Gesto grabado con {} muestras ({} en el corpus)",
            gesture.len(),
            self.corpus.len() + 1
        );
        self.corpus.push(gesture);
    }

    fn finish_analyzing(&mut self) {
        self.state = SessionState::Idle;
        if self.current.is_empty() {
            println!("[SESION] Grabación vacía, nada que reconocer");
            return;
        }
        let gesture = std::mem::take(&mut self.current);

        let event = match self.classifier.classify_gesture(&gesture) {
            Some(class_id) => RecognitionEvent {
                valid: true,
                class_id,
                probability: self.classifier.last_probability(),
            },
            None => RecognitionEvent {
                valid: false,
                class_id: 0,
                probability: 0.0,
            },
        };

        if event.valid {
            println!(
                "[SESION] Gesto {} reconocido (posterior {:.6})",
                event.class_id, event.probability
            );
        } else {
            println!("[SESION] Sin coincidencia");
        }

        if let Some(callback) = self.on_gesture.as_mut() {
            callback(event);
        }
    }

    /// Entrena una clase nueva con todo el corpus acumulado y la añade
    /// al clasificador. Con el corpus vacío no hay nada que hacer.
    fn close_gesture(&mut self) {
        if self.corpus.is_empty() {
            println!("[SESION] Corpus vacío: graba algún gesto antes de cerrar");
            return;
        }

        println!(
            "[SESION] Entrenando clase {} con {} gestos...",
            self.classifier.count(),
            self.corpus.len()
        );

        let mut model = GestureModel::new();
        match model.train(&self.corpus) {
            Ok(outcome) => {
                if !outcome.is_clean() {
                    eprintln!(
                        "[SESION] Entrenamiento con degeneración: {} filas retenidas, {} secuencias descartadas",
                        outcome.retained_rows, outcome.skipped_sequences
                    );
                }
                self.classifier.add_gesture_model(model);
                self.corpus.clear();
                println!("[SESION] Clase lista ({} en total)", self.classifier.count());
            }
            Err(error) => {
                eprintln!("[SESION] Error entrenando la clase: {error}");
            }
        }
    }

    /// Carga un modelo guardado y lo añade al clasificador.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<usize, StorageError> {
        let model = storage::load_model(path)?;
        self.classifier.add_gesture_model(model);
        Ok(self.classifier.count() - 1)
    }

    /// Guarda el modelo `id` en disco.
    pub fn save_model(&self, id: usize, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let model = self
            .classifier
            .model(id)
            .ok_or(StorageError::UnknownModel(id))?;
        storage::save_model(model, path)
    }

    /// Olvida todas las clases entrenadas.
    pub fn reset_models(&mut self) {
        self.classifier.clear();
        println!("[SESION] Modelos borrados");
    }
}
