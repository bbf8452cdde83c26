use crate::types::AccelVector;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Transición de movimiento detectada por un filtro dependiente del tiempo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionTransition {
    Started,
    Stopped,
}

/// Un filtro de la cadena de aceleración. Recibe un vector o "nada"
/// (suprimido por un filtro anterior) y produce un vector o "nada".
///
/// La implementación por defecto de `apply` corta en seco: si la entrada
/// ya fue suprimida no ejecuta la transformación. Un filtro que dependa
/// del reloj (y no solo del vector actual) debe sobreescribir `apply`
/// directamente para poder observar también el silencio.
pub trait AccelerationFilter {
    fn apply(&mut self, input: Option<AccelVector>, now: Instant) -> Option<AccelVector> {
        match input {
            Some(vector) => self.filter(vector, now),
            None => None,
        }
    }

    /// Transformación central del filtro. `None` suprime la muestra.
    fn filter(&mut self, vector: AccelVector, now: Instant) -> Option<AccelVector>;

    /// Restaura el estado interno a los valores iniciales.
    fn reset(&mut self);

    /// Transición pendiente, solo la reportan los filtros temporales.
    fn poll_transition(&mut self) -> Option<MotionTransition> {
        None
    }
}

/// Suprime las muestras en reposo: cuando solo actúa la gravedad la
/// magnitud queda cerca de 1g y el vector no aporta información.
pub struct IdleStateFilter {
    sensitivity: f64,
}

impl IdleStateFilter {
    pub fn new() -> Self {
        Self { sensitivity: 0.1 }
    }

    pub fn with_sensitivity(sensitivity: f64) -> Self {
        Self { sensitivity }
    }

    pub fn sensitivity(&self) -> f64 {
        self.sensitivity
    }
}

impl Default for IdleStateFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerationFilter for IdleStateFilter {
    fn filter(&mut self, vector: AccelVector, _now: Instant) -> Option<AccelVector> {
        let magnitude =
            (vector[0] * vector[0] + vector[1] * vector[1] + vector[2] * vector[2]).sqrt();

        // los valores exactamente en el borde de la banda pasan
        if magnitude >= 1.0 + self.sensitivity || magnitude <= 1.0 - self.sensitivity {
            Some(vector)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        // sin estado entre llamadas
    }
}

/// Observa si el dispositivo está en movimiento. No altera ni suprime
/// vectores: anota cuándo llegó la última muestra no suprimida y levanta
/// transiciones inicio/fin de movimiento en función del reloj, por lo
/// que debe ejecutarse también cuando la entrada viene suprimida.
pub struct MotionDetectFilter {
    motion_change_time: Duration,
    in_motion: bool,
    last_motion: Option<Instant>,
    pending: VecDeque<MotionTransition>,
}

impl MotionDetectFilter {
    pub fn new() -> Self {
        Self::with_motion_change_time(Duration::from_millis(190))
    }

    pub fn with_motion_change_time(motion_change_time: Duration) -> Self {
        Self {
            motion_change_time,
            in_motion: false,
            last_motion: None,
            pending: VecDeque::new(),
        }
    }

    pub fn in_motion(&self) -> bool {
        self.in_motion
    }
}

impl Default for MotionDetectFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerationFilter for MotionDetectFilter {
    // se sobreescribe el despacho exterior: el silencio también cuenta
    fn apply(&mut self, input: Option<AccelVector>, now: Instant) -> Option<AccelVector> {
        if self.in_motion {
            if let Some(last) = self.last_motion {
                if now.duration_since(last) >= self.motion_change_time {
                    self.in_motion = false;
                    self.pending.push_back(MotionTransition::Stopped);
                }
            }
        }

        if input.is_some() {
            self.last_motion = Some(now);
            if !self.in_motion {
                self.in_motion = true;
                self.pending.push_back(MotionTransition::Started);
            }
        }

        input
    }

    fn filter(&mut self, vector: AccelVector, now: Instant) -> Option<AccelVector> {
        self.apply(Some(vector), now)
    }

    fn reset(&mut self) {
        self.in_motion = false;
        self.last_motion = None;
        self.pending.clear();
    }

    fn poll_transition(&mut self) -> Option<MotionTransition> {
        self.pending.pop_front()
    }
}

/// Descarta vectores casi idénticos al último aceptado, para no llenar
/// el gesto de muestras redundantes.
pub struct DirectionalEquivalenceFilter {
    sensitivity: f64,
    reference: AccelVector,
}

impl DirectionalEquivalenceFilter {
    pub fn new() -> Self {
        Self::with_sensitivity(0.2)
    }

    pub fn with_sensitivity(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            reference: [0.0, 0.0, 0.0],
        }
    }

    pub fn reference(&self) -> AccelVector {
        self.reference
    }
}

impl Default for DirectionalEquivalenceFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerationFilter for DirectionalEquivalenceFilter {
    fn filter(&mut self, vector: AccelVector, _now: Instant) -> Option<AccelVector> {
        let outside_band = (0..3).any(|axis| {
            vector[axis] < self.reference[axis] - self.sensitivity
                || vector[axis] > self.reference[axis] + self.sensitivity
        });

        if outside_band {
            self.reference = vector;
            Some(vector)
        } else {
            None
        }
    }

    fn reset(&mut self) {
        self.reference = [0.0, 0.0, 0.0];
    }
}

/// Filtro exponencial de un polo que deja pasar los cambios lentos.
/// No forma parte de la cadena por defecto.
pub struct LowPassFilter {
    factor: f64,
    prev: AccelVector,
}

impl LowPassFilter {
    pub fn new() -> Self {
        Self::with_factor(0.01)
    }

    pub fn with_factor(factor: f64) -> Self {
        Self {
            factor,
            prev: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for LowPassFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerationFilter for LowPassFilter {
    fn filter(&mut self, vector: AccelVector, _now: Instant) -> Option<AccelVector> {
        let mut smoothed = [0.0; 3];
        for axis in 0..3 {
            smoothed[axis] = vector[axis] * self.factor + self.prev[axis] * (1.0 - self.factor);
        }
        self.prev = smoothed;
        Some(smoothed)
    }

    fn reset(&mut self) {
        self.prev = [0.0, 0.0, 0.0];
    }
}

/// Complementario del paso bajo: resta la componente lenta (p. ej. la
/// gravedad) y deja pasar los cambios bruscos. Tampoco está en la
/// cadena por defecto.
pub struct HighPassFilter {
    factor: f64,
    prev: AccelVector,
}

impl HighPassFilter {
    pub fn new() -> Self {
        Self::with_factor(0.1)
    }

    pub fn with_factor(factor: f64) -> Self {
        Self {
            factor,
            prev: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for HighPassFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl AccelerationFilter for HighPassFilter {
    fn filter(&mut self, vector: AccelVector, _now: Instant) -> Option<AccelVector> {
        let mut output = [0.0; 3];
        for axis in 0..3 {
            self.prev[axis] = vector[axis] * self.factor + self.prev[axis] * (1.0 - self.factor);
            output[axis] = vector[axis] - self.prev[axis];
        }
        Some(output)
    }

    fn reset(&mut self) {
        self.prev = [0.0, 0.0, 0.0];
    }
}

/// Cadena de filtros en orden fijo. Todos los filtros ven cada muestra,
/// incluso los que vienen detrás de una supresión (vía `apply`).
pub struct FilterChain {
    filters: Vec<Box<dyn AccelerationFilter + Send>>,
}

impl FilterChain {
    /// Cadena vacía, para componer a mano.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Cadena por defecto: reposo → detección de movimiento →
    /// equivalencia direccional.
    pub fn with_default_filters(
        idle_sensitivity: f64,
        directional_sensitivity: f64,
        motion_change_time: Duration,
    ) -> Self {
        let mut chain = Self::new();
        chain.push(IdleStateFilter::with_sensitivity(idle_sensitivity));
        chain.push(MotionDetectFilter::with_motion_change_time(
            motion_change_time,
        ));
        chain.push(DirectionalEquivalenceFilter::with_sensitivity(
            directional_sensitivity,
        ));
        chain
    }

    pub fn push<F>(&mut self, filter: F)
    where
        F: AccelerationFilter + Send + 'static,
    {
        self.filters.push(Box::new(filter));
    }

    /// Pasa un vector por todos los filtros. `None` si alguno lo suprimió.
    pub fn process(&mut self, vector: AccelVector, now: Instant) -> Option<AccelVector> {
        let mut current = Some(vector);
        for filter in &mut self.filters {
            current = filter.apply(current, now);
        }
        current
    }

    /// Drena la siguiente transición de movimiento pendiente, si la hay.
    pub fn poll_transition(&mut self) -> Option<MotionTransition> {
        for filter in &mut self.filters {
            if let Some(transition) = filter.poll_transition() {
                return Some(transition);
            }
        }
        None
    }

    /// Reinicia todos los filtros. Debe llamarse al empezar cada sesión
    /// de grabación para que no se arrastre estado del gesto anterior.
    pub fn reset_all(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterChain {
    fn default() -> Self {
        Self::with_default_filters(0.1, 0.2, Duration::from_millis(190))
    }
}
