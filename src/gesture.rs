use crate::types::{AccelSample, AccelVector};

/// Un gesto: la trayectoria completa de una ejecución, como secuencia
/// cronológica de muestras aceptadas. Solo se añade por el final, nunca
/// se reordena.
///
/// El máximo y mínimo de las componentes se derivan de los datos, salvo
/// en el gesto agregado sintético del entrenamiento, donde se fijan a
/// mano con el promedio de los gestos originales.
#[derive(Debug, Clone, Default)]
pub struct Gesture {
    data: Vec<AccelSample>,
    min_max_override: Option<(f64, f64)>, // (min, max)
}

impl Gesture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, sample: AccelSample) {
        self.data.push(sample);
    }

    pub fn add_vector(&mut self, vector: AccelVector) {
        self.add(AccelSample::from_vector(vector));
    }

    pub fn data(&self) -> &[AccelSample] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn last(&self) -> Option<&AccelSample> {
        self.data.last()
    }

    /// Fija mínimo y máximo a mano (gesto agregado de entrenamiento).
    pub fn set_min_max(&mut self, min: f64, max: f64) {
        self.min_max_override = Some((min, max));
    }

    /// Mayor valor absoluto de componente en todos los ejes y muestras,
    /// o el valor fijado a mano si existe.
    pub fn max_abs_component(&self) -> f64 {
        if let Some((_, max)) = self.min_max_override {
            return max;
        }
        self.data
            .iter()
            .flat_map(|s| [s.x.abs(), s.y.abs(), s.z.abs()])
            .fold(f64::MIN, f64::max)
    }

    /// Menor valor absoluto de componente, o el fijado a mano.
    pub fn min_abs_component(&self) -> f64 {
        if let Some((min, _)) = self.min_max_override {
            return min;
        }
        self.data
            .iter()
            .flat_map(|s| [s.x.abs(), s.y.abs(), s.z.abs()])
            .fold(f64::MAX, f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let mut gesture = Gesture::new();
        gesture.add_vector([1.0, 0.0, 0.0]);
        gesture.add_vector([0.0, 2.0, 0.0]);
        gesture.add_vector([0.0, 0.0, 3.0]);

        let xs: Vec<f64> = gesture.data().iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![1.0, 0.0, 0.0]);
        assert_eq!(gesture.last().unwrap().z, 3.0);
    }

    #[test]
    fn derived_min_max_over_all_axes() {
        let mut gesture = Gesture::new();
        gesture.add_vector([1.0, -5.0, 0.5]);
        gesture.add_vector([2.0, 0.25, -3.0]);

        assert_eq!(gesture.max_abs_component(), 5.0);
        assert_eq!(gesture.min_abs_component(), 0.25);
    }

    #[test]
    fn manual_min_max_overrides_derived() {
        let mut gesture = Gesture::new();
        gesture.add_vector([1.0, 2.0, 3.0]);
        gesture.set_min_max(0.1, 9.0);

        assert_eq!(gesture.min_abs_component(), 0.1);
        assert_eq!(gesture.max_abs_component(), 9.0);
    }
}
