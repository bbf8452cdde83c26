use crate::gesture::Gesture;
use crate::hmm::{HiddenMarkovModel, TrainOutcome};
use crate::quantizer::Quantizer;
use crate::types::{NUM_OBSERVATIONS, NUM_STATES};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrainingError {
    #[error("empty training set: record at least one gesture before closing")]
    EmptyTrainingSet,
}

/// Una clase de gesto entrenada: un cuantizador y un modelo de Markov
/// dimensionados en consistencia, más la probabilidad a priori que usa
/// el clasificador de Bayes (la autosimilitud media sobre el corpus de
/// entrenamiento).
pub struct GestureModel {
    quantizer: Quantizer,
    hmm: HiddenMarkovModel,
    default_probability: f64,
}

impl GestureModel {
    /// Dimensiones fijas del dominio: 8 estados, 14 símbolos.
    pub fn new() -> Self {
        Self {
            quantizer: Quantizer::new(NUM_STATES),
            hmm: HiddenMarkovModel::new(NUM_STATES, NUM_OBSERVATIONS),
            default_probability: 0.0,
        }
    }

    /// Reconstruye un modelo ya entrenado (carga desde disco).
    pub fn from_parts(
        quantizer: Quantizer,
        hmm: HiddenMarkovModel,
        default_probability: f64,
    ) -> Self {
        Self {
            quantizer,
            hmm,
            default_probability,
        }
    }

    /// Entrena la clase con varias ejecuciones del mismo gesto.
    ///
    /// Primero se concatenan todas las muestras en un gesto agregado
    /// cuyo mínimo y máximo se fijan al promedio de los de cada
    /// ejecución (de ahí sale el radio del cuantizador); con el
    /// cuantizador ya entrenado se discretiza cada ejecución por
    /// separado y se reestima el modelo de Markov sobre ese corpus.
    pub fn train(&mut self, gestures: &[Gesture]) -> Result<TrainOutcome, TrainingError> {
        if gestures.is_empty() {
            return Err(TrainingError::EmptyTrainingSet);
        }

        let mut aggregate = Gesture::new();
        let mut max_sum = 0.0;
        let mut min_sum = 0.0;
        for gesture in gestures {
            max_sum += gesture.max_abs_component();
            min_sum += gesture.min_abs_component();
            for sample in gesture.data() {
                aggregate.add(*sample);
            }
        }
        let count = gestures.len() as f64;
        aggregate.set_min_max(min_sum / count, max_sum / count);

        self.quantizer.train_centeroids(&aggregate);

        let sequences: Vec<Vec<usize>> = gestures
            .iter()
            .map(|gesture| self.quantizer.get_observation_sequence(gesture))
            .collect();

        let outcome = self.hmm.train(&sequences);

        // a priori para Bayes: media de la puntuación del modelo sobre
        // sus propios gestos de entrenamiento
        let mut probability_sum = 0.0;
        for gesture in gestures {
            probability_sum += self.matches(gesture);
        }
        self.default_probability = probability_sum / count;

        Ok(outcome)
    }

    /// Puntuación de un gesto contra esta clase: discretiza y pasa la
    /// secuencia por el modelo de Markov.
    pub fn matches(&self, gesture: &Gesture) -> f64 {
        let sequence = self.quantizer.get_observation_sequence(gesture);
        self.hmm.get_probability(&sequence)
    }

    pub fn default_probability(&self) -> f64 {
        self.default_probability
    }

    pub fn quantizer(&self) -> &Quantizer {
        &self.quantizer
    }

    pub fn hmm(&self) -> &HiddenMarkovModel {
        &self.hmm
    }

    pub fn num_states(&self) -> usize {
        self.hmm.num_states()
    }

    pub fn num_observations(&self) -> usize {
        self.hmm.num_observations()
    }
}

impl Default for GestureModel {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle_gesture(radius: f64, samples: usize) -> Gesture {
        let mut gesture = Gesture::new();
        for i in 0..samples {
            let phase = i as f64 * std::f64::consts::TAU / samples as f64;
            gesture.add_vector([radius * phase.cos(), radius * phase.sin(), 0.2]);
        }
        gesture
    }

    #[test]
    fn train_rejects_empty_corpus() {
        let mut model = GestureModel::new();
        assert!(matches!(
            model.train(&[]),
            Err(TrainingError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn trained_model_scores_its_own_gestures() {
        let corpus = vec![
            circle_gesture(2.0, 20),
            circle_gesture(2.1, 18),
            circle_gesture(1.9, 22),
        ];

        let mut model = GestureModel::new();
        let outcome = model.train(&corpus).unwrap();
        assert_eq!(outcome.skipped_sequences, 0);

        assert!(model.default_probability() > 0.0);
        assert!(model.matches(&corpus[0]) > 0.0);
    }

    #[test]
    fn aggregate_uses_averaged_extremes() {
        // dos gestos con radios distintos: el radio del cuantizador debe
        // salir del promedio de los extremos, no del agregado en bruto
        let corpus = vec![circle_gesture(2.0, 16), circle_gesture(4.0, 16)];

        let mut model = GestureModel::new();
        model.train(&corpus).unwrap();

        let expected_max = (corpus[0].max_abs_component() + corpus[1].max_abs_component()) / 2.0;
        let expected_min = (corpus[0].min_abs_component() + corpus[1].min_abs_component()) / 2.0;
        let expected_radius = (expected_max + expected_min) / 2.0;
        assert!((model.quantizer().radius() - expected_radius).abs() < 1e-12);
    }
}
