use crate::gesture::Gesture;
use crate::gesture_model::GestureModel;

/// Clasificador bayesiano sobre una colección ordenada de clases de
/// gesto. El índice de inserción es la identidad de la clase: solo se
/// añade por el final o se vacía por completo, nunca se quita una
/// entrada suelta.
pub struct Classifier {
    models: Vec<GestureModel>,
    last_probability: f64,
}

impl Classifier {
    pub fn new() -> Self {
        Self {
            models: Vec::new(),
            last_probability: 0.0,
        }
    }

    pub fn add_gesture_model(&mut self, model: GestureModel) {
        self.models.push(model);
    }

    pub fn model(&self, id: usize) -> Option<&GestureModel> {
        self.models.get(id)
    }

    pub fn models(&self) -> &[GestureModel] {
        &self.models
    }

    pub fn count(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Olvida todas las clases entrenadas.
    pub fn clear(&mut self) {
        self.models.clear();
        self.last_probability = 0.0;
    }

    /// Posterior ganadora de la última clasificación con resultado.
    pub fn last_probability(&self) -> f64 {
        self.last_probability
    }

    /// Clasificación por posterior de Bayes: gana la clase con mayor
    /// `prior·score / Σ prior·score`. Devuelve el índice solo si la
    /// posterior, la prior, la puntuación cruda y el denominador son
    /// todos estrictamente positivos; si no, `None` (sin coincidencia).
    pub fn classify_gesture(&mut self, gesture: &Gesture) -> Option<usize> {
        let scores: Vec<f64> = self
            .models
            .iter()
            .map(|model| model.matches(gesture))
            .collect();

        let sum: f64 = self
            .models
            .iter()
            .zip(&scores)
            .map(|(model, score)| model.default_probability() * score)
            .sum();

        let mut recognized: Option<usize> = None;
        let mut best_posterior = f64::MIN;
        let mut best_score = 0.0;
        let mut best_prior = 0.0;

        for (index, (model, &score)) in self.models.iter().zip(&scores).enumerate() {
            let prior = model.default_probability();
            let posterior = prior * score / sum;
            if posterior > best_posterior {
                best_posterior = posterior;
                best_score = score;
                best_prior = prior;
                recognized = Some(index);
            }
        }

        if best_posterior > 0.0 && best_prior > 0.0 && best_score > 0.0 && sum > 0.0 {
            self.last_probability = best_posterior;
            recognized
        } else {
            None
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc_gesture(radius: f64, tilt: f64, samples: usize) -> Gesture {
        let mut gesture = Gesture::new();
        for i in 0..samples {
            let phase = i as f64 * std::f64::consts::TAU / samples as f64;
            gesture.add_vector([
                radius * phase.cos(),
                radius * phase.sin(),
                tilt * phase.sin(),
            ]);
        }
        gesture
    }

    fn trained_model(radius: f64, tilt: f64) -> GestureModel {
        let corpus = vec![
            arc_gesture(radius, tilt, 20),
            arc_gesture(radius * 1.05, tilt, 18),
            arc_gesture(radius * 0.95, tilt, 22),
        ];
        let mut model = GestureModel::new();
        model.train(&corpus).unwrap();
        model
    }

    #[test]
    fn empty_classifier_matches_nothing() {
        let mut classifier = Classifier::new();
        let gesture = arc_gesture(2.0, 0.5, 20);
        assert_eq!(classifier.classify_gesture(&gesture), None);
    }

    #[test]
    fn recognizes_its_own_training_gesture() {
        let mut classifier = Classifier::new();
        classifier.add_gesture_model(trained_model(2.0, 0.5));

        let result = classifier.classify_gesture(&arc_gesture(2.0, 0.5, 20));
        assert_eq!(result, Some(0));
        assert!(classifier.last_probability() > 0.0);
    }

    #[test]
    fn clear_forgets_all_models() {
        let mut classifier = Classifier::new();
        classifier.add_gesture_model(trained_model(2.0, 0.5));
        assert_eq!(classifier.count(), 1);

        classifier.clear();
        assert!(classifier.is_empty());
        assert_eq!(classifier.last_probability(), 0.0);
        assert_eq!(classifier.classify_gesture(&arc_gesture(2.0, 0.5, 20)), None);
    }
}
