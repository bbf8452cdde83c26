//! Reconocimiento de gestos de mano a partir de un flujo de aceleración
//! de 3 ejes: cadena de filtros con estado, sesión de grabación a golpe
//! de botón, cuantización vectorial y clasificación bayesiana sobre
//! modelos ocultos de Markov izquierda-a-derecha.

pub mod classifier;
pub mod config;
pub mod csv_loader;
pub mod filter;
pub mod gesture;
pub mod gesture_model;
pub mod hmm;
pub mod quantizer;
pub mod session;
pub mod storage;
pub mod types;
