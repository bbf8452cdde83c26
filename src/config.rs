use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Códigos de tecla/botón que controlan la sesión. Por defecto las
/// teclas T (entrenar), R (reconocer) y C (cerrar gesto) de un teclado
/// Linux (códigos de evdev).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ButtonConfig {
    pub train: u16,
    pub recognize: u16,
    pub close_gesture: u16,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            train: 20,         // KEY_T
            recognize: 19,     // KEY_R
            close_gesture: 46, // KEY_C
        }
    }
}

/// Sensibilidades de la cadena de filtros por defecto.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Semiancho de la banda de reposo alrededor de 1g (default: 0.1)
    pub idle_sensitivity: f64,
    /// Banda por eje del filtro de equivalencia direccional (default: 0.2)
    pub directional_sensitivity: f64,
    /// Silencio que marca el fin de movimiento, en ms (default: 190)
    pub motion_change_ms: u64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            idle_sensitivity: 0.1,
            directional_sensitivity: 0.2,
            motion_change_ms: 190,
        }
    }
}

/// Configuración completa del demonio.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct DaemonConfig {
    pub buttons: ButtonConfig,
    pub filters: FilterParams,
    /// CSV de captura que se reproduce como fuente de aceleración
    pub capture: Option<String>,
}

/// Carga la configuración desde un JSON en disco.
pub fn load_config(path: impl AsRef<Path>) -> Result<DaemonConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("No se pudo leer la configuración {:?}", path))?;
    let config: DaemonConfig = serde_json::from_str(&content)
        .with_context(|| format!("Configuración inválida en {:?}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_map_trc_keys() {
        let buttons = ButtonConfig::default();
        assert_eq!(buttons.train, 20);
        assert_eq!(buttons.recognize, 19);
        assert_eq!(buttons.close_gesture, 46);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: DaemonConfig =
            serde_json::from_str(r#"{"buttons": {"train": 30}}"#).unwrap();
        assert_eq!(config.buttons.train, 30);
        assert_eq!(config.buttons.recognize, 19);
        assert_eq!(config.filters.motion_change_ms, 190);
        assert!(config.capture.is_none());
    }
}
