use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Versión actual de Vigía (leída desde Cargo.toml en tiempo de compilación)
pub const VIGIA_VERSION: &str = env!("CARGO_PKG_VERSION");

fn defecto_agente() -> String {
    "vigia".to_string()
}

fn defecto_espera_red() -> u64 {
    10
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct VigiaConfig {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub project_name: String,
    /// Identificador de agente que viaja en las notificaciones al observador.
    #[serde(default = "defecto_agente")]
    pub agent: String,
    /// Endpoint de envío de reportes; de él se deriva la URL del observador.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_to: Option<String>,
    /// Notificación granular de avance, regla por regla.
    #[serde(default)]
    pub observe: bool,
    /// Itemizar instancias en lugar de colapsarlas en resúmenes.
    #[serde(default)]
    pub with_items: bool,
    #[serde(default)]
    pub stop_on_fail: bool,
    /// Si una regla que lanzó error también detiene la corrida.
    #[serde(default)]
    pub stop_on_fail_on_error: bool,
    /// Espera de red al final del guion de acciones, en segundos.
    #[serde(default = "defecto_espera_red")]
    pub network_idle_timeout_secs: u64,
    /// Directorio con definiciones declarativas adicionales del proyecto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_dir: Option<String>,
}

impl Default for VigiaConfig {
    fn default() -> Self {
        Self {
            version: VIGIA_VERSION.to_string(),
            project_name: String::new(),
            agent: defecto_agente(),
            report_to: None,
            observe: false,
            with_items: false,
            stop_on_fail: false,
            stop_on_fail_on_error: false,
            network_idle_timeout_secs: defecto_espera_red(),
            rules_dir: None,
        }
    }
}

impl VigiaConfig {
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml = toml::to_string_pretty(self)?;
        fs::write(path.join(".vigiarc.toml"), toml)?;
        Ok(())
    }

    /// Carga la configuración desde el archivo .vigiarc.toml
    ///
    /// Tolerante con campos faltantes: usa valores por defecto y migra
    /// configuraciones de versiones anteriores.
    pub fn load(path: &Path) -> Option<Self> {
        let config_path = path.join(".vigiarc.toml");
        let content = fs::read_to_string(&config_path).ok()?;

        match toml::from_str::<VigiaConfig>(&content) {
            Ok(mut config) => {
                if config.version != VIGIA_VERSION {
                    println!(
                        "{}",
                        format!(
                            "   🔄 Migrando configuración de versión {} a {}...",
                            config.version, VIGIA_VERSION
                        )
                        .yellow()
                    );
                    config = config.migrar();
                    let _ = config.save(path);
                }
                Some(config)
            }
            Err(_) => {
                println!(
                    "{}",
                    "   ⚠️  No se pudo cargar la configuración. Se usarán valores por defecto."
                        .yellow()
                );
                None
            }
        }
    }

    /// Migra una configuración de una versión anterior a la actual.
    fn migrar(mut self) -> Self {
        self.version = VIGIA_VERSION.to_string();
        if self.agent.is_empty() {
            self.agent = defecto_agente();
        }
        if self.network_idle_timeout_secs == 0 {
            self.network_idle_timeout_secs = defecto_espera_red();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ida_y_vuelta_por_disco() {
        let dir = tempfile::tempdir().unwrap();
        let config = VigiaConfig {
            project_name: "tienda".to_string(),
            report_to: Some("https://servidor.test/api/report".to_string()),
            observe: true,
            ..VigiaConfig::default()
        };
        config.save(dir.path()).unwrap();
        let cargada = VigiaConfig::load(dir.path()).unwrap();
        assert_eq!(cargada.project_name, "tienda");
        assert_eq!(
            cargada.report_to.as_deref(),
            Some("https://servidor.test/api/report")
        );
        assert!(cargada.observe);
    }

    #[test]
    fn test_campos_faltantes_toman_defectos() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".vigiarc.toml"),
            format!("version = \"{}\"\nproject_name = \"vieja\"\n", VIGIA_VERSION),
        )
        .unwrap();
        let cargada = VigiaConfig::load(dir.path()).unwrap();
        assert_eq!(cargada.agent, "vigia");
        assert_eq!(cargada.network_idle_timeout_secs, 10);
        assert!(!cargada.stop_on_fail);
    }

    #[test]
    fn test_migracion_actualiza_la_version() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(".vigiarc.toml"),
            "version = \"0.1.0\"\nproject_name = \"antigua\"\nagent = \"\"\n",
        )
        .unwrap();
        let cargada = VigiaConfig::load(dir.path()).unwrap();
        assert_eq!(cargada.version, VIGIA_VERSION);
        assert_eq!(cargada.agent, "vigia", "La migración repone el agente");
    }

    #[test]
    fn test_sin_archivo_no_hay_configuracion() {
        let dir = tempfile::tempdir().unwrap();
        assert!(VigiaConfig::load(dir.path()).is_none());
    }
}
