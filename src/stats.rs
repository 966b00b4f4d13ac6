use crate::rules::RunReport;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize, Default)]
pub struct VigiaStats {
    pub total_corridas: u32,
    pub total_reglas_ejecutadas: u32,
    pub total_instancias: u64,
    pub total_prevenciones: u32,
    pub segundos_acumulados: u64,
    pub ultima_corrida: Option<String>,
}

impl VigiaStats {
    pub fn cargar(path: &Path) -> Self {
        let stats_path = path.join(".vigia_stats.json");
        if let Ok(content) = fs::read_to_string(stats_path) {
            serde_json::from_str(&content).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    pub fn guardar(&self, path: &Path) {
        let stats_path = path.join(".vigia_stats.json");
        if let Ok(content) = serde_json::to_string_pretty(self) {
            let _ = fs::write(stats_path, content);
        }
    }

    /// Acumula los números de una corrida terminada.
    pub fn registrar_corrida(&mut self, reporte: &RunReport) {
        self.total_corridas += 1;
        self.total_reglas_ejecutadas += reporte.result.len() as u32;
        self.total_instancias += reporte
            .result
            .values()
            .map(|entrada| entrada.standard_instances.len() as u64)
            .sum::<u64>();
        self.total_prevenciones += reporte.data.rule_preventions.len() as u32;
        self.segundos_acumulados += reporte
            .data
            .rule_test_times
            .iter()
            .map(|tiempo| tiempo.seconds)
            .sum::<u64>();
        self.ultima_corrida = Some(chrono::Local::now().to_rfc3339());
    }
}
