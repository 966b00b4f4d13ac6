pub mod checks;
pub mod declarative;
pub mod engine;
pub mod registry;
pub mod report;

pub use engine::{RunOptions, ejecutar_reglas};
pub use registry::Registry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Severidad ordinal máxima: 0 es la más severa, 3 la más leve.
pub const SEVERIDAD_MAX: u8 = 3;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Location {
    pub doc: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub spec: String,
}

/// Un registro de violación (o, sin itemización, un registro resumen con `count`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(rename = "ruleID")]
    pub rule_id: String,
    pub what: String,
    pub ordinal_severity: u8,
    pub tag_name: String,
    pub id: String,
    pub location: Location,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Salida cruda de un verificador, antes de la agregación.
///
/// `totals` es un histograma de 4 cubetas indexado por severidad ordinal.
/// Se admite f64 porque etapas previas pueden promediar; la agregación
/// redondea a enteros. `data.prevented == true` señala que la regla no
/// pudo completarse.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub data: Value,
    pub totals: [f64; 4],
    pub standard_instances: Vec<Instance>,
}

impl RuleOutcome {
    pub fn nueva(data: Value, totals: [f64; 4], standard_instances: Vec<Instance>) -> Self {
        Self { data, totals, standard_instances }
    }

    /// Resultado de una regla que no pudo completarse.
    pub fn prevenida(mensaje: &str) -> Self {
        Self {
            data: serde_json::json!({ "prevented": true, "error": mensaje }),
            totals: [0.0; 4],
            standard_instances: Vec::new(),
        }
    }

    pub fn esta_prevenida(&self) -> bool {
        self.data
            .get("prevented")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Entrada agregada de una regla dentro del reporte de corrida.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RuleEntry {
    pub what: String,
    pub data: Value,
    pub totals: [u64; 4],
    pub standard_instances: Vec<Instance>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RuleTime {
    pub rule: String,
    pub seconds: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct RunData {
    pub prevented: bool,
    pub error: String,
    pub rule_preventions: Vec<String>,
    pub rule_prevention_messages: BTreeMap<String, String>,
    pub rules_invalid: Vec<String>,
    /// Pares regla/segundos ordenados por duración descendente.
    pub rule_test_times: Vec<RuleTime>,
}

/// El reporte de una corrida completa: datos de control más el resultado
/// por regla. Se construye incrementalmente y se devuelve por valor.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunReport {
    pub data: RunData,
    pub result: BTreeMap<String, RuleEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instancia_serializa_con_rule_id_exacto() {
        let instancia = Instance {
            rule_id: "miniText".to_string(),
            what: "Texto demasiado pequeño".to_string(),
            ordinal_severity: 2,
            tag_name: "P".to_string(),
            id: "p1".to_string(),
            location: Location::default(),
            excerpt: "hola".to_string(),
            count: None,
        };
        let json = serde_json::to_value(&instancia).unwrap();
        assert!(json.get("ruleID").is_some(), "El campo debe llamarse ruleID");
        assert!(json.get("ordinalSeverity").is_some());
        assert!(
            json.get("count").is_none(),
            "count ausente no debe serializarse"
        );
        assert_eq!(json["location"]["type"], "");
    }

    #[test]
    fn test_resultado_prevenido() {
        let salida = RuleOutcome::prevenida("la página rechazó el script");
        assert!(salida.esta_prevenida());
        assert_eq!(salida.totals, [0.0; 4]);
        assert!(salida.standard_instances.is_empty());
    }

    #[test]
    fn test_reporte_serializa_campos_camel_case() {
        let reporte = RunReport::default();
        let json = serde_json::to_value(&reporte).unwrap();
        assert!(json["data"].get("rulePreventions").is_some());
        assert!(json["data"].get("rulesInvalid").is_some());
        assert!(json["data"].get("ruleTestTimes").is_some());
    }
}
