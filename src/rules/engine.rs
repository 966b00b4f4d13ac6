//! Orquestación de la corrida de reglas
//!
//! Valida la selección, despacha cada regla a su definición (nativa o
//! declarativa), la ejecuta dentro de una frontera de contención de
//! fallos, la cronometra, notifica el avance al observador y pliega cada
//! salida en el reporte de la corrida. Las reglas corren estrictamente en
//! secuencia: comparten una única página mutable y muchas la alteran.
//!
//! Una vez validada la selección, esta función siempre devuelve un
//! reporte; los fallos son datos, no errores, en la frontera que ve el
//! operador.

use crate::driver::Page;
use crate::observer::{Bitacora, Observador};
use crate::rules::registry::{Definicion, Registry};
use crate::rules::{RuleEntry, RuleOutcome, RuleTime, RunData, RunReport, declarative};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

/// Mensaje del reporte cuando la selección no valida.
pub const MENSAJE_SELECCION_INVALIDA: &str = "invalid rule specification";

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Lista de selección: polaridad seguida de nombres de reglas.
    /// Vacía equivale a incluir todo el catálogo evaluativo.
    pub rules: Vec<String>,
    pub with_items: bool,
    /// Detiene la corrida tras la primera regla con totales no nulos.
    pub stop_on_fail: bool,
    /// Si además una regla que LANZÓ error detiene la corrida. Elección
    /// explícita de configuración; apagada reproduce el comportamiento
    /// clásico (solo un resultado reprobado detiene).
    pub stop_on_fail_on_error: bool,
    pub observe: bool,
    /// Argumentos posicionales extra por regla, solo para reglas nativas.
    pub args: HashMap<String, Vec<Value>>,
    pub job_id: String,
}

/// Ejecuta la selección de reglas contra la página y devuelve el reporte.
pub async fn ejecutar_reglas(
    page: &dyn Page,
    registro: &Registry,
    opciones: &RunOptions,
    observador: &dyn Observador,
    bitacora: &dyn Bitacora,
) -> RunReport {
    let mut data = RunData::default();
    let mut result = BTreeMap::new();

    let seleccion = if opciones.rules.is_empty() {
        let mut todas = vec!["include".to_string()];
        todas.extend(registro.evaluativas().keys().cloned());
        todas
    } else {
        opciones.rules.clone()
    };

    match registro.resolver_seleccion(&seleccion) {
        Err(e) => {
            bitacora.registrar(&format!("❌ ERROR: especificación de reglas inválida ({})", e));
            data.prevented = true;
            data.error = MENSAJE_SELECCION_INVALIDA.to_string();
        }
        Ok(orden) => {
            if opciones.observe {
                // Un segundo de asentamiento para que las notificaciones
                // granulares no se adelanten al registro de la corrida.
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
            let mut tiempos: Vec<(String, u64)> = Vec::new();
            for regla in orden {
                let Some(definicion) = registro.definicion_unica(&regla) else {
                    data.rules_invalid.push(regla.clone());
                    bitacora.registrar(&format!(
                        "❌ ERROR: la regla {} no está válidamente definida",
                        regla
                    ));
                    continue;
                };
                let what = registro.descripcion(&regla).unwrap_or("").to_string();
                if opciones.observe {
                    observador.notificar_regla(&opciones.job_id, &regla, &what);
                    bitacora.registrar(&format!(">>>>>> {} ({})", regla, what));
                }
                let inicio = Instant::now();
                let salida = match definicion {
                    Definicion::Nativa(verificador) => {
                        let extra = opciones.args.get(&regla).cloned().unwrap_or_default();
                        verificador.check(page, opciones.with_items, &extra).await
                    }
                    Definicion::Declarativa(declarada) => {
                        declarative::evaluar(page, declarada, opciones.with_items).await
                    }
                };
                match salida {
                    Ok(salida) => {
                        tiempos.push((regla.clone(), inicio.elapsed().as_secs_f64().round() as u64));
                        if salida.esta_prevenida() {
                            data.rule_preventions.push(regla.clone());
                        }
                        let entrada = agregar_salida(&what, salida);
                        let reprobada = entrada.totals.iter().any(|total| *total > 0);
                        result.insert(regla.clone(), entrada);
                        if opciones.stop_on_fail && reprobada {
                            break;
                        }
                    }
                    Err(e) => {
                        data.rule_preventions.push(regla.clone());
                        data.rule_prevention_messages
                            .insert(regla.clone(), e.to_string());
                        result.insert(
                            regla.clone(),
                            RuleEntry {
                                what,
                                data: json!({ "prevented": true }),
                                totals: [0; 4],
                                standard_instances: Vec::new(),
                            },
                        );
                        bitacora.registrar(&format!(
                            "❌ ERROR: prueba de la regla {} impedida ({})",
                            regla, e
                        ));
                        if opciones.stop_on_fail && opciones.stop_on_fail_on_error {
                            break;
                        }
                    }
                }
            }
            data.rule_test_times = ordenar_tiempos(tiempos);
        }
    }
    RunReport { data, result }
}

/// Pliega la salida de un verificador en su entrada del reporte. Los
/// totales fraccionarios se redondean, nunca se truncan sin redondear.
pub fn agregar_salida(what: &str, salida: RuleOutcome) -> RuleEntry {
    let totals = salida.totals.map(|total| total.round().max(0.0) as u64);
    RuleEntry {
        what: what.to_string(),
        data: salida.data,
        totals,
        standard_instances: salida.standard_instances,
    }
}

/// Vista derivada para diagnóstico: las reglas más lentas primero.
fn ordenar_tiempos(mut tiempos: Vec<(String, u64)>) -> Vec<RuleTime> {
    tiempos.sort_by(|a, b| b.1.cmp(&a.1));
    tiempos
        .into_iter()
        .map(|(rule, seconds)| RuleTime { rule, seconds })
        .collect()
}
