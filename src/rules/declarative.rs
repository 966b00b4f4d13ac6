//! Evaluador de reglas declarativas
//!
//! Un verificador genérico dirigido por datos: una definición declarativa
//! aporta el selector, las plantillas de queja, la severidad ordinal y la
//! etiqueta del resumen; el evaluador solo traduce conteo de elementos a
//! instancias. Ninguna regla declarativa requiere código propio.

use crate::driver::Page;
use crate::rules::report::{self, CAP_ELEMENTOS};
use crate::rules::{RuleOutcome, SEVERIDAD_MAX};
use anyhow::bail;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Quejas {
    pub instance: String,
    pub summary: String,
}

/// Documento de definición de una regla declarativa.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ReglaDeclarativa {
    #[serde(rename = "ruleID")]
    pub rule_id: String,
    pub what: String,
    pub selector: String,
    pub complaints: Quejas,
    pub ordinal_severity: u8,
    pub summary_tag_name: String,
}

impl ReglaDeclarativa {
    pub fn desde_json(texto: &str) -> anyhow::Result<Self> {
        let regla: Self = serde_json::from_str(texto)?;
        regla.validar()?;
        Ok(regla)
    }

    pub fn desde_yaml(texto: &str) -> anyhow::Result<Self> {
        let regla: Self = serde_yaml::from_str(texto)?;
        regla.validar()?;
        Ok(regla)
    }

    fn validar(&self) -> anyhow::Result<()> {
        if self.rule_id.is_empty() {
            bail!("la definición declarativa no tiene ruleID");
        }
        if self.selector.is_empty() {
            bail!("la regla declarativa '{}' no tiene selector", self.rule_id);
        }
        if self.ordinal_severity > SEVERIDAD_MAX {
            bail!(
                "la regla declarativa '{}' declara severidad {} (máximo {})",
                self.rule_id,
                self.ordinal_severity,
                SEVERIDAD_MAX
            );
        }
        Ok(())
    }
}

/// Evalúa una regla declarativa contra la página.
pub async fn evaluar(
    page: &dyn Page,
    regla: &ReglaDeclarativa,
    with_items: bool,
) -> anyhow::Result<RuleOutcome> {
    let mut coleccion = report::recolectar(page, &regla.selector, CAP_ELEMENTOS).await?;
    // Todo elemento que el selector encuentra es un violador.
    coleccion.marcar(|_| Some(None));
    Ok(report::informar(
        with_items,
        &coleccion,
        &regla.rule_id,
        [
            regla.complaints.instance.as_str(),
            regla.complaints.summary.as_str(),
        ],
        regla.ordinal_severity,
        &regla.summary_tag_name,
    ))
}
