//! Reglas que evalúan scripts opacos en la página
//!
//! Estas reglas dependen de la capacidad `evaluate` del driver: inyectan
//! un script y consumen su JSON. Si la página no admite evaluación, la
//! regla lo reporta como impedida en lugar de inventar un resultado.

use crate::driver::Page;
use crate::rules::registry::RuleChecker;
use crate::rules::{Instance, Location, RuleOutcome};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Documento sin declaración doctype.
pub struct DocType;

const SCRIPT_DOCTYPE: &str = "({hasDoctype: document.doctype !== null})";

#[async_trait]
impl RuleChecker for DocType {
    fn name(&self) -> &'static str {
        "docType"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let valor = match page.evaluate(SCRIPT_DOCTYPE).await {
            Ok(valor) => valor,
            Err(e) => {
                return Ok(RuleOutcome::prevenida(&format!(
                    "no se pudo consultar el doctype ({})",
                    e
                )));
            }
        };
        let tiene = valor
            .get("hasDoctype")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if tiene {
            return Ok(RuleOutcome::nueva(json!({ "total": 0 }), [0.0; 4], Vec::new()));
        }
        let instancia = Instance {
            rule_id: "docType".to_string(),
            what: "El documento no tiene declaración doctype".to_string(),
            ordinal_severity: 1,
            tag_name: "HTML".to_string(),
            id: String::new(),
            location: Location::default(),
            excerpt: String::new(),
            count: if with_items { None } else { Some(1) },
        };
        Ok(RuleOutcome::nueva(
            json!({ "total": 1 }),
            [0.0, 1.0, 0.0, 0.0],
            vec![instancia],
        ))
    }
}

/// Botones de radio sin agrupación estándar: dos o más radios con el
/// mismo name, y ningún otro, dentro de un fieldset con legend válida.
pub struct RadioSet;

const SCRIPT_RADIO_SET: &str = r#"(() => {
  const como = el => {
    if (!el.name) return 'noName';
    const fs = el.closest('fieldset');
    if (!fs) return 'noFS';
    const primero = fs.firstElementChild;
    if (!primero || primero.tagName !== 'LEGEND' || !primero.textContent.trim()) return 'legendBad';
    const conNombre = fs.querySelectorAll(`input[type=radio][name=${el.name}]`).length;
    if (conNombre < 2) return 'only1RB';
    if (fs.querySelectorAll('input[type=radio]').length !== conNombre) return 'fsMixed';
    if (document.querySelectorAll(`input[type=radio][name=${el.name}]`).length !== conNombre) return 'nameLeak';
    return '';
  };
  return Array.from(document.querySelectorAll('input[type=radio]'))
    .slice(0, 100)
    .map(el => ({id: el.id || '', excerpt: el.name || '', how: como(el)}))
    .filter(item => item.how);
})()"#;

#[async_trait]
impl RuleChecker for RadioSet {
    fn name(&self) -> &'static str {
        "radioSet"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let valor = page.evaluate(SCRIPT_RADIO_SET).await?;
        let items = valor
            .as_array()
            .ok_or_else(|| anyhow!("respuesta inesperada del script de radios"))?;
        let motivos = BTreeMap::from([
            ("nameLeak", "comparte nombre con otros fuera de su fieldset"),
            ("fsMixed", "comparte fieldset con otros de nombre distinto"),
            ("only1RB", "es el único con su nombre en su fieldset"),
            ("legendBad", "está en un fieldset sin legend válida"),
            ("noFS", "no está en un fieldset"),
            ("noName", "no tiene atributo name"),
        ]);
        let total = items.len();
        let mut instancias = Vec::new();
        if with_items {
            for item in items {
                let motivo = item
                    .get("how")
                    .and_then(Value::as_str)
                    .and_then(|clave| motivos.get(clave).copied())
                    .unwrap_or("viola la agrupación estándar");
                instancias.push(Instance {
                    rule_id: "radioSet".to_string(),
                    what: format!("El botón de radio {}", motivo),
                    ordinal_severity: 2,
                    tag_name: "INPUT".to_string(),
                    id: item
                        .get("id")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    location: Location::default(),
                    excerpt: item
                        .get("excerpt")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    count: None,
                });
            }
        } else if total > 0 {
            instancias.push(Instance {
                rule_id: "radioSet".to_string(),
                what: "Hay botones de radio sin agrupación válida en fieldsets con legend"
                    .to_string(),
                ordinal_severity: 2,
                tag_name: "INPUT".to_string(),
                id: String::new(),
                location: Location::default(),
                excerpt: String::new(),
                count: Some(total as u64),
            });
        }
        Ok(RuleOutcome::nueva(
            json!({ "total": total }),
            [0.0, 0.0, total as f64, 0.0],
            instancias,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FixturePage;

    #[tokio::test]
    async fn test_doc_type_presente_no_reporta() {
        let pagina = FixturePage::desde_html("<html><body></body></html>")
            .con_respuesta_eval("document.doctype", json!({ "hasDoctype": true }));
        let salida = DocType.check(&pagina, true, &[]).await.unwrap();
        assert_eq!(salida.totals, [0.0; 4]);
        assert!(!salida.esta_prevenida());
    }

    #[tokio::test]
    async fn test_doc_type_ausente_reporta_una_instancia() {
        let pagina = FixturePage::desde_html("<html><body></body></html>")
            .con_respuesta_eval("document.doctype", json!({ "hasDoctype": false }));
        let salida = DocType.check(&pagina, false, &[]).await.unwrap();
        assert_eq!(salida.totals, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(salida.standard_instances[0].count, Some(1));
    }

    #[tokio::test]
    async fn test_doc_type_sin_scripting_queda_impedida() {
        let pagina = FixturePage::desde_html("<html><body></body></html>");
        let salida = DocType.check(&pagina, true, &[]).await.unwrap();
        assert!(salida.esta_prevenida(), "Sin evaluate, la regla se impide");
        assert_eq!(salida.totals, [0.0; 4]);
    }

    #[tokio::test]
    async fn test_radio_set_traduce_los_motivos() {
        let pagina = FixturePage::desde_html("<html><body></body></html>").con_respuesta_eval(
            "input[type=radio]",
            json!([
                {"id": "r1", "excerpt": "plan", "how": "noFS"},
                {"id": "r2", "excerpt": "plan", "how": "noName"}
            ]),
        );
        let salida = RadioSet.check(&pagina, true, &[]).await.unwrap();
        assert_eq!(salida.totals, [0.0, 0.0, 2.0, 0.0]);
        assert!(salida.standard_instances[0].what.contains("no está en un fieldset"));
        assert!(salida.standard_instances[1].what.contains("no tiene atributo name"));
    }

    #[tokio::test]
    async fn test_radio_set_propaga_el_error_de_evaluacion() {
        let pagina = FixturePage::desde_html("<html><body></body></html>");
        assert!(
            RadioSet.check(&pagina, true, &[]).await.is_err(),
            "Sin evaluate, el error llega al aislador"
        );
    }
}
