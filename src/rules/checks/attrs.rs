//! Reglas sobre atributos de elementos

use crate::driver::{ElementInfo, Page};
use crate::rules::RuleOutcome;
use crate::rules::registry::RuleChecker;
use crate::rules::report::{self, CAP_ELEMENTOS};
use async_trait::async_trait;
use serde_json::Value;

/// Campos de nombre y correo sin atributo autocomplete.
pub struct Autocomplete;

fn sugiere_nombre_o_correo(el: &ElementInfo) -> bool {
    let pistas = format!(
        "{} {} {} {}",
        el.attr("name").unwrap_or(""),
        el.id,
        el.attr("placeholder").unwrap_or(""),
        el.labels.join(" ")
    )
    .to_lowercase();
    ["name", "email", "nombre", "correo"]
        .iter()
        .any(|pista| pistas.contains(pista))
}

#[async_trait]
impl RuleChecker for Autocomplete {
    fn name(&self) -> &'static str {
        "autocomplete"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let mut coleccion = report::recolectar(page, "input", CAP_ELEMENTOS).await?;
        coleccion.marcar(|el| {
            let tipo = el.attr("type").unwrap_or("text");
            let aplicable = matches!(tipo, "text" | "email") && sugiere_nombre_o_correo(el);
            (aplicable && !el.has_attr("autocomplete")).then_some(None)
        });
        Ok(report::informar(
            with_items,
            &coleccion,
            "autocomplete",
            [
                "El campo de nombre o correo no tiene atributo autocomplete",
                "Hay campos de nombre o correo sin atributo autocomplete",
            ],
            2,
            "",
        ))
    }
}

/// Enlaces sin destino.
pub struct LinkTo;

#[async_trait]
impl RuleChecker for LinkTo {
    fn name(&self) -> &'static str {
        "linkTo"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let mut coleccion = report::recolectar(page, "a", CAP_ELEMENTOS).await?;
        coleccion.marcar(|el| {
            let destino = el.attr("href").unwrap_or("");
            (destino.is_empty() || destino == "#").then_some(None)
        });
        Ok(report::informar(
            with_items,
            &coleccion,
            "linkTo",
            ["El enlace no tiene destino", "Hay enlaces sin destino"],
            2,
            "",
        ))
    }
}

/// Atributos title en elementos inapropiados.
pub struct TitledEl;

const TAGS_CON_TITLE_LICITO: [&str; 6] = ["a", "abbr", "area", "iframe", "input", "link"];

#[async_trait]
impl RuleChecker for TitledEl {
    fn name(&self) -> &'static str {
        "titledEl"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let mut coleccion = report::recolectar(page, "[title]", CAP_ELEMENTOS).await?;
        coleccion.marcar(|el| {
            let inapropiado = !TAGS_CON_TITLE_LICITO.contains(&el.tag_name.as_str());
            inapropiado.then(|| Some(el.tag_name.to_uppercase()))
        });
        Ok(report::informar(
            with_items,
            &coleccion,
            "titledEl",
            [
                "Atributo title en un elemento __param__",
                "Hay atributos title en elementos inapropiados",
            ],
            2,
            "",
        ))
    }
}
