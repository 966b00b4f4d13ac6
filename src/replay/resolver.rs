//! Resolución de objetivos accesibles
//!
//! Dado un tipo de control y un texto buscado, encuentra el elemento de la
//! página que un guion de acciones quiere operar. Los candidatos se
//! examinan en orden de documento y gana el primero que satisface alguno
//! de los criterios, probados en este orden: texto visible, `aria-label`,
//! texto de los `label` asociados, texto de los elementos referidos por
//! `aria-labelledby`.

use crate::driver::{ElementInfo, Page};
use crate::replay::TipoAccion;

/// Selector que acota los candidatos al tipo de control declarado.
pub fn selector_de(tipo: TipoAccion) -> Option<&'static str> {
    match tipo {
        TipoAccion::Url => None,
        TipoAccion::Text => Some("input[type=text]"),
        TipoAccion::Radio => Some("input[type=radio]"),
        TipoAccion::Checkbox => Some("input[type=checkbox]"),
        TipoAccion::Select => Some("select"),
        TipoAccion::Button => Some("button"),
        TipoAccion::Link => Some("a"),
    }
}

/// Tope de candidatos examinados por acción.
pub const CAP_CANDIDATOS: usize = 200;

pub async fn resolver(
    page: &dyn Page,
    tipo: TipoAccion,
    which: &str,
) -> anyhow::Result<Option<ElementInfo>> {
    let Some(selector) = selector_de(tipo) else {
        return Ok(None);
    };
    let candidatos = page.query(selector, CAP_CANDIDATOS).await?;
    for candidato in candidatos {
        if coincide(page, &candidato, which).await? {
            return Ok(Some(candidato));
        }
    }
    Ok(None)
}

async fn coincide(page: &dyn Page, el: &ElementInfo, which: &str) -> anyhow::Result<bool> {
    // (1) Texto visible.
    if el.text.contains(which) {
        return Ok(true);
    }
    // (2) Atributo aria-label.
    if el.attr("aria-label").is_some_and(|v| v.contains(which)) {
        return Ok(true);
    }
    // (3) Texto concatenado de los label asociados.
    if el.labels.join(" ").contains(which) {
        return Ok(true);
    }
    // (4) Texto concatenado de los elementos referidos por aria-labelledby.
    if let Some(ids) = el.attr("aria-labelledby") {
        let mut textos = Vec::new();
        for id in ids.split_whitespace() {
            for referido in page.query(&format!("[id=\"{}\"]", id), 1).await? {
                textos.push(referido.text);
            }
        }
        if textos.join(" ").contains(which) {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FixturePage;

    #[tokio::test]
    async fn test_resuelve_por_texto_visible() {
        let pagina = FixturePage::desde_html(
            "<html><body><button>Cancelar</button><button>Enviar</button></body></html>",
        );
        let objetivo = resolver(&pagina, TipoAccion::Button, "Enviar").await.unwrap();
        assert_eq!(objetivo.unwrap().text, "Enviar");
    }

    #[tokio::test]
    async fn test_resuelve_por_aria_label() {
        let pagina = FixturePage::desde_html(
            r#"<html><body><input type="checkbox" aria-label="Acepto los términos"></body></html>"#,
        );
        let objetivo = resolver(&pagina, TipoAccion::Checkbox, "términos").await.unwrap();
        assert!(objetivo.is_some(), "Debería encontrarlo por aria-label");
    }

    #[tokio::test]
    async fn test_resuelve_por_label_asociado() {
        let pagina = FixturePage::desde_html(
            r#"<html><body><label for="e">Email</label><input type="text" id="e"></body></html>"#,
        );
        let objetivo = resolver(&pagina, TipoAccion::Text, "Email").await.unwrap();
        assert_eq!(objetivo.unwrap().id, "e");
    }

    #[tokio::test]
    async fn test_resuelve_por_aria_labelledby() {
        let pagina = FixturePage::desde_html(
            r#"<html><body>
              <span id="t1">Buscar</span><span id="t2">productos</span>
              <input type="text" aria-labelledby="t1 t2">
            </body></html>"#,
        );
        let objetivo = resolver(&pagina, TipoAccion::Text, "productos").await.unwrap();
        assert!(objetivo.is_some(), "Debería encontrarlo por aria-labelledby");
    }

    #[tokio::test]
    async fn test_respeta_el_tipo_de_control() {
        let pagina = FixturePage::desde_html(
            r#"<html><body><a href="/x">Enviar</a><button>Otra cosa</button></body></html>"#,
        );
        // "Enviar" existe, pero no como botón.
        let objetivo = resolver(&pagina, TipoAccion::Button, "Enviar").await.unwrap();
        assert!(objetivo.is_none());
    }

    #[tokio::test]
    async fn test_gana_el_primero_en_orden_de_documento() {
        let pagina = FixturePage::desde_html(
            r#"<html><body>
              <button id="b1">Guardar borrador</button>
              <button id="b2" aria-label="Guardar">OK</button>
            </body></html>"#,
        );
        let objetivo = resolver(&pagina, TipoAccion::Button, "Guardar").await.unwrap();
        assert_eq!(objetivo.unwrap().id, "b1");
    }
}
