//! Reglas sobre la presentación del texto

use crate::driver::Page;
use crate::rules::RuleOutcome;
use crate::rules::registry::RuleChecker;
use crate::rules::report::{self, CAP_ELEMENTOS};
use async_trait::async_trait;
use serde_json::Value;

/// Elementos hoja con texto completamente en mayúsculas de más de 7
/// caracteres.
pub struct AllCaps;

fn es_todo_mayusculas(texto: &str) -> bool {
    let mut letras = texto.chars().filter(|c| c.is_alphabetic()).peekable();
    letras.peek().is_some() && letras.all(|c| c.is_uppercase())
}

#[async_trait]
impl RuleChecker for AllCaps {
    fn name(&self) -> &'static str {
        "allCaps"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let mut coleccion = report::recolectar(page, "body *", CAP_ELEMENTOS).await?;
        coleccion.marcar(|el| {
            let texto = el.own_text.trim();
            (texto.chars().count() > 7 && es_todo_mayusculas(texto)).then_some(None)
        });
        Ok(report::informar(
            with_items,
            &coleccion,
            "allCaps",
            [
                "El texto del elemento está completamente en mayúsculas",
                "Hay elementos con texto completamente en mayúsculas",
            ],
            1,
            "",
        ))
    }
}

/// Texto con fuente menor a 11 píxeles.
pub struct MiniText;

#[async_trait]
impl RuleChecker for MiniText {
    fn name(&self) -> &'static str {
        "miniText"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let mut coleccion = report::recolectar(page, "body *", CAP_ELEMENTOS).await?;
        coleccion.marcar(|el| {
            let chico = el.font_size_px.is_some_and(|px| px < 11.0);
            (chico && !el.own_text.trim().is_empty()).then_some(None)
        });
        Ok(report::informar(
            with_items,
            &coleccion,
            "miniText",
            [
                "El texto tiene una fuente menor a 11 píxeles",
                "Hay textos con fuentes menores a 11 píxeles",
            ],
            2,
            "",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FixturePage;

    #[tokio::test]
    async fn test_all_caps_detecta_gritos_largos() {
        let pagina = FixturePage::desde_html(
            r#"<html><body>
              <p>AVISO IMPORTANTE</p>
              <p>OK</p>
              <p>Texto normal de siempre</p>
            </body></html>"#,
        );
        let salida = AllCaps.check(&pagina, true, &[]).await.unwrap();
        assert_eq!(salida.totals, [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(salida.standard_instances.len(), 1);
        assert!(salida.standard_instances[0].excerpt.contains("AVISO"));
    }

    #[tokio::test]
    async fn test_all_caps_ignora_textos_cortos() {
        let pagina = FixturePage::desde_html("<html><body><span>HTML</span></body></html>");
        let salida = AllCaps.check(&pagina, true, &[]).await.unwrap();
        assert_eq!(salida.totals, [0.0; 4]);
    }

    #[tokio::test]
    async fn test_mini_text_usa_el_tamano_calculado() {
        let pagina = FixturePage::desde_html(
            r#"<html><body>
              <p style="font-size: 9px">letra chica</p>
              <p style="font-size: 14px">letra legible</p>
              <p style="font-size: 8px">  </p>
            </body></html>"#,
        );
        let salida = MiniText.check(&pagina, false, &[]).await.unwrap();
        assert_eq!(salida.totals, [0.0, 0.0, 1.0, 0.0], "Solo el texto chico con contenido");
        assert_eq!(salida.standard_instances[0].count, Some(1));
    }
}
