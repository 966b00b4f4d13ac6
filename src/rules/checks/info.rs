//! Reglas informativas: juntan datos, no fallan páginas

use crate::driver::Page;
use crate::rules::RuleOutcome;
use crate::rules::registry::RuleChecker;
use crate::rules::report::{self, CAP_ELEMENTOS, compactar};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Value, json};

/// Elementos con atributos de valores ilícitos.
///
/// Argumentos extra: `[nombreDeAtributo, sonLicitos, valores]`. Si
/// `sonLicitos` es verdadero, `valores` enumera los permitidos y todo
/// otro valor es ilícito; si es falso, enumera los prohibidos.
pub struct AttVal;

#[async_trait]
impl RuleChecker for AttVal {
    fn name(&self) -> &'static str {
        "attVal"
    }

    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let nombre_attr = extra
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("attVal requiere el nombre del atributo"))?;
        let son_licitos = extra.get(1).and_then(Value::as_bool).unwrap_or(false);
        let valores: Vec<&str> = extra
            .get(2)
            .and_then(Value::as_array)
            .map(|lista| lista.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let mut coleccion =
            report::recolectar(page, &format!("[{}]", nombre_attr), CAP_ELEMENTOS).await?;
        coleccion.marcar(|el| {
            let valor = el.attr(nombre_attr).unwrap_or("");
            let ilicito = if son_licitos {
                !valores.contains(&valor)
            } else {
                valores.contains(&valor)
            };
            ilicito.then(|| Some(format!("{}=\"{}\"", nombre_attr, valor)))
        });
        let mut salida = report::informar(
            with_items,
            &coleccion,
            "attVal",
            [
                "El elemento tiene el atributo __param__ con un valor ilícito",
                "Hay elementos con atributos de valores ilícitos",
            ],
            2,
            "",
        );
        if with_items {
            if let Value::Object(datos) = &mut salida.data {
                let items: Vec<Value> = coleccion
                    .violadores
                    .iter()
                    .map(|(el, _)| {
                        json!({
                            "tagName": el.tag_name.to_uppercase(),
                            "id": el.id,
                            "textStart": compactar(&el.text),
                            "attributeValue": el.attr(nombre_attr).unwrap_or(""),
                        })
                    })
                    .collect();
                datos.insert("items".to_string(), Value::Array(items));
            }
        }
        Ok(salida)
    }
}

/// Datos de los elementos que coinciden con un selector dado por el
/// operador. Argumentos extra: `[selector]`.
pub struct Elements;

#[async_trait]
impl RuleChecker for Elements {
    fn name(&self) -> &'static str {
        "elements"
    }

    async fn check(
        &self,
        page: &dyn Page,
        _with_items: bool,
        extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let selector = extra
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("elements requiere un selector"))?;
        let elementos = page.query(selector, CAP_ELEMENTOS).await?;
        let items: Vec<Value> = elementos
            .iter()
            .map(|el| {
                json!({
                    "tagName": el.tag_name.to_uppercase(),
                    "id": el.id,
                    "text": compactar(&el.text),
                    "attrs": el.attrs,
                })
            })
            .collect();
        Ok(RuleOutcome::nueva(
            json!({ "total": items.len(), "items": items }),
            [0.0; 4],
            Vec::new(),
        ))
    }
}

/// Título de la página.
pub struct Titulo;

#[async_trait]
impl RuleChecker for Titulo {
    fn name(&self) -> &'static str {
        "title"
    }

    async fn check(
        &self,
        page: &dyn Page,
        _with_items: bool,
        _extra: &[Value],
    ) -> anyhow::Result<RuleOutcome> {
        let titulo = page.title().await?;
        Ok(RuleOutcome::nueva(json!({ "title": titulo }), [0.0; 4], Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::FixturePage;

    #[tokio::test]
    async fn test_att_val_con_valores_prohibidos() {
        let pagina = FixturePage::desde_html(
            r#"<html><body>
              <div dir="rtl">uno</div>
              <div dir="auto">dos</div>
              <div dir="ltr">tres</div>
            </body></html>"#,
        );
        let extra = [json!("dir"), json!(false), json!(["auto"])];
        let salida = AttVal.check(&pagina, true, &extra).await.unwrap();
        assert_eq!(salida.totals, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(salida.data["items"][0]["attributeValue"], "auto");
        assert!(
            salida.standard_instances[0].what.contains(r#"dir="auto""#),
            "El mensaje lleva el atributo y su valor"
        );
    }

    #[tokio::test]
    async fn test_att_val_con_valores_licitos() {
        let pagina = FixturePage::desde_html(
            r#"<html><body><div dir="rtl">a</div><div dir="raro">b</div></body></html>"#,
        );
        let extra = [json!("dir"), json!(true), json!(["ltr", "rtl", "auto"])];
        let salida = AttVal.check(&pagina, false, &extra).await.unwrap();
        assert_eq!(salida.totals, [0.0, 0.0, 1.0, 0.0]);
        assert_eq!(salida.standard_instances[0].count, Some(1));
    }

    #[tokio::test]
    async fn test_att_val_sin_argumentos_es_error() {
        let pagina = FixturePage::desde_html("<html><body></body></html>");
        assert!(AttVal.check(&pagina, true, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_elements_junta_datos_sin_totales() {
        let pagina = FixturePage::desde_html(
            r#"<html><body><h2 id="s1">Sección</h2><h2>Otra</h2></body></html>"#,
        );
        let salida = Elements.check(&pagina, false, &[json!("h2")]).await.unwrap();
        assert_eq!(salida.totals, [0.0; 4]);
        assert_eq!(salida.data["total"], 2);
        assert_eq!(salida.data["items"][0]["id"], "s1");
        assert!(salida.standard_instances.is_empty());
    }

    #[tokio::test]
    async fn test_titulo_informa_el_titulo() {
        let pagina = FixturePage::desde_html(
            "<html><head><title>Portada</title></head><body></body></html>",
        );
        let salida = Titulo.check(&pagina, false, &[]).await.unwrap();
        assert_eq!(salida.data["title"], "Portada");
    }
}
