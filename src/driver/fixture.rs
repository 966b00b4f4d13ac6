//! Página de prueba respaldada por HTML parseado
//!
//! Implementa [`Page`] sobre documentos HTML estáticos: consultas por
//! selector CSS con `scraper`, hechos de asociación de etiquetas, y una
//! bitácora de eventos para las interacciones sintetizadas. El documento
//! parseado es inmutable; el estado mutable (valores, marcado, selección)
//! vive en una capa superpuesta indexada por handle.

use crate::driver::{ElementInfo, Page};
use anyhow::anyhow;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

static FONT_SIZE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)font-size\s*:\s*([0-9]+(?:\.[0-9]+)?)\s*px").unwrap());

const PAGINA_VACIA: &str = "<html><head><title></title></head><body></body></html>";

/// Interacción sintetizada u observada, en orden de ocurrencia.
#[derive(Debug, Clone, PartialEq)]
pub enum Evento {
    Navegacion(String),
    Foco(u64),
    Entrada { handle: u64, valor: String },
    Cambio(u64),
    Clic(u64),
    Recarga,
}

#[derive(Default)]
struct Estado {
    html: String,
    url: String,
    eventos: Vec<Evento>,
    /// Páginas registradas, navegables por URL.
    paginas: HashMap<String, String>,
    /// Respuestas enlatadas para `evaluate`, por fragmento de script.
    respuestas_eval: Vec<(String, Value)>,
    valores: HashMap<u64, String>,
    marcados: HashMap<u64, bool>,
    indices: HashMap<u64, usize>,
}

pub struct FixturePage {
    estado: Mutex<Estado>,
}

impl FixturePage {
    pub fn desde_html(html: &str) -> Self {
        Self {
            estado: Mutex::new(Estado {
                html: html.to_string(),
                url: "about:fixture".to_string(),
                ..Estado::default()
            }),
        }
    }

    pub fn desde_archivo(path: &Path) -> anyhow::Result<Self> {
        let html = fs::read_to_string(path)?;
        Ok(Self::desde_html(&html))
    }

    /// Registra una página navegable por URL.
    pub fn con_pagina(self, url: &str, html: &str) -> Self {
        {
            let mut estado = self.estado.lock().unwrap();
            estado.paginas.insert(url.to_string(), html.to_string());
        }
        self
    }

    /// Registra una respuesta enlatada para scripts que contengan `fragmento`.
    pub fn con_respuesta_eval(self, fragmento: &str, respuesta: Value) -> Self {
        {
            let mut estado = self.estado.lock().unwrap();
            estado
                .respuestas_eval
                .push((fragmento.to_string(), respuesta));
        }
        self
    }

    pub fn eventos(&self) -> Vec<Evento> {
        self.estado.lock().unwrap().eventos.clone()
    }

    /// Valor vigente de un campo tras las interacciones sintetizadas.
    pub fn valor_actual(&self, handle: u64) -> Option<String> {
        self.estado.lock().unwrap().valores.get(&handle).cloned()
    }

    fn elementos(html: &str, selector: &str, cap: usize) -> anyhow::Result<Vec<ElementInfo>> {
        let documento = Html::parse_document(html);
        let sel = Selector::parse(selector)
            .map_err(|e| anyhow!("selector inválido '{}': {:?}", selector, e))?;
        let sel_label = Selector::parse("label").expect("selector constante");

        // Textos de label asociados por id referenciado.
        let mut etiquetas_por_id: HashMap<String, Vec<String>> = HashMap::new();
        for etiqueta in documento.select(&sel_label) {
            if let Some(destino) = etiqueta.value().attr("for") {
                etiquetas_por_id
                    .entry(destino.to_string())
                    .or_default()
                    .push(texto_de(&etiqueta));
            }
        }

        // El handle es el índice del elemento en orden de documento; es
        // estable mientras no cambie el HTML cargado.
        let mut resultado = Vec::new();
        for (indice, el) in documento
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .enumerate()
        {
            if resultado.len() >= cap {
                break;
            }
            if sel.matches(&el) {
                resultado.push(Self::info_de(&el, indice as u64, &etiquetas_por_id));
            }
        }
        Ok(resultado)
    }

    fn info_de(
        el: &ElementRef,
        handle: u64,
        etiquetas_por_id: &HashMap<String, Vec<String>>,
    ) -> ElementInfo {
        let id = el.value().id().unwrap_or("").to_string();
        let mut labels = if id.is_empty() {
            Vec::new()
        } else {
            etiquetas_por_id.get(&id).cloned().unwrap_or_default()
        };
        for antecesor in el.ancestors() {
            if let Some(elemento) = antecesor.value().as_element() {
                if elemento.name() == "label" {
                    if let Some(envoltura) = ElementRef::wrap(antecesor) {
                        labels.push(texto_de(&envoltura));
                    }
                }
            }
        }
        let attrs: BTreeMap<String, String> = el
            .value()
            .attrs()
            .map(|(nombre, valor)| (nombre.to_string(), valor.to_string()))
            .collect();
        let font_size_px = attrs
            .get("style")
            .and_then(|estilo| FONT_SIZE.captures(estilo))
            .and_then(|captura| captura[1].parse().ok());
        ElementInfo {
            handle,
            tag_name: el.value().name().to_lowercase(),
            id,
            attrs,
            text: texto_de(el),
            own_text: texto_propio(el),
            labels,
            font_size_px,
        }
    }
}

fn texto_de(el: &ElementRef) -> String {
    el.text().collect::<String>()
}

fn texto_propio(el: &ElementRef) -> String {
    el.children()
        .filter_map(|hijo| hijo.value().as_text().map(|t| t.text.to_string()))
        .collect::<String>()
}

#[async_trait]
impl Page for FixturePage {
    async fn navigate(&self, url: &str) -> anyhow::Result<()> {
        let mut estado = self.estado.lock().unwrap();
        estado.eventos.push(Evento::Navegacion(url.to_string()));
        estado.html = estado
            .paginas
            .get(url)
            .cloned()
            .unwrap_or_else(|| PAGINA_VACIA.to_string());
        estado.url = url.to_string();
        estado.valores.clear();
        estado.marcados.clear();
        estado.indices.clear();
        Ok(())
    }

    async fn url(&self) -> anyhow::Result<String> {
        Ok(self.estado.lock().unwrap().url.clone())
    }

    async fn title(&self) -> anyhow::Result<String> {
        let html = self.estado.lock().unwrap().html.clone();
        let documento = Html::parse_document(&html);
        let sel = Selector::parse("title").expect("selector constante");
        Ok(documento
            .select(&sel)
            .next()
            .map(|el| texto_de(&el).trim().to_string())
            .unwrap_or_default())
    }

    async fn query(&self, selector: &str, cap: usize) -> anyhow::Result<Vec<ElementInfo>> {
        let html = self.estado.lock().unwrap().html.clone();
        Self::elementos(&html, selector, cap)
    }

    async fn evaluate(&self, script: &str) -> anyhow::Result<Value> {
        let estado = self.estado.lock().unwrap();
        for (fragmento, respuesta) in &estado.respuestas_eval {
            if script.contains(fragmento) {
                return Ok(respuesta.clone());
            }
        }
        Err(anyhow!("esta página no soporta evaluación de scripts"))
    }

    async fn focus(&self, el: &ElementInfo) -> anyhow::Result<()> {
        self.estado
            .lock()
            .unwrap()
            .eventos
            .push(Evento::Foco(el.handle));
        Ok(())
    }

    async fn fill_text(&self, el: &ElementInfo, value: &str) -> anyhow::Result<()> {
        let mut estado = self.estado.lock().unwrap();
        estado.valores.insert(el.handle, value.to_string());
        estado.eventos.push(Evento::Entrada {
            handle: el.handle,
            valor: value.to_string(),
        });
        Ok(())
    }

    async fn set_checked(&self, el: &ElementInfo, checked: bool) -> anyhow::Result<()> {
        let mut estado = self.estado.lock().unwrap();
        estado.marcados.insert(el.handle, checked);
        estado.eventos.push(Evento::Cambio(el.handle));
        Ok(())
    }

    async fn select_index(&self, el: &ElementInfo, index: usize) -> anyhow::Result<()> {
        let mut estado = self.estado.lock().unwrap();
        estado.indices.insert(el.handle, index);
        estado.eventos.push(Evento::Cambio(el.handle));
        Ok(())
    }

    async fn click(&self, el: &ElementInfo) -> anyhow::Result<()> {
        self.estado
            .lock()
            .unwrap()
            .eventos
            .push(Evento::Clic(el.handle));
        Ok(())
    }

    async fn wait_for_network_idle(&self, _timeout: Duration) -> anyhow::Result<()> {
        // Las páginas de prueba no generan tráfico de red.
        Ok(())
    }

    async fn reload(&self, _timeout: Duration) -> anyhow::Result<()> {
        let mut estado = self.estado.lock().unwrap();
        estado.valores.clear();
        estado.marcados.clear();
        estado.indices.clear();
        estado.eventos.push(Evento::Recarga);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagina_formulario() -> FixturePage {
        FixturePage::desde_html(
            r#"<html><head><title>Alta</title></head><body>
              <form>
                <label for="correo">Email</label>
                <input type="text" id="correo">
                <button>Submit</button>
              </form>
            </body></html>"#,
        )
    }

    #[tokio::test]
    async fn test_query_por_selector_y_cap() {
        let pagina = FixturePage::desde_html(
            "<html><body><img src='a.png'><img src='b.png' alt='b'><img src='c.png'></body></html>",
        );
        let sin_alt = pagina.query("img:not([alt])", 100).await.unwrap();
        assert_eq!(sin_alt.len(), 2, "Debería encontrar las imágenes sin alt");
        let acotado = pagina.query("img", 1).await.unwrap();
        assert_eq!(acotado.len(), 1, "El cap debe acotar los resultados");
    }

    #[tokio::test]
    async fn test_selector_invalido_es_error() {
        let pagina = FixturePage::desde_html("<html><body></body></html>");
        assert!(pagina.query("img[", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_etiquetas_asociadas_por_for_y_ancestro() {
        let pagina = FixturePage::desde_html(
            r#"<html><body>
              <label for="n">Nombre</label><input type="text" id="n">
              <label>Apellido <input type="text" id="a"></label>
            </body></html>"#,
        );
        let campos = pagina.query("input", 10).await.unwrap();
        assert_eq!(campos.len(), 2);
        assert!(campos[0].labels.join(" ").contains("Nombre"));
        assert!(campos[1].labels.join(" ").contains("Apellido"));
    }

    #[tokio::test]
    async fn test_texto_propio_y_tamano_de_fuente() {
        let pagina = FixturePage::desde_html(
            r#"<html><body><p style="font-size: 9px">chico<span>grande</span></p></body></html>"#,
        );
        let parrafos = pagina.query("p", 10).await.unwrap();
        assert_eq!(parrafos[0].own_text, "chico");
        assert_eq!(parrafos[0].text, "chicogrande");
        assert_eq!(parrafos[0].font_size_px, Some(9.0));
    }

    #[tokio::test]
    async fn test_interacciones_quedan_en_la_bitacora_de_eventos() {
        let pagina = pagina_formulario();
        let campo = pagina.query("input[type=text]", 10).await.unwrap()[0].clone();
        let boton = pagina.query("button", 10).await.unwrap()[0].clone();
        pagina.focus(&campo).await.unwrap();
        pagina.fill_text(&campo, "a@b.com").await.unwrap();
        pagina.click(&boton).await.unwrap();
        assert_eq!(pagina.valor_actual(campo.handle).as_deref(), Some("a@b.com"));
        let eventos = pagina.eventos();
        assert_eq!(
            eventos,
            vec![
                Evento::Foco(campo.handle),
                Evento::Entrada { handle: campo.handle, valor: "a@b.com".to_string() },
                Evento::Clic(boton.handle),
            ]
        );
    }

    #[tokio::test]
    async fn test_navegacion_a_pagina_registrada() {
        let pagina = FixturePage::desde_html("<html><body><p>inicio</p></body></html>")
            .con_pagina("https://ejemplo.test/destino", "<html><body><h1>destino</h1></body></html>");
        pagina.navigate("https://ejemplo.test/destino").await.unwrap();
        assert_eq!(pagina.url().await.unwrap(), "https://ejemplo.test/destino");
        let titulares = pagina.query("h1", 10).await.unwrap();
        assert_eq!(titulares.len(), 1);
    }

    #[tokio::test]
    async fn test_evaluate_con_respuesta_enlatada() {
        let pagina = FixturePage::desde_html("<html><body></body></html>")
            .con_respuesta_eval("document.doctype", serde_json::json!({ "hasDoctype": true }));
        let valor = pagina.evaluate("({hasDoctype: document.doctype !== null})").await.unwrap();
        assert_eq!(valor["hasDoctype"], true);
        assert!(pagina.evaluate("otraCosa()").await.is_err());
    }
}
