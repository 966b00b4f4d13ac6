//! Costura con el driver de automatización del navegador
//!
//! El motor no conoce ningún backend concreto: toda interacción con la
//! página pasa por el trait [`Page`]. `FixturePage` es la implementación
//! incluida en el repo (páginas de prueba en HTML); un backend de
//! producción (CDP/WebDriver) se conecta detrás del mismo trait.

pub mod fixture;

pub use fixture::FixturePage;

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Hechos observables de un elemento, tal como los entrega el driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementInfo {
    /// Identificador opaco del elemento dentro de la página cargada.
    pub handle: u64,
    /// Nombre de etiqueta en minúsculas.
    pub tag_name: String,
    pub id: String,
    pub attrs: BTreeMap<String, String>,
    /// Texto completo, incluyendo descendientes.
    pub text: String,
    /// Texto directo del elemento, sin descendientes.
    pub own_text: String,
    /// Textos de los elementos `label` asociados.
    pub labels: Vec<String>,
    /// Tamaño de fuente calculado, si el driver lo conoce.
    pub font_size_px: Option<f64>,
}

impl ElementInfo {
    pub fn attr(&self, nombre: &str) -> Option<&str> {
        self.attrs.get(nombre).map(String::as_str)
    }

    pub fn has_attr(&self, nombre: &str) -> bool {
        self.attrs.contains_key(nombre)
    }
}

/// Una página cargada, manejada por un driver de navegador.
///
/// Las operaciones de navegación, interacción y espera de red son los
/// únicos puntos de suspensión del motor; todo lo demás es síncrono.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> anyhow::Result<()>;

    async fn url(&self) -> anyhow::Result<String>;

    async fn title(&self) -> anyhow::Result<String>;

    /// Busca elementos por selector CSS, acotado a `cap` resultados.
    async fn query(&self, selector: &str, cap: usize) -> anyhow::Result<Vec<ElementInfo>>;

    /// Evalúa un script opaco en el contexto de la página y devuelve su
    /// resultado como JSON estructurado.
    async fn evaluate(&self, script: &str) -> anyhow::Result<Value>;

    async fn focus(&self, el: &ElementInfo) -> anyhow::Result<()>;

    /// Fija el valor de un campo de texto y dispara la señal de entrada.
    async fn fill_text(&self, el: &ElementInfo, value: &str) -> anyhow::Result<()>;

    /// Fija el estado marcado y dispara la señal de cambio.
    async fn set_checked(&self, el: &ElementInfo, checked: bool) -> anyhow::Result<()>;

    /// Fija el índice seleccionado y dispara la señal de cambio.
    async fn select_index(&self, el: &ElementInfo, index: usize) -> anyhow::Result<()>;

    /// Simula la activación de un botón o enlace.
    async fn click(&self, el: &ElementInfo) -> anyhow::Result<()>;

    /// Espera a que la actividad de red se calme, acotado por `timeout`.
    async fn wait_for_network_idle(&self, timeout: Duration) -> anyhow::Result<()>;

    async fn reload(&self, timeout: Duration) -> anyhow::Result<()>;
}
