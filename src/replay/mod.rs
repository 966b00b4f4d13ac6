//! Intérprete de reproducción de acciones
//!
//! Consume un guion ordenado de acciones declarativas y lleva la página al
//! estado que las reglas necesitan: navegación para acciones `url`,
//! entrada sintética para el resto. Un objetivo no resuelto no es un
//! error: la acción se salta y queda registrada como no emparejada, para
//! que el invocador pueda afirmarlo. Al agotar el guion se espera a que la
//! red se calme, acotado por un límite; excederlo es un fallo local que
//! solo se anota en la bitácora.

pub mod resolver;

use crate::driver::{ElementInfo, Page};
use crate::observer::Bitacora;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Espera de red al final del guion, si no se configura otra.
pub const ESPERA_RED_DEFECTO: Duration = Duration::from_secs(10);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TipoAccion {
    Url,
    Text,
    Radio,
    Checkbox,
    Select,
    Button,
    Link,
}

/// Una acción declarativa de un guion.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Accion {
    #[serde(rename = "type")]
    pub tipo: TipoAccion,
    pub which: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

/// Desenlace observable de una acción reproducida.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ResultadoAccion {
    #[serde(rename = "type")]
    pub tipo: TipoAccion,
    pub which: String,
    pub matched: bool,
}

/// Reproduce el guion completo, acción por acción, y devuelve el
/// desenlace de cada una en orden.
pub async fn reproducir(
    page: &dyn Page,
    guion: &[Accion],
    espera_red: Duration,
    bitacora: &dyn Bitacora,
) -> anyhow::Result<Vec<ResultadoAccion>> {
    let mut resultados = Vec::with_capacity(guion.len());
    for accion in guion {
        let matched = if accion.tipo == TipoAccion::Url {
            page.navigate(&accion.which).await?;
            true
        } else {
            match resolver::resolver(page, accion.tipo, &accion.which).await? {
                Some(objetivo) => {
                    page.focus(&objetivo).await?;
                    aplicar_efecto(page, accion, &objetivo).await?;
                    true
                }
                None => {
                    bitacora.registrar(&format!(
                        "⚠️  Acción sin objetivo: ningún control {:?} coincide con '{}'",
                        accion.tipo, accion.which
                    ));
                    false
                }
            }
        };
        resultados.push(ResultadoAccion {
            tipo: accion.tipo,
            which: accion.which.clone(),
            matched,
        });
    }
    if let Err(e) = esperar_red(page, espera_red).await {
        bitacora.registrar(&format!(
            "⚠️  La red no quedó ociosa tras el guion ({})",
            e
        ));
    }
    Ok(resultados)
}

async fn aplicar_efecto(
    page: &dyn Page,
    accion: &Accion,
    objetivo: &ElementInfo,
) -> anyhow::Result<()> {
    match accion.tipo {
        TipoAccion::Text => {
            page.fill_text(objetivo, accion.value.as_deref().unwrap_or(""))
                .await
        }
        TipoAccion::Radio | TipoAccion::Checkbox => page.set_checked(objetivo, true).await,
        TipoAccion::Select => page.select_index(objetivo, accion.index.unwrap_or(0)).await,
        TipoAccion::Button | TipoAccion::Link => page.click(objetivo).await,
        TipoAccion::Url => Ok(()),
    }
}

async fn esperar_red(page: &dyn Page, espera: Duration) -> anyhow::Result<()> {
    match tokio::time::timeout(espera, page.wait_for_network_idle(espera)).await {
        Ok(resultado) => resultado,
        Err(_) => Err(anyhow::anyhow!(
            "tiempo de espera agotado ({} s)",
            espera.as_secs()
        )),
    }
}
