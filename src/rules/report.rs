//! Procedimientos comunes de recolección y reporte
//!
//! La forma recolectar-luego-informar que comparten el evaluador
//! declarativo y varios verificadores nativos: juntar elementos acotados
//! por un selector, marcar violadores (con un parámetro opcional por
//! elemento) y traducirlos a instancias uniformes.

use crate::driver::{ElementInfo, Page};
use crate::rules::{Instance, Location, RuleOutcome};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

/// Tope fijo de elementos recolectados por regla.
pub const CAP_ELEMENTOS: usize = 100;

/// Largo máximo de un extracto en una instancia.
pub const LIMITE_EXTRACTO: usize = 70;

static ESPACIOS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Copia compactada de un texto: espacios colapsados, largo acotado.
pub fn compactar(texto: &str) -> String {
    let compacto = ESPACIOS.replace_all(texto.trim(), " ");
    compacto.chars().take(LIMITE_EXTRACTO).collect()
}

/// Elementos recolectados para una regla: todos los que el selector
/// encontró y el subconjunto violador, cada uno con un parámetro opcional
/// para el mensaje.
pub struct Coleccion {
    pub todos: Vec<ElementInfo>,
    pub violadores: Vec<(ElementInfo, Option<String>)>,
}

pub async fn recolectar(
    page: &dyn Page,
    selector: &str,
    cap: usize,
) -> anyhow::Result<Coleccion> {
    let todos = page.query(selector, cap).await?;
    Ok(Coleccion {
        todos,
        violadores: Vec::new(),
    })
}

impl Coleccion {
    /// Marca como violadores los elementos que cumplen el predicado.
    pub fn marcar<F>(&mut self, mut predicado: F)
    where
        F: FnMut(&ElementInfo) -> Option<Option<String>>,
    {
        let mut violadores = Vec::new();
        for el in &self.todos {
            if let Some(parametro) = predicado(el) {
                violadores.push((el.clone(), parametro));
            }
        }
        self.violadores = violadores;
    }
}

/// Construye el resultado uniforme de una regla a partir de sus
/// violadores. `whats[0]` es la plantilla por ocurrencia (con `__param__`
/// opcional); `whats[1]` el mensaje colapsado cuando no se itemiza.
pub fn informar(
    with_items: bool,
    coleccion: &Coleccion,
    rule_id: &str,
    whats: [&str; 2],
    severidad: u8,
    summary_tag: &str,
) -> RuleOutcome {
    let total = coleccion.violadores.len();
    let mut totals = [0.0; 4];
    totals[severidad as usize] = total as f64;
    let mut instancias = Vec::new();
    if with_items {
        for (el, parametro) in &coleccion.violadores {
            let what = match parametro {
                Some(parametro) => whats[0].replace("__param__", parametro),
                None => whats[0].to_string(),
            };
            instancias.push(Instance {
                rule_id: rule_id.to_string(),
                what,
                ordinal_severity: severidad,
                tag_name: el.tag_name.to_uppercase(),
                id: el.id.clone(),
                location: Location::default(),
                excerpt: compactar(&el.text),
                count: None,
            });
        }
    } else if total > 0 {
        instancias.push(Instance {
            rule_id: rule_id.to_string(),
            what: whats[1].to_string(),
            ordinal_severity: severidad,
            tag_name: summary_tag.to_string(),
            id: String::new(),
            location: Location::default(),
            excerpt: String::new(),
            count: Some(total as u64),
        });
    }
    RuleOutcome::nueva(json!({ "total": total }), totals, instancias)
}
