//! Verificadores nativos incorporados
//!
//! Cada verificador implementa [`RuleChecker`](crate::rules::registry::RuleChecker)
//! y se registra por nombre en el catálogo al arranque.

pub mod attrs;
pub mod documento;
pub mod info;
pub mod texto;

use crate::rules::registry::RuleChecker;
use std::sync::Arc;

/// Verificadores del catálogo evaluativo.
pub fn evaluativos() -> Vec<Arc<dyn RuleChecker>> {
    vec![
        Arc::new(texto::AllCaps),
        Arc::new(attrs::Autocomplete),
        Arc::new(documento::DocType),
        Arc::new(attrs::LinkTo),
        Arc::new(texto::MiniText),
        Arc::new(documento::RadioSet),
        Arc::new(attrs::TitledEl),
    ]
}

/// Verificadores del catálogo informativo: juntan datos, no fallan páginas.
pub fn informativos() -> Vec<Arc<dyn RuleChecker>> {
    vec![
        Arc::new(info::AttVal),
        Arc::new(info::Elements),
        Arc::new(info::Titulo),
    ]
}
