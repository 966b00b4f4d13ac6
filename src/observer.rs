//! Bitácora inyectable y notificación de avance al observador externo
//!
//! El motor nunca escribe a consola ni abre conexiones por su cuenta:
//! registra a través de [`Bitacora`] y notifica a través de [`Observador`],
//! capacidades que el invocador inyecta. El contrato del observador es
//! "registrar, nunca fallar": un error de notificación se anota y se
//! descarta, sin reintentos y sin tocar el reporte de la corrida.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identificador de agente que viaja en las notificaciones.
pub const AGENTE_DEFECTO: &str = "vigia";

pub trait Bitacora: Send + Sync {
    fn registrar(&self, mensaje: &str);
}

/// Bitácora de consola: el comportamiento clásico del CLI.
pub struct BitacoraConsola;

impl Bitacora for BitacoraConsola {
    fn registrar(&self, mensaje: &str) {
        println!("{}", mensaje);
    }
}

/// Bitácora que descarta todo; útil cuando la salida debe quedar limpia
/// (modo JSON) y en pruebas.
pub struct BitacoraSilenciosa;

impl Bitacora for BitacoraSilenciosa {
    fn registrar(&self, _mensaje: &str) {}
}

/// Bitácora que acumula los mensajes en memoria.
#[derive(Default)]
pub struct BitacoraMemoria {
    mensajes: Mutex<Vec<String>>,
}

impl BitacoraMemoria {
    pub fn mensajes(&self) -> Vec<String> {
        self.mensajes.lock().unwrap().clone()
    }
}

impl Bitacora for BitacoraMemoria {
    fn registrar(&self, mensaje: &str) {
        self.mensajes.lock().unwrap().push(mensaje.to_string());
    }
}

/// Receptor de avisos de avance, regla por regla.
pub trait Observador: Send + Sync {
    fn notificar_regla(&self, job_id: &str, regla: &str, what: &str);
}

/// Observador que no notifica a nadie.
pub struct ObservadorNulo;

impl Observador for ObservadorNulo {
    fn notificar_regla(&self, _job_id: &str, _regla: &str, _what: &str) {}
}

/// Deriva la URL del observador sustituyendo el último segmento de la
/// ruta del endpoint de envío de reportes por `granular`.
pub fn derivar_url_observador(report_to: &str) -> String {
    match report_to.rfind('/') {
        Some(posicion) => format!("{}granular", &report_to[..=posicion]),
        None => "granular".to_string(),
    }
}

/// Observador HTTP: un GET de ida, sin consumir el cuerpo de la respuesta.
pub struct ObservadorHttp {
    url_observador: String,
    agente: String,
    bitacora: Arc<dyn Bitacora>,
}

impl ObservadorHttp {
    pub fn nuevo(report_to: &str, agente: &str, bitacora: Arc<dyn Bitacora>) -> Self {
        Self {
            url_observador: derivar_url_observador(report_to),
            agente: agente.to_string(),
            bitacora,
        }
    }
}

impl Observador for ObservadorHttp {
    fn notificar_regla(&self, job_id: &str, regla: &str, what: &str) {
        let url = self.url_observador.clone();
        let agente = self.agente.clone();
        let job_id = job_id.to_string();
        let regla = regla.to_string();
        let what = what.to_string();
        let bitacora = Arc::clone(&self.bitacora);
        // Hilo suelto: la notificación jamás bloquea ni afecta la corrida.
        std::thread::spawn(move || {
            let cliente = match reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(5))
                .build()
            {
                Ok(cliente) => cliente,
                Err(e) => {
                    bitacora.registrar(&format!("⚠️  ERROR al notificar al observador ({})", e));
                    return;
                }
            };
            let respuesta = cliente
                .get(&url)
                .query(&[
                    ("agent", agente.as_str()),
                    ("jobID", job_id.as_str()),
                    ("act", "test"),
                    ("which", AGENTE_DEFECTO),
                    ("rule", regla.as_str()),
                    ("ruleWhat", what.as_str()),
                ])
                .send();
            match respuesta {
                Ok(r) if !r.status().is_success() => {
                    bitacora.registrar(&format!(
                        "⚠️  ERROR al notificar al observador (status {})",
                        r.status()
                    ));
                }
                Err(e) => {
                    bitacora.registrar(&format!("⚠️  ERROR al notificar al observador ({})", e));
                }
                _ => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivacion_sustituye_solo_el_ultimo_segmento() {
        assert_eq!(
            derivar_url_observador("https://servidor.test/api/report"),
            "https://servidor.test/api/granular"
        );
        assert_eq!(
            derivar_url_observador("https://servidor.test/api/"),
            "https://servidor.test/api/granular"
        );
    }

    #[test]
    fn test_bitacora_en_memoria_acumula() {
        let bitacora = BitacoraMemoria::default();
        bitacora.registrar("uno");
        bitacora.registrar("dos");
        assert_eq!(bitacora.mensajes(), vec!["uno", "dos"]);
    }
}
