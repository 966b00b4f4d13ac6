//! Registro y despacho de reglas
//!
//! El registro se arma una vez al arranque y de ahí en más es de solo
//! lectura: verificadores nativos incorporados, definiciones declarativas
//! embebidas y, opcionalmente, definiciones declarativas cargadas de un
//! directorio del proyecto. Una regla es válida si y solo si tiene
//! exactamente una definición; cero o más de una la vuelve inválida (se
//! anota y se salta, sin abortar la corrida).

use crate::driver::Page;
use crate::observer::Bitacora;
use crate::rules::RuleOutcome;
use crate::rules::checks;
use crate::rules::declarative::ReglaDeclarativa;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Un verificador definido con código.
#[async_trait]
pub trait RuleChecker: Send + Sync {
    fn name(&self) -> &'static str;

    /// Ejecuta la verificación contra la página.
    ///
    /// `extra` son los argumentos posicionales que el operador asignó a
    /// esta regla en el mapa de argumentos de la corrida.
    async fn check(
        &self,
        page: &dyn Page,
        with_items: bool,
        extra: &[Value],
    ) -> anyhow::Result<RuleOutcome>;
}

/// Una de las dos formas de respaldar una regla del catálogo.
#[derive(Clone)]
pub enum Definicion {
    Nativa(Arc<dyn RuleChecker>),
    Declarativa(ReglaDeclarativa),
}

static DESCRIPCIONES_EVALUATIVAS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("allCaps", "elementos hoja con texto completamente en mayúsculas de más de 7 caracteres"),
        ("autocomplete", "campos de nombre y correo sin atributo autocomplete"),
        ("docType", "documento sin declaración doctype"),
        ("linkTo", "enlaces sin destino"),
        ("miniText", "texto con fuente menor a 11 píxeles"),
        ("radioSet", "botones de radio sin agrupación estándar en fieldsets con legend"),
        ("titledEl", "atributos title en elementos inapropiados"),
    ])
});

static DESCRIPCIONES_INFORMATIVAS: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("attVal", "elementos con atributos de valores ilícitos"),
        ("elements", "datos de los elementos especificados"),
        ("title", "título de la página"),
    ])
});

/// Definiciones declarativas embebidas en el binario.
const REGLAS_DECLARATIVAS_INCORPORADAS: &[&str] = &[
    include_str!("data/imgNoAlt.json"),
    include_str!("data/hr.json"),
    include_str!("data/metaScale.json"),
];

pub struct Registry {
    evaluativas: BTreeMap<String, String>,
    informativas: BTreeMap<String, String>,
    definiciones: BTreeMap<String, Vec<Definicion>>,
}

impl Registry {
    pub fn nueva() -> Self {
        Self {
            evaluativas: BTreeMap::new(),
            informativas: BTreeMap::new(),
            definiciones: BTreeMap::new(),
        }
    }

    /// El registro incorporado: verificadores nativos más definiciones
    /// declarativas embebidas.
    pub fn incorporada() -> anyhow::Result<Self> {
        let mut registro = Self::nueva();
        for verificador in checks::evaluativos() {
            let nombre = verificador.name();
            let what = *DESCRIPCIONES_EVALUATIVAS.get(nombre).ok_or_else(|| {
                anyhow!("la regla nativa '{}' no figura en el catálogo evaluativo", nombre)
            })?;
            registro.registrar_evaluativa(nombre, what, Definicion::Nativa(verificador));
        }
        for verificador in checks::informativos() {
            let nombre = verificador.name();
            let what = *DESCRIPCIONES_INFORMATIVAS.get(nombre).ok_or_else(|| {
                anyhow!("la regla nativa '{}' no figura en el catálogo informativo", nombre)
            })?;
            registro.registrar_informativa(nombre, what, Definicion::Nativa(verificador));
        }
        for texto in REGLAS_DECLARATIVAS_INCORPORADAS {
            let regla = ReglaDeclarativa::desde_json(texto)?;
            let nombre = regla.rule_id.clone();
            let what = regla.what.clone();
            registro.registrar_evaluativa(&nombre, &what, Definicion::Declarativa(regla));
        }
        Ok(registro)
    }

    /// Anota un nombre en el catálogo evaluativo sin definición.
    pub fn declarar_evaluativa(&mut self, nombre: &str, what: &str) {
        self.evaluativas.insert(nombre.to_string(), what.to_string());
    }

    pub fn registrar_evaluativa(&mut self, nombre: &str, what: &str, definicion: Definicion) {
        self.evaluativas.insert(nombre.to_string(), what.to_string());
        self.definiciones
            .entry(nombre.to_string())
            .or_default()
            .push(definicion);
    }

    pub fn registrar_informativa(&mut self, nombre: &str, what: &str, definicion: Definicion) {
        self.informativas.insert(nombre.to_string(), what.to_string());
        self.definiciones
            .entry(nombre.to_string())
            .or_default()
            .push(definicion);
    }

    /// Carga definiciones declarativas de un directorio del proyecto.
    /// Los archivos que no parsean se anotan en la bitácora y se saltan.
    pub fn cargar_directorio(
        &mut self,
        dir: &Path,
        bitacora: &dyn Bitacora,
    ) -> anyhow::Result<usize> {
        let mut cargadas = 0;
        for entrada in std::fs::read_dir(dir)? {
            let ruta = entrada?.path();
            let extension = ruta.extension().and_then(|e| e.to_str()).unwrap_or("");
            let parseada = match extension {
                "json" => Some(
                    std::fs::read_to_string(&ruta)
                        .map_err(anyhow::Error::from)
                        .and_then(|texto| ReglaDeclarativa::desde_json(&texto)),
                ),
                "yaml" | "yml" => Some(
                    std::fs::read_to_string(&ruta)
                        .map_err(anyhow::Error::from)
                        .and_then(|texto| ReglaDeclarativa::desde_yaml(&texto)),
                ),
                _ => None,
            };
            match parseada {
                Some(Ok(regla)) => {
                    let nombre = regla.rule_id.clone();
                    let what = regla.what.clone();
                    self.registrar_evaluativa(&nombre, &what, Definicion::Declarativa(regla));
                    cargadas += 1;
                }
                Some(Err(e)) => {
                    bitacora.registrar(&format!(
                        "⚠️  Definición declarativa descartada ({}): {}",
                        ruta.display(),
                        e
                    ));
                }
                None => {}
            }
        }
        Ok(cargadas)
    }

    pub fn evaluativas(&self) -> &BTreeMap<String, String> {
        &self.evaluativas
    }

    pub fn informativas(&self) -> &BTreeMap<String, String> {
        &self.informativas
    }

    pub fn descripcion(&self, nombre: &str) -> Option<&str> {
        self.evaluativas
            .get(nombre)
            .or_else(|| self.informativas.get(nombre))
            .map(String::as_str)
    }

    pub fn en_catalogo(&self, nombre: &str) -> bool {
        self.evaluativas.contains_key(nombre) || self.informativas.contains_key(nombre)
    }

    /// La definición de la regla, solo si existe exactamente una.
    pub fn definicion_unica(&self, nombre: &str) -> Option<&Definicion> {
        match self.definiciones.get(nombre).map(Vec::as_slice) {
            Some([unica]) => Some(unica),
            _ => None,
        }
    }

    /// Resuelve la lista de selección en el orden de ejecución.
    ///
    /// El primer elemento es la polaridad: `include` corre exactamente las
    /// reglas listadas, en su orden; `exclude` corre todo el catálogo
    /// evaluativo menos las listadas, en orden de catálogo. Cualquier
    /// nombre fuera de ambos catálogos invalida la selección entera.
    pub fn resolver_seleccion(&self, seleccion: &[String]) -> anyhow::Result<Vec<String>> {
        if seleccion.len() < 2 {
            bail!("la selección necesita polaridad y al menos una regla");
        }
        let polaridad = seleccion[0].as_str();
        if polaridad != "include" && polaridad != "exclude" {
            bail!("polaridad desconocida '{}'", polaridad);
        }
        let nombres = &seleccion[1..];
        for nombre in nombres {
            if !self.en_catalogo(nombre) {
                bail!("la regla '{}' no figura en ningún catálogo", nombre);
            }
        }
        let orden = if polaridad == "include" {
            nombres.to_vec()
        } else {
            self.evaluativas
                .keys()
                .filter(|nombre| !nombres.contains(nombre))
                .cloned()
                .collect()
        };
        Ok(orden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::BitacoraMemoria;

    struct VerificadorInerte(&'static str);

    #[async_trait]
    impl RuleChecker for VerificadorInerte {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn check(
            &self,
            _page: &dyn Page,
            _with_items: bool,
            _extra: &[Value],
        ) -> anyhow::Result<RuleOutcome> {
            Ok(RuleOutcome::nueva(serde_json::json!({}), [0.0; 4], Vec::new()))
        }
    }

    fn regla_declarativa(nombre: &str) -> ReglaDeclarativa {
        ReglaDeclarativa::desde_json(&format!(
            r#"{{
              "ruleID": "{nombre}",
              "what": "una regla de prueba",
              "selector": "p",
              "complaints": {{"instance": "a", "summary": "b"}},
              "ordinalSeverity": 2,
              "summaryTagName": "P"
            }}"#
        ))
        .unwrap()
    }

    fn registro_de_prueba() -> Registry {
        let mut registro = Registry::nueva();
        registro.registrar_evaluativa(
            "roleCheck",
            "roles inválidos",
            Definicion::Nativa(Arc::new(VerificadorInerte("roleCheck"))),
        );
        registro.registrar_evaluativa(
            "sizeCheck",
            "texto demasiado chico",
            Definicion::Nativa(Arc::new(VerificadorInerte("sizeCheck"))),
        );
        registro.registrar_informativa(
            "title",
            "título de la página",
            Definicion::Nativa(Arc::new(VerificadorInerte("title"))),
        );
        registro
    }

    #[test]
    fn test_include_corre_exactamente_lo_listado_en_orden() {
        let registro = registro_de_prueba();
        let orden = registro
            .resolver_seleccion(&["include".into(), "sizeCheck".into(), "roleCheck".into()])
            .unwrap();
        assert_eq!(orden, vec!["sizeCheck", "roleCheck"]);
    }

    #[test]
    fn test_exclude_corre_el_complemento_evaluativo() {
        let registro = registro_de_prueba();
        let orden = registro
            .resolver_seleccion(&["exclude".into(), "roleCheck".into()])
            .unwrap();
        assert_eq!(orden, vec!["sizeCheck"], "Solo queda el resto del catálogo evaluativo");
    }

    #[test]
    fn test_exclude_no_incluye_informativas() {
        let registro = registro_de_prueba();
        let orden = registro
            .resolver_seleccion(&["exclude".into(), "sizeCheck".into()])
            .unwrap();
        assert!(!orden.contains(&"title".to_string()));
    }

    #[test]
    fn test_seleccion_sin_polaridad_es_invalida() {
        let registro = registro_de_prueba();
        assert!(registro.resolver_seleccion(&["roleCheck".into()]).is_err());
        assert!(
            registro
                .resolver_seleccion(&["ambos".into(), "roleCheck".into()])
                .is_err()
        );
    }

    #[test]
    fn test_regla_fantasma_invalida_la_seleccion() {
        let registro = registro_de_prueba();
        assert!(
            registro
                .resolver_seleccion(&["include".into(), "ghostRule".into()])
                .is_err()
        );
    }

    #[test]
    fn test_definicion_doble_no_es_unica() {
        let mut registro = registro_de_prueba();
        registro.registrar_evaluativa(
            "roleCheck",
            "roles inválidos",
            Definicion::Declarativa(regla_declarativa("roleCheck")),
        );
        assert!(registro.definicion_unica("roleCheck").is_none());
        assert!(registro.en_catalogo("roleCheck"), "Sigue en el catálogo");
    }

    #[test]
    fn test_nombre_sin_definicion_no_es_unico() {
        let mut registro = registro_de_prueba();
        registro.declarar_evaluativa("vacia", "regla sin respaldo");
        assert!(registro.definicion_unica("vacia").is_none());
        assert!(registro.en_catalogo("vacia"));
    }

    #[test]
    fn test_registro_incorporado_es_coherente() {
        let registro = Registry::incorporada().unwrap();
        for nombre in registro.evaluativas().keys() {
            assert!(
                registro.definicion_unica(nombre).is_some(),
                "La regla incorporada '{}' debe tener definición única",
                nombre
            );
        }
        assert!(registro.en_catalogo("imgNoAlt"));
        assert!(registro.en_catalogo("attVal"));
    }

    #[test]
    fn test_carga_de_directorio_salta_archivos_rotos() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("buena.json"),
            r#"{
              "ruleID": "buena",
              "what": "regla cargada de disco",
              "selector": "p",
              "complaints": {"instance": "a", "summary": "b"},
              "ordinalSeverity": 2,
              "summaryTagName": "P"
            }"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("rota.json"), "{ esto no es json").unwrap();
        std::fs::write(
            dir.path().join("amarilla.yaml"),
            "ruleID: amarilla\nwhat: en yaml\nselector: i\ncomplaints:\n  instance: a\n  summary: b\nordinalSeverity: 3\nsummaryTagName: I\n",
        )
        .unwrap();

        let mut registro = Registry::nueva();
        let bitacora = BitacoraMemoria::default();
        let cargadas = registro.cargar_directorio(dir.path(), &bitacora).unwrap();
        assert_eq!(cargadas, 2);
        assert!(registro.definicion_unica("buena").is_some());
        assert!(registro.definicion_unica("amarilla").is_some());
        assert!(
            bitacora.mensajes().iter().any(|m| m.contains("descartada")),
            "El archivo roto debe quedar anotado"
        );
    }
}
