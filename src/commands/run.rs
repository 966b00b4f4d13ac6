use crate::config::VigiaConfig;
use crate::driver::FixturePage;
use crate::observer::{
    Bitacora, BitacoraConsola, BitacoraSilenciosa, Observador, ObservadorHttp, ObservadorNulo,
};
use crate::replay::Accion;
use crate::rules::{Registry, RunOptions, RunReport, ejecutar_reglas};
use crate::stats::VigiaStats;
use crate::ui;
use colored::*;
use indicatif::ProgressBar;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Bitácora que escribe por encima de la barra de progreso.
struct BitacoraProgreso {
    pb: ProgressBar,
}

impl Bitacora for BitacoraProgreso {
    fn registrar(&self, mensaje: &str) {
        self.pb.println(mensaje);
    }
}

#[allow(clippy::too_many_arguments)]
pub fn handle_run(
    fixture: String,
    actions: Option<String>,
    rules: Option<String>,
    items: bool,
    stop_on_fail: bool,
    observe: bool,
    format: String,
    args: Option<String>,
    job_id: Option<String>,
) {
    let raiz = std::env::current_dir().unwrap_or_else(|_| Path::new(".").to_path_buf());
    let config = VigiaConfig::load(&raiz).unwrap_or_default();
    let json_mode = format == "json";

    if !json_mode {
        ui::banner();
    }

    // Página a revisar.
    let pagina = match FixturePage::desde_archivo(Path::new(&fixture)) {
        Ok(pagina) => pagina,
        Err(e) => {
            eprintln!("{} No se pudo cargar la página '{}': {}", "❌".red(), fixture, e);
            std::process::exit(2);
        }
    };

    // Barra de progreso y bitácora según el modo de salida.
    let barra = if json_mode {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message("Ejecutando reglas...");
        Some(pb)
    };
    let bitacora: Arc<dyn Bitacora> = match &barra {
        Some(pb) => Arc::new(BitacoraProgreso { pb: pb.clone() }),
        None if json_mode => Arc::new(BitacoraSilenciosa),
        None => Arc::new(BitacoraConsola),
    };

    // Registro de reglas: incorporadas más las del proyecto.
    let mut registro = match Registry::incorporada() {
        Ok(registro) => registro,
        Err(e) => {
            eprintln!("{} Registro de reglas inválido: {}", "❌".red(), e);
            std::process::exit(2);
        }
    };
    if let Some(dir) = &config.rules_dir {
        if let Err(e) = registro.cargar_directorio(&raiz.join(dir), &*bitacora) {
            bitacora.registrar(&format!(
                "⚠️  No se pudo leer el directorio de reglas '{}': {}",
                dir, e
            ));
        }
    }

    // Argumentos extra por regla.
    let args_por_regla: HashMap<String, Vec<Value>> = match args {
        None => HashMap::new(),
        Some(texto) => match serde_json::from_str(&texto) {
            Ok(mapa) => mapa,
            Err(e) => {
                eprintln!("{} Argumentos de reglas inválidos: {}", "❌".red(), e);
                std::process::exit(2);
            }
        },
    };

    let opciones = RunOptions {
        rules: rules
            .map(|lista| lista.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default(),
        with_items: items || config.with_items,
        stop_on_fail: stop_on_fail || config.stop_on_fail,
        stop_on_fail_on_error: config.stop_on_fail_on_error,
        observe: observe || config.observe,
        args: args_por_regla,
        job_id: job_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
    };

    let observador: Arc<dyn Observador> = match (&config.report_to, opciones.observe) {
        (Some(report_to), true) => Arc::new(ObservadorHttp::nuevo(
            report_to,
            &config.agent,
            Arc::clone(&bitacora),
        )),
        _ => Arc::new(ObservadorNulo),
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} No se pudo iniciar el runtime: {}", "❌".red(), e);
            std::process::exit(2);
        }
    };

    let espera_red = Duration::from_secs(config.network_idle_timeout_secs);
    let reporte: RunReport = runtime.block_on(async {
        // Reproducción previa del guion, si lo hay.
        if let Some(ruta_guion) = actions {
            let guion: Vec<Accion> = match std::fs::read_to_string(&ruta_guion)
                .map_err(anyhow::Error::from)
                .and_then(|texto| serde_json::from_str(&texto).map_err(anyhow::Error::from))
            {
                Ok(guion) => guion,
                Err(e) => {
                    eprintln!("{} Guion de acciones inválido: {}", "❌".red(), e);
                    std::process::exit(2);
                }
            };
            match crate::replay::reproducir(&pagina, &guion, espera_red, &*bitacora).await {
                Ok(desenlaces) => {
                    let saltadas = desenlaces.iter().filter(|d| !d.matched).count();
                    if saltadas > 0 {
                        bitacora.registrar(&format!(
                            "⚠️  {} acción(es) del guion sin objetivo",
                            saltadas
                        ));
                    }
                }
                Err(e) => {
                    eprintln!("{} La reproducción del guion falló: {}", "❌".red(), e);
                    std::process::exit(2);
                }
            }
        }
        ejecutar_reglas(&pagina, &registro, &opciones, &*observador, &*bitacora).await
    });

    if let Some(pb) = barra {
        pb.finish_and_clear();
    }

    // Salida.
    if json_mode {
        println!(
            "{}",
            serde_json::to_string_pretty(&reporte).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        for (regla, entrada) in &reporte.result {
            ui::imprimir_entrada(regla, entrada);
        }
        ui::imprimir_resumen(&reporte);
    }

    // Estadísticas acumuladas del proyecto.
    let mut stats = VigiaStats::cargar(&raiz);
    stats.registrar_corrida(&reporte);
    stats.guardar(&raiz);

    // Código de salida: 2 si la corrida fue impedida, 1 si hubo hallazgos
    // críticos o graves → CI falla el build.
    if reporte.data.prevented {
        std::process::exit(2);
    }
    let severos: u64 = reporte
        .result
        .values()
        .map(|entrada| entrada.totals[0] + entrada.totals[1])
        .sum();
    if severos > 0 {
        std::process::exit(1);
    }
}
