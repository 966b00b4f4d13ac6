pub mod replay;
pub mod rules;
pub mod run;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vigia")]
#[command(about = "Motor de reglas de accesibilidad por página", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ejecuta la selección de reglas sobre una página
    Run {
        /// Archivo HTML de la página a revisar
        fixture: String,
        /// Guion de acciones (JSON) a reproducir antes de las reglas
        #[arg(long)]
        actions: Option<String>,
        /// Selección: polaridad y reglas, separadas por comas (ej: include,allCaps,hr)
        #[arg(long)]
        rules: Option<String>,
        /// Itemiza las instancias en lugar de colapsarlas en resúmenes
        #[arg(long)]
        items: bool,
        /// Detiene la corrida tras la primera regla reprobada
        #[arg(long = "stop-on-fail")]
        stop_on_fail: bool,
        /// Notifica el avance, regla por regla, al observador configurado
        #[arg(long)]
        observe: bool,
        /// Formato de salida: text o json
        #[arg(long, default_value = "text")]
        format: String,
        /// Argumentos extra por regla, como objeto JSON (ej: {"attVal": ["dir", false, ["auto"]]})
        #[arg(long)]
        args: Option<String>,
        /// Identificador del trabajo; si falta se genera uno
        #[arg(long = "job-id")]
        job_id: Option<String>,
    },
    /// Lista el catálogo de reglas
    Rules,
    /// Reproduce un guion de acciones y muestra el desenlace por acción
    Replay {
        /// Archivo HTML de la página
        fixture: String,
        /// Guion de acciones (JSON)
        script: String,
        /// Espera de red al final del guion, en segundos
        #[arg(long)]
        timeout: Option<u64>,
    },
}
