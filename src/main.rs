//! # Vigía - Motor de reglas de accesibilidad por página
//!
//! Corre muchas verificaciones independientes ("reglas") contra una página
//! cargada y produce un reporte uniforme clasificado por severidad. Antes
//! de verificar puede reproducir un guion de acciones declarativas que
//! lleva la página al estado requerido.

use clap::Parser;
use commands::{Cli, Commands};

// Módulos
pub mod commands;
pub mod config;
pub mod driver;
pub mod observer;
pub mod replay;
pub mod rules;
pub mod stats;
pub mod ui;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            fixture,
            actions,
            rules,
            items,
            stop_on_fail,
            observe,
            format,
            args,
            job_id,
        }) => {
            commands::run::handle_run(
                fixture,
                actions,
                rules,
                items,
                stop_on_fail,
                observe,
                format,
                args,
                job_id,
            );
        }
        Some(Commands::Rules) => {
            commands::rules::handle_rules();
        }
        Some(Commands::Replay { fixture, script, timeout }) => {
            commands::replay::handle_replay(fixture, script, timeout);
        }
        None => {
            // Comportamiento por defecto: mostrar el catálogo
            commands::rules::handle_rules();
        }
    }
}
