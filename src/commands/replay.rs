use crate::driver::FixturePage;
use crate::observer::BitacoraConsola;
use crate::replay::{Accion, ESPERA_RED_DEFECTO, reproducir};
use crate::ui;
use colored::*;
use std::path::Path;
use std::time::Duration;

pub fn handle_replay(fixture: String, script: String, timeout: Option<u64>) {
    ui::banner();
    let pagina = match FixturePage::desde_archivo(Path::new(&fixture)) {
        Ok(pagina) => pagina,
        Err(e) => {
            eprintln!("{} No se pudo cargar la página '{}': {}", "❌".red(), fixture, e);
            std::process::exit(2);
        }
    };
    let guion: Vec<Accion> = match std::fs::read_to_string(&script)
        .map_err(anyhow::Error::from)
        .and_then(|texto| serde_json::from_str(&texto).map_err(anyhow::Error::from))
    {
        Ok(guion) => guion,
        Err(e) => {
            eprintln!("{} Guion de acciones inválido: {}", "❌".red(), e);
            std::process::exit(2);
        }
    };
    let espera = timeout
        .map(Duration::from_secs)
        .unwrap_or(ESPERA_RED_DEFECTO);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} No se pudo iniciar el runtime: {}", "❌".red(), e);
            std::process::exit(2);
        }
    };
    let desenlaces = match runtime.block_on(reproducir(&pagina, &guion, espera, &BitacoraConsola))
    {
        Ok(desenlaces) => desenlaces,
        Err(e) => {
            eprintln!("{} La reproducción falló: {}", "❌".red(), e);
            std::process::exit(2);
        }
    };

    println!();
    for desenlace in &desenlaces {
        if desenlace.matched {
            println!("   ✅ {:?} '{}'", desenlace.tipo, desenlace.which);
        } else {
            println!(
                "   ⚠️  {:?} '{}' {}",
                desenlace.tipo,
                desenlace.which,
                "(sin objetivo)".yellow()
            );
        }
    }
    let emparejadas = desenlaces.iter().filter(|d| d.matched).count();
    println!(
        "\n{} de {} acción(es) emparejadas",
        emparejadas,
        desenlaces.len()
    );
}
