use crate::rules::Registry;
use crate::ui;
use colored::*;

pub fn handle_rules() {
    ui::banner();
    let registro = match Registry::incorporada() {
        Ok(registro) => registro,
        Err(e) => {
            eprintln!("{} Registro de reglas inválido: {}", "❌".red(), e);
            std::process::exit(2);
        }
    };
    println!("\n{}", "REGLAS EVALUATIVAS".bold());
    for (nombre, what) in registro.evaluativas() {
        println!("   {} — {}", nombre.cyan(), what);
    }
    println!("\n{}", "REGLAS INFORMATIVAS".bold());
    for (nombre, what) in registro.informativas() {
        println!("   {} — {}", nombre.cyan(), what);
    }
    println!(
        "\n{} evaluativas, {} informativas",
        registro.evaluativas().len(),
        registro.informativas().len()
    );
}
