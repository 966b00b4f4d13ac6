//! Ayudantes de presentación en consola

use crate::config::VIGIA_VERSION;
use crate::rules::{RuleEntry, RunReport};
use colored::*;

pub fn banner() {
    println!("{}", "─".repeat(52).dimmed());
    println!("  👁  {} v{}", "Vigía".bold().cyan(), VIGIA_VERSION);
    println!("{}", "─".repeat(52).dimmed());
}

/// Icono y rótulo de una severidad ordinal (0 la más severa).
pub fn rotulo_severidad(severidad: u8) -> ColoredString {
    match severidad {
        0 => "🟥 CRÍTICO ".red().bold(),
        1 => "🟧 GRAVE   ".red(),
        2 => "🟨 MODERADO".yellow(),
        _ => "🟦 LEVE    ".blue(),
    }
}

pub fn imprimir_entrada(regla: &str, entrada: &RuleEntry) {
    println!("\n📋 {} — {}", regla.bold().cyan(), entrada.what);
    if entrada.data.get("prevented").and_then(|v| v.as_bool()) == Some(true) {
        println!("   {} la regla no pudo completarse", "⛔".red());
        return;
    }
    for instancia in &entrada.standard_instances {
        let donde = if instancia.id.is_empty() {
            instancia.tag_name.clone()
        } else {
            format!("{}#{}", instancia.tag_name, instancia.id)
        };
        let conteo = instancia
            .count
            .map(|n| format!(" ×{}", n))
            .unwrap_or_default();
        println!(
            "   {} [{}{}]: {}",
            rotulo_severidad(instancia.ordinal_severity),
            donde.dimmed(),
            conteo,
            instancia.what
        );
        if !instancia.excerpt.is_empty() {
            println!("      {} {}", "»".dimmed(), instancia.excerpt.dimmed());
        }
    }
}

pub fn imprimir_resumen(reporte: &RunReport) {
    let mut totales = [0u64; 4];
    for entrada in reporte.result.values() {
        for (cubeta, total) in entrada.totals.iter().enumerate() {
            totales[cubeta] += total;
        }
    }
    println!();
    if totales.iter().all(|t| *t == 0) {
        println!("✅ Sin problemas detectados en {} regla(s).", reporte.result.len());
    } else {
        println!(
            "🚩 {} crítico(s)  🟧 {} grave(s)  🟨 {} moderado(s)  🟦 {} leve(s)",
            totales[0].to_string().red().bold(),
            totales[1].to_string().red(),
            totales[2].to_string().yellow(),
            totales[3].to_string().blue()
        );
    }
    if !reporte.data.rule_preventions.is_empty() {
        println!(
            "⛔ Reglas impedidas: {}",
            reporte.data.rule_preventions.join(", ").red()
        );
    }
    if !reporte.data.rules_invalid.is_empty() {
        println!(
            "❓ Reglas inválidas: {}",
            reporte.data.rules_invalid.join(", ").yellow()
        );
    }
    if !reporte.data.rule_test_times.is_empty() {
        let mas_lentas: Vec<String> = reporte
            .data
            .rule_test_times
            .iter()
            .take(3)
            .map(|t| format!("{} ({}s)", t.rule, t.seconds))
            .collect();
        println!("{}", format!("⏱  Más lentas: {}", mas_lentas.join(", ")).dimmed());
    }
}
