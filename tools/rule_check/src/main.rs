//! Rule set checker
//!
//! Loads a processor settings file, validates it and compiles every rule the
//! way an import would, reporting the first problem found.
//!
//! Usage: cargo run --bin rule_check settings.toml [--strict]
//!
//! Accepts `.toml`, `.ron` and `.json` settings files. `--strict` rejects
//! unknown condition and action codes even when the file does not ask for it.

use std::env;

use model_processor::config::{Config, ModelProcessorSettings};
use model_processor::foundation::logging;
use model_processor::rules::{compile_rules, HostEnvironment, Strictness};

fn main() {
    logging::init_with_level("info");

    let args: Vec<String> = env::args().collect();
    let strict = args.iter().skip(1).any(|arg| arg == "--strict");
    let paths: Vec<&String> = args.iter().skip(1).filter(|arg| !arg.starts_with("--")).collect();
    if paths.len() != 1 {
        eprintln!("Usage: {} settings.(toml|ron|json) [--strict]", args[0]);
        eprintln!("Validates processor settings and compiles their rules");
        std::process::exit(1);
    }
    let path = paths[0];

    match check(path, strict) {
        Ok(stats) => {
            println!("✅ Settings are valid: {}", path);
            println!(
                "   Rules:  {} own, {} shared in {} enabled sets, {} compiled",
                stats.own, stats.shared, stats.sets, stats.compiled
            );
        }
        Err(e) => {
            eprintln!("❌ Invalid settings {}: {}", path, e);
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct CheckStats {
    own: usize,
    shared: usize,
    sets: usize,
    compiled: usize,
}

fn check(path: &str, strict: bool) -> Result<CheckStats, Box<dyn std::error::Error>> {
    let settings = ModelProcessorSettings::load_from_file(path)?;
    settings.validate()?;

    let strictness = if strict || settings.strict_rules {
        Strictness::Strict
    } else {
        Strictness::Lenient
    };
    let host = HostEnvironment::new().with_strictness(strictness);
    let rules = compile_rules(settings.all_rules(), &host)?;

    let enabled: Vec<_> = settings.external_rules.iter().filter(|set| set.enabled).collect();
    for set in settings.external_rules.iter().filter(|set| !set.enabled) {
        log::info!("Skipping disabled rule set '{}'", set.name);
    }

    Ok(CheckStats {
        own: settings.rules.len(),
        shared: enabled.iter().map(|set| set.rules.len()).sum(),
        sets: enabled.len(),
        compiled: rules.len(),
    })
}
