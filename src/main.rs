use anyhow::{bail, Context, Result};
use crossterm::style::Stylize;
use frameview::config::Settings;
use frameview::data::loaders::{dataset_name_for_path, load_file, SUPPORTED_EXTENSIONS};
use frameview::store::CallerScope;
use frameview::ui::Viewer;
use frameview::utils::app_paths::AppPaths;
use frameview::utils::logging::{init_tracing, log_path};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

mod table_display;

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    files: Vec<PathBuf>,
    overrides: Vec<(String, String)>,
    print: bool,
    generate_config: bool,
    help: bool,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => parsed.help = true,
            "--print" => parsed.print = true,
            "--generate-config" => parsed.generate_config = true,
            "--set" => {
                let pair = args.next().context("--set needs a key=value argument")?;
                let (key, value) = pair
                    .split_once('=')
                    .with_context(|| format!("Expected key=value after --set, got '{}'", pair))?;
                parsed
                    .overrides
                    .push((key.trim().to_string(), value.trim().to_string()));
            }
            flag if flag.starts_with("--") => bail!("Unknown option '{}'", flag),
            file => parsed.files.push(PathBuf::from(file)),
        }
    }
    Ok(parsed)
}

fn print_help() {
    println!("{}", "frameview - terminal viewer for tabular data".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  frameview [OPTIONS] [FILE...]");
    println!();
    println!("{}", "Options:".yellow());
    println!("  {}   - Override a setting (theme, style, block)", "--set key=value".green());
    println!("  {}           - Print a summary of the loaded data and exit", "--print".green());
    println!("  {} - Write a commented config file", "--generate-config".green());
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!(
        "{} {}",
        "Supported files:".yellow(),
        SUPPORTED_EXTENSIONS.join(", ")
    );
    println!("Press F1 inside the viewer for key bindings.");
}

fn generate_config() -> Result<()> {
    let path = Settings::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(&path, Settings::create_default_with_comments())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Configuration file created at: {}", path.display());
    Ok(())
}

fn run() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;
    if args.help {
        print_help();
        return Ok(());
    }
    if args.generate_config {
        return generate_config();
    }

    init_tracing(AppPaths::log_dir().ok().as_deref());
    if let Some(path) = log_path() {
        eprintln!("Logs are written to {}", path.display());
    }

    let mut settings = Settings::load().unwrap_or_else(|e| {
        error!("Could not load settings, using defaults: {:#}", e);
        Settings::default()
    });
    settings.apply_overrides(
        args.overrides
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str())),
    )?;
    if args.print {
        settings.block = false;
    }

    let mut objects = Vec::with_capacity(args.files.len());
    for path in &args.files {
        match load_file(path) {
            Ok(table) => objects.push((Some(dataset_name_for_path(path)), Arc::new(table))),
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                eprintln!("{}", format!("Skipping {}: {}", path.display(), e).red());
            }
        }
    }
    info!("Loaded {} of {} files", objects.len(), args.files.len());

    let block = settings.block;
    let mut viewer = Viewer::with_system_clipboard(settings);
    viewer.open(objects, &CallerScope::new());

    if block {
        viewer.run_terminal()?;
    } else {
        table_display::display_store(viewer.store());
    }
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_files_and_overrides() {
        let parsed = parse_args(args(&[
            "--set",
            "theme=dark",
            "sales.csv",
            "--print",
            "--set",
            "block = false",
            "data/orders.json",
        ]))
        .unwrap();

        assert_eq!(
            parsed.files,
            vec![PathBuf::from("sales.csv"), PathBuf::from("data/orders.json")]
        );
        assert_eq!(
            parsed.overrides,
            vec![
                ("theme".to_string(), "dark".to_string()),
                ("block".to_string(), "false".to_string())
            ]
        );
        assert!(parsed.print);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse_args(args(&["--set"])).is_err());
        assert!(parse_args(args(&["--set", "theme"])).is_err());
        assert!(parse_args(args(&["--frobnicate"])).is_err());
    }
}
