use cyclefeed::config::Config;
use owo_colors::OwoColorize;
use std::error::Error;
use std::process::Command;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current configuration ({}):", Config::config_path()?.display());
    println!("  audio_only: {}", config.audio_only);
    println!("  audio_extensions: {:?}", config.audio_extensions);
    println!("  skip_hidden: {}", config.skip_hidden);
    println!("  recursive: {}", config.recursive);
    println!("  keep_going: {}", config.keep_going);
    println!("  volume: {}", config.volume);
    println!("  log_file: {}", config.log_file_path().display());

    if config.sources.is_empty() {
        println!("  sources: {}", "none".bright_black());
    } else {
        println!("  sources:");
        for source in &config.sources {
            println!("    {} {}", source.path.cyan(), source.cycle);
        }
    }

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Config::exists()? {
        return Err("No configuration file yet. Run 'cyclefeed init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    // Validate the config after editing, including every stored cycle
    let config = Config::load().map_err(|e| format!("Configuration validation failed: {e}"))?;
    for source in &config.sources {
        cyclefeed::SourceSpec::parse(&source.path, &source.cycle)?;
    }
    println!("Configuration saved successfully");

    Ok(())
}
