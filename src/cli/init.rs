use cyclefeed::config::Config;
use owo_colors::OwoColorize;
use std::error::Error;

pub fn handle_init() -> Result<(), Box<dyn Error>> {
    if Config::exists()? {
        return Err(format!(
            "Configuration already exists at {}. Use 'cyclefeed config edit' to change it.",
            Config::config_path()?.display()
        )
        .into());
    }

    let config = Config::new();
    config.save()?;

    println!("{} Configuration initialized", "✓".green());
    println!(
        "Configuration saved to: {}",
        Config::config_path()?.display()
    );
    println!(
        "Add [[sources]] entries with 'path' and 'cycle' to run without {} flags.",
        "--source".cyan()
    );

    Ok(())
}
