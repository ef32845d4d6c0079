//! `umbra init`: first-time setup.
//!
//! Creates `~/.umbra/` with a default `config.toml` plus starter
//! `persona.md` and `context_profile.md` files. Existing files are left
//! untouched so the command is safe to re-run.

use std::path::Path;
use umbra_config::AppConfig;
use umbra_core::identity::{CONTEXT_PROFILE_FILE, PERSONA_FILE};

const PERSONA_TEMPLATE: &str = concat!(
    "# Persona\n\n",
    "You are Umbra, a concise personal assistant.\n\n",
    "- Prefer using a tool over guessing\n",
    "- Keep conversational replies short\n",
    "- Ask for the missing detail when a request is incomplete\n",
);

const CONTEXT_PROFILE_TEMPLATE: &str = concat!(
    "# About Me\n\n",
    "<!-- Facts the assistant should know about you -->\n\n",
    "- Home city: (edit this)\n",
    "- Interests: (edit this)\n",
);

/// Files written into the config directory, in order.
fn starter_files() -> [(&'static str, String); 3] {
    [
        ("config.toml", AppConfig::default_toml()),
        (PERSONA_FILE, PERSONA_TEMPLATE.to_string()),
        (CONTEXT_PROFILE_FILE, CONTEXT_PROFILE_TEMPLATE.to_string()),
    ]
}

/// Write any missing starter file into `dir`. Returns the names written.
pub fn scaffold(dir: &Path) -> std::io::Result<Vec<&'static str>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();
    for (name, content) in starter_files() {
        let path = dir.join(name);
        if path.exists() {
            continue;
        }
        std::fs::write(&path, content)?;
        written.push(name);
    }
    Ok(written)
}

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();

    println!("Umbra: First-Time Setup");
    println!("=======================\n");

    let written = scaffold(&config_dir)?;
    if written.is_empty() {
        println!("  Everything already exists in {}", config_dir.display());
    }
    for name in &written {
        println!("  Created {}", config_dir.join(name).display());
    }

    println!("\nNext steps:");
    println!("   1. Edit {} and pick a provider", config_dir.join("config.toml").display());
    println!("   2. Describe yourself in {}", config_dir.join(CONTEXT_PROFILE_FILE).display());
    println!("   3. Run: umbra chat\n");

    Ok(())
}
