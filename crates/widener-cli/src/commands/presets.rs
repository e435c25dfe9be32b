//! Preset management commands.

use super::common::{WidenerArgs, describe_params};
use clap::{Args, Subcommand};
use widener_config::{
    WidenerState, ensure_user_presets_dir, factory_presets, is_factory_preset, list_user_presets,
    preset_name_from_path, resolve_preset, state_file_path, system_presets_dir, user_presets_dir,
    user_tables_dir,
};

#[derive(Args)]
pub struct PresetsArgs {
    #[command(subcommand)]
    command: PresetsCommand,
}

#[derive(Subcommand)]
enum PresetsCommand {
    /// List available presets (factory and user)
    List {
        /// Show only factory presets
        #[arg(long)]
        factory: bool,

        /// Show only user presets
        #[arg(long)]
        user: bool,
    },

    /// Print a preset as TOML
    Show {
        /// Preset name or path
        name: String,
    },

    /// Save widener settings as a user preset
    Save {
        /// Name for the new preset
        name: String,

        #[command(flatten)]
        widener: WidenerArgs,

        /// Description of the preset
        #[arg(short, long)]
        description: Option<String>,

        /// Overwrite if preset already exists
        #[arg(long)]
        force: bool,
    },

    /// Show preset and state locations
    Paths,
}

pub fn run(args: PresetsArgs) -> anyhow::Result<()> {
    match args.command {
        PresetsCommand::List { factory, user } => list_presets(factory, user),
        PresetsCommand::Show { name } => show_preset(&name),
        PresetsCommand::Save {
            name,
            widener,
            description,
            force,
        } => save_preset(&name, &widener, description, force),
        PresetsCommand::Paths => show_paths(),
    }
}

fn list_presets(factory_only: bool, user_only: bool) -> anyhow::Result<()> {
    if !user_only {
        println!("Factory Presets:");
        println!("================");
        for preset in factory_presets() {
            let name = preset.name.as_deref().unwrap_or("");
            let desc = preset.description.as_deref().unwrap_or("");
            println!("  {name:12} - {desc}");
            println!("  {:12}   {}", "", describe_params(&preset.to_params()));
        }
        println!();
    }

    if !factory_only {
        println!("User Presets:");
        println!("=============");
        let user_presets = list_user_presets();
        if user_presets.is_empty() {
            println!("  (none)");
            println!();
            println!("  Create a preset with: widener presets save <name> --width-higher 60\n");
        }
        for path in user_presets {
            let name = preset_name_from_path(&path).unwrap_or_else(|| "unknown".to_string());
            match WidenerState::load(&path) {
                Ok(preset) => {
                    let desc = preset.description.as_deref().unwrap_or("");
                    println!("  {name:12} - {desc}");
                }
                Err(e) => println!("  {name:12} - (error loading: {e})"),
            }
        }
        println!();
    }

    Ok(())
}

fn show_preset(name: &str) -> anyhow::Result<()> {
    let preset = resolve_preset(name)?;
    print!("{}", preset.to_toml()?);
    Ok(())
}

fn save_preset(
    name: &str,
    widener: &WidenerArgs,
    description: Option<String>,
    force: bool,
) -> anyhow::Result<()> {
    if is_factory_preset(name) {
        anyhow::bail!("'{name}' is a factory preset name; choose another name");
    }

    let dir = ensure_user_presets_dir()?;
    let path = dir.join(format!("{name}.toml"));
    if path.exists() && !force {
        anyhow::bail!(
            "Preset '{name}' already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    let mut preset = WidenerState::from_params(&widener.params()?).with_name(name);
    preset.description = description;
    preset.save(&path)?;

    println!("Saved preset '{name}' to {}", path.display());
    Ok(())
}

fn show_paths() -> anyhow::Result<()> {
    println!("State file:     {}", state_file_path().display());
    println!("User presets:   {}", user_presets_dir().display());
    println!("System presets: {}", system_presets_dir().display());
    println!("Tables:         {}", user_tables_dir().display());
    Ok(())
}
