//! Control parameter listing.

use clap::Args;
use std::path::PathBuf;
use widener_config::{WidenerState, state_file_path};
use widener_core::ParameterInfo;
use widener_engine::WidenerParams;

#[derive(Args)]
pub struct ParamsArgs {
    /// State file whose values to show (defaults to the user state file)
    #[arg(long, value_name = "FILE")]
    state: Option<PathBuf>,
}

pub fn run(args: ParamsArgs) -> anyhow::Result<()> {
    let path = args.state.unwrap_or_else(state_file_path);
    let current = WidenerState::load_or_default(&path)?.to_params();

    println!(
        "{:<3} {:<22} {:<24} {:>16} {:>9} {:>9}",
        "#", "ID", "NAME", "RANGE", "DEFAULT", "CURRENT"
    );
    for (index, line) in rows(&current).into_iter().enumerate() {
        println!("{index:<3} {line}");
    }
    println!("\nValues from {}", path.display());
    Ok(())
}

fn rows(current: &WidenerParams) -> Vec<String> {
    (0..current.param_count())
        .filter_map(|index| {
            let desc = current.param_info(index)?;
            let range = if desc.is_toggle() {
                "off/on".to_string()
            } else {
                format!("{}-{}{}", desc.min, desc.max, desc.unit.suffix())
            };
            Some(format!(
                "{:<22} {:<24} {:>16} {:>9} {:>9}",
                desc.string_id,
                desc.name,
                range,
                format_value(desc.is_toggle(), desc.default),
                format_value(desc.is_toggle(), current.get_param(index)),
            ))
        })
        .collect()
}

fn format_value(toggle: bool, value: f32) -> String {
    match (toggle, value >= 0.5) {
        (true, true) => "on".to_string(),
        (true, false) => "off".to_string(),
        (false, _) => format!("{value}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_all_six() {
        let lines = rows(&WidenerParams::default());
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("width_lower"));
        assert!(lines[2].contains("100-8000"));
        assert!(lines[3].contains("on"));
    }
}
