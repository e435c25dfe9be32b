//! Audio device listing command.

use clap::Args;
use widener_io::{default_output_device, list_output_devices};

#[derive(Args)]
pub struct DevicesArgs {}

pub fn run(_args: DevicesArgs) -> anyhow::Result<()> {
    let outputs = list_output_devices()?;
    if outputs.is_empty() {
        println!("No audio output devices found.");
        return Ok(());
    }

    let default_name = default_output_device().map(|d| d.name);

    println!("Output Devices");
    println!("==============\n");
    for (idx, device) in outputs.iter().enumerate() {
        let marker = if default_name.as_deref() == Some(device.name.as_str()) {
            " (default)"
        } else {
            ""
        };
        println!(
            "  [{}] {} ({} Hz, {} ch){}",
            idx, device.name, device.default_sample_rate, device.output_channels, marker
        );
    }
    println!();
    println!("Tip: Use device index or partial name with --device:");
    println!("  widener play input.wav --device 0 --width-higher 80");

    Ok(())
}
