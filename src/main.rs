use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use shader_toggler::{
    config::settings::{DEFAULT_COLLECTION_FRAMES, DEFAULT_GROUPS_FILE},
    prelude::*,
};
use strum::IntoEnumIterator;
use tracing::{error, info};

#[derive(clap::Parser)]
struct Opts {
    /// Path to the toggle group file.
    #[arg(default_value = DEFAULT_GROUPS_FILE)]
    path: PathBuf,

    /// Number of frames shaders are collected for when hunting starts.
    #[arg(long, default_value_t = DEFAULT_COLLECTION_FRAMES)]
    collection_frames: u32,

    /// Write the file back in the current format.
    #[arg(long)]
    normalize: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().init();

    let opts = Opts::parse();

    let toggler = ShaderToggler::new(TogglerConfig {
        collection_frames: opts.collection_frames,
        groups_file: opts.path,
        ..Default::default()
    });

    if let Err(err) = toggler.load_groups() {
        error!(
            "Could not load {}: {err}",
            toggler.config().groups_file.display()
        );
        return ExitCode::FAILURE;
    }

    for group in toggler.groups() {
        let counts = ShaderStage::iter()
            .map(|stage| format!("{} {stage}", group.hashes(stage).len()))
            .collect::<Vec<_>>()
            .join(", ");
        info!(
            "{} [{}] ({counts}){}",
            group.name(),
            group.toggle_key(),
            if group.is_active_at_startup() {
                ", active at startup"
            } else {
                ""
            }
        );
    }
    info!(
        "Hunting collects shaders for {} frames",
        toggler.config().collection_frames
    );

    if opts.normalize {
        if let Err(err) = toggler.save_groups() {
            error!(
                "Could not save {}: {err}",
                toggler.config().groups_file.display()
            );
            return ExitCode::FAILURE;
        }
    }

    ExitCode::SUCCESS
}
