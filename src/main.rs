// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
mod audio;
mod config;
mod controller;
mod gate;
mod notes;
mod playlist;
mod sequencer;
#[cfg(test)]
mod testutil;

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{crate_version, Args, Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::config::{init_sequencer_and_controller, Overrides, Settings};

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Plays the next note of a melody every time a key is pressed."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

/// Where the notes come from.
#[derive(Args)]
struct SourceArgs {
    /// The path to the keysinger config.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// An inline song in the form <LABEL>:<PITCH>,<PITCH>,...
    /// For example, lead:60,62,64,67. May be repeated.
    #[arg(long = "song", value_name = "LABEL:PITCHES")]
    songs: Vec<String>,
    /// A standard MIDI file to take notes from. May be repeated.
    #[arg(long = "midi", value_name = "PATH")]
    midi_files: Vec<PathBuf>,
    /// Which MIDI track to use: first, merged, or a track index.
    #[arg(long)]
    midi_track: Option<String>,
    /// Never fall back to the built-in songs.
    #[arg(long)]
    no_builtin: bool,
}

impl SourceArgs {
    fn into_overrides(self) -> Overrides {
        Overrides {
            config: self.config,
            songs: self.songs,
            midi_files: self.midi_files,
            midi_track: self.midi_track,
            no_builtin: self.no_builtin,
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start listening to the keyboard and singing.
    Start {
        #[command(flatten)]
        sources: SourceArgs,
        /// The minimum number of seconds between two accepted key presses.
        #[arg(short, long, allow_hyphen_values = true)]
        gate: Option<f64>,
        /// The audio device name to play through.
        #[arg(short, long)]
        device: Option<String>,
        /// How long each note sounds, e.g. 550ms.
        #[arg(long)]
        note_duration: Option<String>,
        /// The peak amplitude of each note, from 0.0 to 1.0.
        #[arg(long)]
        volume: Option<f32>,
    },
    /// Lists the songs that would be played, in order.
    Songs {
        #[command(flatten)]
        sources: SourceArgs,
    },
    /// Lists the available audio output devices.
    Devices {},
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(err = e.to_string(), "Exiting.");
            eprintln!("keysinger: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    match cli.command {
        Commands::Start {
            sources,
            gate,
            device,
            note_duration,
            volume,
        } => {
            let settings = Settings::resolve(Overrides {
                gate_seconds: gate,
                device,
                note_duration,
                volume,
                ..sources.into_overrides()
            })?;

            let controller = init_sequencer_and_controller(&settings)?;
            println!("{}", controller.sequencer().describe_playlist());
            println!(
                "Listening to the keyboard (gate {:?}). Press Ctrl+C to stop.",
                controller.sequencer().gate_interval()
            );

            controller
                .run(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!(err = e.to_string(), "Unable to listen for Ctrl+C.");
                        std::future::pending::<()>().await;
                    }
                })
                .await?;
        }
        Commands::Songs { sources } => {
            let settings = Settings::resolve(sources.into_overrides())?;
            let playlist = settings.playlist()?;

            println!("{}", playlist);
            for source in playlist.sources() {
                println!("{}:", source.label());
                for note in source.notes() {
                    println!("- {}", note);
                }
            }
        }
        Commands::Devices {} => {
            let devices = audio::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
    }

    Ok(())
}
