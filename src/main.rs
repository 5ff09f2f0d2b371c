// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
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
use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};

use padkit::audio;
use padkit::config;
use padkit::controller::Controller;
use padkit::haptics::NoopHaptics;
use padkit::kit::Kit;
use padkit::pattern::Pattern;
use padkit::store::memory::MemoryStore;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A drum kit performance engine."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists and verifies all kits in the given directory.
    Kits {
        /// The path to the kit repository on disk.
        path: String,
    },
    /// Verifies a kit definition and, optionally, a pattern against it.
    Verify {
        /// The path to the kit file.
        kit: String,
        /// The path to the pattern file.
        pattern: Option<String>,
    },
    /// Runs a pattern against a kit on the mock backend and prints the
    /// triggers as they fire.
    Demo {
        /// The path to the kit file. Defaults to the built-in kit.
        #[arg(short, long)]
        kit: Option<String>,
        /// The path to the pattern file. Defaults to a built-in demo beat.
        #[arg(short, long)]
        pattern: Option<String>,
        /// How long to let the pattern run, in seconds.
        #[arg(short, long, default_value_t = 4)]
        seconds: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Kits { path } => {
            let kits = config::get_all_kits(&PathBuf::from(&path))?;

            if kits.is_empty() {
                println!("No kits found in {}.", path.as_str());
                return Ok(());
            }

            println!("Kits (count: {}):", kits.len());
            for kit in kits {
                println!("- {} ({} sounds, {} bpm)", kit.id, kit.sounds.len(), kit.bpm);
            }
        }
        Commands::Verify { kit, pattern } => {
            let kit = config::parse_kit(&PathBuf::from(&kit))?;
            println!("Kit {} is valid ({} sounds).", kit.id, kit.sounds.len());

            if let Some(pattern) = pattern {
                let pattern = config::parse_pattern(&PathBuf::from(&pattern))?;
                println!(
                    "Pattern {} is valid ({} beats, {} bpm).",
                    pattern.id,
                    pattern.beats.len(),
                    pattern.bpm
                );

                // Flag beats referencing sounds the kit doesn't have.
                for beat in &pattern.beats {
                    if kit.sound(&beat.sound_id).is_none() {
                        println!(
                            "Warning: beat at offset {} references unknown sound {}.",
                            beat.offset_beats, beat.sound_id
                        );
                    }
                }
            }
        }
        Commands::Demo {
            kit,
            pattern,
            seconds,
        } => {
            let kit = match kit {
                Some(kit) => config::parse_kit(&PathBuf::from(&kit))?,
                None => Kit::default_kit(),
            };
            let pattern = match pattern {
                Some(pattern) => config::parse_pattern(&PathBuf::from(&pattern))?,
                None => Pattern::demo(),
            };

            let controller = Controller::new(
                audio::get_backend("mock")?,
                Arc::new(MemoryStore::new()),
                Arc::new(NoopHaptics),
                "local",
            );
            controller.initialize();
            controller.switch_kit(kit).await?;

            let events = controller.subscribe();
            controller.play_pattern(pattern).await?;

            let deadline = tokio::time::Instant::now() + Duration::from_secs(seconds);
            loop {
                while let Ok(event) = events.try_recv() {
                    println!("{:?}", event);
                }
                if tokio::time::Instant::now() >= deadline
                    || !controller.is_pattern_playing().await
                {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }

            controller.teardown().await;
        }
    }

    Ok(())
}
