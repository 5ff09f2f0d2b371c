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

//! YAML kit and pattern definitions.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::error;

mod error;
mod kit;
mod pattern;

pub use error::ConfigError;

/// Parses a kit from a YAML file.
pub fn parse_kit(file: &Path) -> Result<crate::kit::Kit, ConfigError> {
    let parsed: kit::Kit = serde_yml::from_str(&fs::read_to_string(file)?)?;
    parsed.to_kit(file)
}

/// Parses a pattern from a YAML file.
pub fn parse_pattern(file: &Path) -> Result<crate::pattern::Pattern, ConfigError> {
    let parsed: pattern::Pattern = serde_yml::from_str(&fs::read_to_string(file)?)?;
    parsed.to_pattern(file)
}

/// Recurses into the given path and returns all valid kits found. Files that
/// fail to parse are logged and skipped.
pub fn get_all_kits(path: &PathBuf) -> Result<Vec<crate::kit::Kit>, ConfigError> {
    let mut kits: Vec<crate::kit::Kit> = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            kits.append(&mut get_all_kits(&path)?);
            continue;
        }

        let extension = path.extension();
        if extension.is_some_and(|ext| ext == "yaml" || ext == "yml") {
            match parse_kit(&path) {
                Ok(kit) => kits.push(kit),
                Err(e) => error!(path = ?path, err = %e, "Error while parsing kit file"),
            }
        }
    }

    kits.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(kits)
}

/// Derives a fallback id from a config file name.
fn id_from_file(file: &Path) -> String {
    file.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unnamed")
        .to_string()
}
