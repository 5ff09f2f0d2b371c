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

//! A drum kit performance engine: low-latency pad triggering over a pool of
//! preloaded voices, a tempo-accurate pattern scheduler, performance
//! recording, and persistence of kits, patterns, settings and sessions.

pub mod audio;
pub mod config;
pub mod controller;
pub mod events;
pub mod haptics;
pub mod kit;
pub mod pattern;
pub mod playsync;
pub mod pool;
pub mod recorder;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod store;
