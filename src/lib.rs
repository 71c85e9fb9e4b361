//
// Dometrack - Telescope dome following
// Copyright (c) 2026 Filip Szczerek <ga.software@yahoo.com>
//
// This project is licensed under the terms of the MIT license
// (see the LICENSE file for details).
//

//!
//! Dome following: keeps the dome slit aligned with the telescope and reports vignetting.
//!

pub mod algorithm;
pub mod angle;
pub mod config;
pub mod controller;
pub mod gateway;
pub mod publisher;
pub mod simulator;
pub mod telemetry;
pub mod vignetting;
pub mod workers;

pub const VERSION_STRING: &'static str = include_str!(concat!(env!("OUT_DIR"), "/version"));
