#![no_std]

// Control logic for the single-button pinhole camera.
//
// This crate stays portable across MCU firmware and host tooling by avoiding
// the Rust standard library. Hardware is reached only through the collaborator
// traits in `hal`; the firmware and emulator crates supply concrete
// implementations and drive the control loop defined here.

pub mod boot;
pub mod capture;
pub mod config;
pub mod console;
pub mod counter;
pub mod diag;
pub mod hal;
pub mod idle;
pub mod indicator;
