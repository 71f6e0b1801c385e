//! A timer driven chip8 virtual machine.
//!
//! The [`ChipSet`](chip8::ChipSet) holds the whole machine state, the
//! [`Emulator`](runner::Emulator) drives it from a CPU clock.
pub mod chip8;
pub mod config;
pub mod definitions;
pub mod devices;
pub mod display;
pub mod memory;
pub mod opcode;
pub mod resources;
pub mod runner;
pub mod timer;
mod error;

// reexporting for convenience
pub use error::*;
pub use runner::{Emulator, Firing};
