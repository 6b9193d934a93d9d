//! airshift — Playlist scheduling core for the Radio Automation Engine.
//!
//! Decides, per playlist and per tick, whether a playlist may supply the
//! next automatically-scheduled track. The CLI and any future GUI consume
//! this crate; track selection and audio playback live elsewhere.

pub mod engine;
pub mod evaluator;
pub mod history;
pub mod policy;
pub mod station;
pub mod time_window;
