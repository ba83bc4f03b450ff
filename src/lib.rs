//! Render plain-text staff notation into audio
//!
//! A staff declares a tempo, a repeat range and a sequence of sections, each
//! holding one or more simultaneous voice-lines of notes. Rendering parses
//! the staff, expands the repeat range, synthesizes every note as a decaying
//! sine tone, mixes the voices of each section and concatenates the sections.

pub mod generator;
pub mod pipeline;
pub mod staff;
pub mod wav;
