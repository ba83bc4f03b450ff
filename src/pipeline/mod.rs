//! Staff rendering pipeline
//!
//! Turns staff notation into audio:
//! - Parser: Parse staff notation into a score (with the literal tuple reader)
//! - Looper: Expand the loop spec into playback order
//! - Mixer: Render and sum the voice-lines of a section
//! - Renderer: Drive the whole pipeline into a waveform

pub mod literal;
pub mod looper;
pub mod mixer;
pub mod parser;
pub mod renderer;
pub mod score;

pub use looper::{expand, LoopSpec};
pub use mixer::VoiceMixer;
pub use parser::{parse_score, MalformedScoreError};
pub use renderer::{
    RenderConfig, RenderError, ScoreRenderer, Waveform, DEFAULT_FRAME_SIZE, DEFAULT_SAMPLE_RATE,
};
pub use score::{Note, Score, Section, VoiceLine};
