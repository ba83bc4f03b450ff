//! Parsed score data model
//!
//! A [`Score`] is built once by the parser and never mutated afterwards.
//! Its `Display` implementation writes notation text that the parser reads
//! back to an equal score.

use std::collections::BTreeMap;
use std::fmt;

use crate::generator::tone::{check_note, SynthesisError, REST_DEGREE};
use crate::pipeline::looper::LoopSpec;

/// A single note of a voice-line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    /// Octaves above (positive) or below (negative) the reference pitch
    pub octave_offset: i32,
    /// Chromatic scale degree: -1 for a rest, 1 ("do") through 12 ("si")
    pub degree: i32,
    /// Length in tempo beats
    pub duration_units: f64,
}

impl Note {
    /// Create a validated note
    pub fn new(
        octave_offset: i32,
        degree: i32,
        duration_units: f64,
    ) -> Result<Self, SynthesisError> {
        check_note(octave_offset, degree, duration_units)?;
        Ok(Self {
            octave_offset,
            degree,
            duration_units,
        })
    }

    /// Create a rest lasting `duration_units` beats
    pub fn rest(duration_units: f64) -> Result<Self, SynthesisError> {
        Self::new(0, REST_DEGREE, duration_units)
    }

    /// Whether this note is silent
    pub fn is_rest(&self) -> bool {
        self.degree == REST_DEGREE
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{})",
            self.octave_offset, self.degree, self.duration_units
        )
    }
}

/// One melodic strand of a section
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceLine {
    notes: Vec<Note>,
}

impl VoiceLine {
    /// Create a voice-line from notes played back to back
    pub fn new(notes: Vec<Note>) -> Self {
        Self { notes }
    }

    /// Notes in playing order
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }
}

/// A block of simultaneous voice-lines, the unit the loop addresses
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Free-form `key=value` metadata from the opening tag
    attributes: BTreeMap<String, String>,
    voices: Vec<VoiceLine>,
}

impl Section {
    /// Create a section from its tag attributes and voice-lines
    pub fn new(attributes: BTreeMap<String, String>, voices: Vec<VoiceLine>) -> Self {
        Self { attributes, voices }
    }

    /// All attributes, sorted by key
    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Value of a single attribute
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Voice-lines that play simultaneously
    pub fn voices(&self) -> &[VoiceLine] {
        &self.voices
    }
}

/// A complete parsed staff
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    tempo: u32,
    loop_spec: LoopSpec,
    sections: Vec<Section>,
}

impl Score {
    /// Assemble a score; the loop is expected to fit `sections`
    pub(crate) fn new(tempo: u32, loop_spec: LoopSpec, sections: Vec<Section>) -> Self {
        Self {
            tempo,
            loop_spec,
            sections,
        }
    }

    /// Beats per minute
    pub fn tempo(&self) -> u32 {
        self.tempo
    }

    /// Section loop applied at render time
    pub fn loop_spec(&self) -> &LoopSpec {
        &self.loop_spec
    }

    /// Sections in source order
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rythm={}", self.tempo)?;
        writeln!(f, "loop={}", self.loop_spec)?;

        for section in &self.sections {
            write!(f, "<section")?;
            for (key, value) in &section.attributes {
                write!(f, " {}={}", key, value)?;
            }
            writeln!(f, ">")?;

            for voice in &section.voices {
                let line: Vec<String> = voice.notes.iter().map(Note::to_string).collect();
                writeln!(f, "{}", line.join(" "))?;
            }
            writeln!(f, "</section>")?;
        }

        Ok(())
    }
}
