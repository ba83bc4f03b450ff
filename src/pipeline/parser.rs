//! Parser for staff notation
//!
//! Format:
//! rythm=<beats per minute>
//! loop=(<start>, <end>, <repeat_count>, <drop_last_tail>)
//! <section key=value ...>
//! (<octave>, <degree>, <duration>) (<octave>, <degree>, <duration>) ...
//! ...
//! </section>
//!
//! Directives may appear anywhere outside section blocks, exactly once each.
//! Every non-blank line of a section body is one voice-line; all voice-lines
//! of a section play at the same time.
//!
//! Notes:
//! - Degree -1 is a rest, 1 ("do") through 12 ("si") are chromatic steps
//! - Octave is an offset from the 440 Hz reference octave
//! - Duration is in beats and may be a decimal or a fraction (1.5, 1/3)

use std::collections::BTreeMap;
use std::str::FromStr;

use log::debug;

use crate::generator::tone::SynthesisError;
use crate::pipeline::literal::{read_tuple, Literal, LiteralError, Tuple, TupleReader};
use crate::pipeline::looper::LoopSpec;
use crate::pipeline::score::{Note, Score, Section, VoiceLine};

const TEMPO_DIRECTIVE: &str = "rythm=";
const LOOP_DIRECTIVE: &str = "loop=";
const SECTION_OPEN: &str = "<section";
const SECTION_CLOSE: &str = "</section>";

/// Longest source excerpt quoted in an error
const SNIPPET_LEN: usize = 40;

/// Parse errors
///
/// Parsing is all-or-nothing: any of these aborts the whole score.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MalformedScoreError {
    #[error("missing `{0}` directive")]
    MissingDirective(&'static str),
    #[error("`{0}` directive appears more than once")]
    DuplicateDirective(&'static str),
    #[error("invalid tempo `{0}`, expected a positive integer")]
    InvalidTempo(String),
    #[error("invalid loop `{fragment}`: {reason}")]
    InvalidLoop {
        fragment: String,
        reason: &'static str,
    },
    #[error("loop window {start}..={end} is outside sections 1..={sections}")]
    LoopOutOfRange {
        start: usize,
        end: usize,
        sections: usize,
    },
    #[error("invalid tuple `{fragment}`: {source}")]
    InvalidTuple {
        fragment: String,
        #[source]
        source: LiteralError,
    },
    #[error("unterminated section `{0}`")]
    UnterminatedSection(String),
    #[error("invalid attribute `{token}` in section {section}")]
    InvalidAttribute { section: usize, token: String },
    #[error("section {0} has no voice-lines")]
    EmptySection(usize),
    #[error("invalid note `{fragment}` in section {section}: {reason}")]
    InvalidNote {
        section: usize,
        fragment: String,
        reason: &'static str,
    },
    #[error("unplayable note `{fragment}` in section {section}: {source}")]
    UnplayableNote {
        section: usize,
        fragment: String,
        #[source]
        source: SynthesisError,
    },
}

/// Raw text of one `<section ...> ... </section>` block
struct SectionBlock<'a> {
    header: &'a str,
    body: &'a str,
}

/// First line of `s`, shortened for error messages
fn snippet(s: &str) -> String {
    s.trim_start()
        .lines()
        .next()
        .unwrap_or_default()
        .chars()
        .take(SNIPPET_LEN)
        .collect()
}

/// Position of the next `<section` tag (not `<sections`, `<sectional`, ...)
fn find_section_open(text: &str) -> Option<usize> {
    text.match_indices(SECTION_OPEN)
        .map(|(i, _)| i)
        .find(|&i| {
            text[i + SECTION_OPEN.len()..].starts_with(|c: char| c.is_whitespace() || c == '>')
        })
}

/// Cut the section blocks out of `text`
///
/// Returns the blocks in source order and the remaining text, which is where
/// directives live.
fn split_sections(text: &str) -> Result<(Vec<SectionBlock<'_>>, String), MalformedScoreError> {
    let mut blocks = Vec::new();
    let mut outside = String::new();
    let mut rest = text;

    while let Some(start) = find_section_open(rest) {
        outside.push_str(&rest[..start]);
        outside.push('\n');

        let unterminated = || MalformedScoreError::UnterminatedSection(snippet(&rest[start..]));
        let after_tag = &rest[start + SECTION_OPEN.len()..];
        let header_end = after_tag.find('>').ok_or_else(unterminated)?;
        let after_header = &after_tag[header_end + 1..];
        let body_end = after_header.find(SECTION_CLOSE).ok_or_else(unterminated)?;

        blocks.push(SectionBlock {
            header: &after_tag[..header_end],
            body: &after_header[..body_end],
        });
        rest = &after_header[body_end + SECTION_CLOSE.len()..];
    }

    outside.push_str(rest);
    Ok((blocks, outside))
}

/// Text following the single occurrence of `directive`
fn find_directive<'a>(
    text: &'a str,
    directive: &'static str,
) -> Result<&'a str, MalformedScoreError> {
    let mut found = text
        .match_indices(directive)
        .map(|(i, _)| &text[i + directive.len()..]);

    let first = found
        .next()
        .ok_or(MalformedScoreError::MissingDirective(directive))?;
    if found.next().is_some() {
        return Err(MalformedScoreError::DuplicateDirective(directive));
    }
    Ok(first)
}

/// Parse `rythm=<integer>`
fn parse_tempo(text: &str) -> Result<u32, MalformedScoreError> {
    let value = find_directive(text, TEMPO_DIRECTIVE)?;
    let digits_end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());

    match value[..digits_end].parse::<u32>() {
        Ok(tempo) if tempo > 0 => Ok(tempo),
        _ => Err(MalformedScoreError::InvalidTempo(format!(
            "{}{}",
            TEMPO_DIRECTIVE,
            snippet(value)
        ))),
    }
}

/// Parse `loop=(start, end, repeat_count, drop_last_tail)`
fn parse_loop(text: &str) -> Result<LoopSpec, MalformedScoreError> {
    let value = find_directive(text, LOOP_DIRECTIVE)?;
    let fragment = match value.find(')') {
        Some(close) => &value[..=close],
        None => {
            return Err(MalformedScoreError::InvalidLoop {
                fragment: snippet(value),
                reason: "missing closing `)`",
            })
        }
    };

    let values = read_tuple(fragment).map_err(|source| MalformedScoreError::InvalidTuple {
        fragment: fragment.trim().to_string(),
        source,
    })?;
    let invalid = |reason: &'static str| MalformedScoreError::InvalidLoop {
        fragment: fragment.trim().to_string(),
        reason,
    };

    let [start, end, repeat_count, drop_last_tail] = values[..] else {
        return Err(invalid(
            "expected (start, end, repeat_count, drop_last_tail)",
        ));
    };

    let index = |literal: Literal| {
        literal
            .as_int()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|&v| v >= 1)
            .ok_or_else(|| invalid("start and end must be positive integers"))
    };
    let start = index(start)?;
    let end = index(end)?;
    let repeat_count = repeat_count
        .as_int()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| invalid("repeat count must be a non-negative integer"))?;
    let drop_last_tail = drop_last_tail
        .as_bool()
        .ok_or_else(|| invalid("drop_last_tail must be a boolean"))?;

    Ok(LoopSpec::new(start, end, repeat_count, drop_last_tail))
}

/// Parse whitespace-separated `key=value` attributes of a section tag
fn parse_attributes(
    section: usize,
    header: &str,
) -> Result<BTreeMap<String, String>, MalformedScoreError> {
    header
        .split_whitespace()
        .map(|token| match token.split_once('=') {
            Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
            _ => Err(MalformedScoreError::InvalidAttribute {
                section,
                token: token.to_string(),
            }),
        })
        .collect()
}

/// Parse a single `(octave, degree, duration)` tuple
fn parse_note(section: usize, tuple: &Tuple<'_>) -> Result<Note, MalformedScoreError> {
    let invalid = |reason: &'static str| MalformedScoreError::InvalidNote {
        section,
        fragment: tuple.text.to_string(),
        reason,
    };

    let [octave, degree, duration] = tuple.values[..] else {
        return Err(invalid("expected (octave, degree, duration)"));
    };

    let octave = octave
        .as_int()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| invalid("octave must be an integer"))?;
    let degree = degree
        .as_int()
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| invalid("degree must be an integer"))?;
    let duration = duration
        .as_number()
        .ok_or_else(|| invalid("duration must be a number"))?;

    Note::new(octave, degree, duration).map_err(|source| MalformedScoreError::UnplayableNote {
        section,
        fragment: tuple.text.to_string(),
        source,
    })
}

/// Parse one line of a section body
fn parse_voice_line(section: usize, line: &str) -> Result<VoiceLine, MalformedScoreError> {
    let mut notes = Vec::new();

    for tuple in TupleReader::new(line) {
        let tuple = tuple.map_err(|source| MalformedScoreError::InvalidTuple {
            fragment: snippet(line),
            source,
        })?;
        notes.push(parse_note(section, &tuple)?);
    }

    Ok(VoiceLine::new(notes))
}

/// Parse a section block; `section` is its 1-based position
fn parse_section(
    section: usize,
    block: &SectionBlock<'_>,
) -> Result<Section, MalformedScoreError> {
    let attributes = parse_attributes(section, block.header)?;

    let voices = block
        .body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| parse_voice_line(section, line))
        .collect::<Result<Vec<_>, _>>()?;

    if voices.is_empty() {
        return Err(MalformedScoreError::EmptySection(section));
    }

    debug!(
        "section {}: {} voice(s), {} attribute(s)",
        section,
        voices.len(),
        attributes.len()
    );

    Ok(Section::new(attributes, voices))
}

/// Parse full staff text
///
/// # Example
/// ```
/// use solfa::pipeline::parse_score;
///
/// let score = parse_score(
///     "rythm=120
///      loop=(1, 1, 1, False)
///      <section name=verse>
///      (0,1,1) (0,3,1) (0,5,2)
///      (-1,1,4)
///      </section>",
/// )
/// .unwrap();
///
/// assert_eq!(score.tempo(), 120);
/// assert_eq!(score.sections().len(), 1);
/// assert_eq!(score.sections()[0].voices().len(), 2);
/// assert_eq!(score.sections()[0].attribute("name"), Some("verse"));
/// ```
pub fn parse_score(text: &str) -> Result<Score, MalformedScoreError> {
    let (blocks, outside) = split_sections(text)?;

    let tempo = parse_tempo(&outside)?;
    let loop_spec = parse_loop(&outside)?;

    let sections = blocks
        .iter()
        .enumerate()
        .map(|(i, block)| parse_section(i + 1, block))
        .collect::<Result<Vec<_>, _>>()?;

    loop_spec.check(sections.len())?;

    debug!(
        "parsed score: tempo {}, loop {}, {} section(s)",
        tempo,
        loop_spec,
        sections.len()
    );

    Ok(Score::new(tempo, loop_spec, sections))
}

impl FromStr for Score {
    type Err = MalformedScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_score(s)
    }
}
