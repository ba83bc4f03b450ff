//! Repeat-range expansion
//!
//! A loop spec `(start, end, repeat_count, drop_last_tail)` names an
//! inclusive, 1-based window of sections. Expansion plays the sections before
//! the window, then the window `repeat_count + 1` times, then the rest.
//! With `drop_last_tail` the last played instance before the suffix is cut,
//! the way a written-out score ends its final repeat one section early.

use std::fmt;

use crate::pipeline::parser::MalformedScoreError;

/// Repeat range over the sections of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSpec {
    /// First section of the window (1-based)
    pub start_index: usize,
    /// Last section of the window (1-based, inclusive)
    pub end_index: usize,
    /// Additional passes over the window after the first one
    pub repeat_count: usize,
    /// Drop the final section instance of the repeated part
    pub drop_last_tail: bool,
}

impl LoopSpec {
    /// Create a loop over the 1-based inclusive window `start_index..=end_index`
    pub fn new(
        start_index: usize,
        end_index: usize,
        repeat_count: usize,
        drop_last_tail: bool,
    ) -> Self {
        Self {
            start_index,
            end_index,
            repeat_count,
            drop_last_tail,
        }
    }

    /// Check the window against the number of sections
    pub fn check(&self, sections: usize) -> Result<(), MalformedScoreError> {
        if self.start_index < 1
            || self.start_index > self.end_index
            || self.end_index > sections
        {
            return Err(MalformedScoreError::LoopOutOfRange {
                start: self.start_index,
                end: self.end_index,
                sections,
            });
        }
        Ok(())
    }

    /// Number of items the expansion produces for `sections` inputs
    pub fn expanded_len(&self, sections: usize) -> usize {
        let window = (self.end_index + 1).saturating_sub(self.start_index);
        let played = sections + window * self.repeat_count;
        if self.drop_last_tail {
            played.saturating_sub(1)
        } else {
            played
        }
    }
}

impl fmt::Display for LoopSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{},{})",
            self.start_index,
            self.end_index,
            self.repeat_count,
            if self.drop_last_tail { "True" } else { "False" }
        )
    }
}

/// Expand `items` into playback order
///
/// Returns references into `items`; repeated entries share storage.
///
/// # Example
/// ```
/// use solfa::pipeline::looper::{expand, LoopSpec};
///
/// let sections = ['A', 'B', 'C', 'D'];
/// let order = expand(&sections, &LoopSpec::new(2, 3, 1, false)).unwrap();
/// assert_eq!(order, [&'A', &'B', &'C', &'B', &'C', &'D']);
/// ```
pub fn expand<'a, T>(
    items: &'a [T],
    spec: &LoopSpec,
) -> Result<Vec<&'a T>, MalformedScoreError> {
    spec.check(items.len())?;

    let start = spec.start_index - 1;
    let end = spec.end_index;
    let window = &items[start..end];

    let mut order: Vec<&T> = Vec::with_capacity(spec.expanded_len(items.len()));
    order.extend(&items[..start]);
    for _ in 0..=spec.repeat_count {
        order.extend(window);
    }

    if spec.drop_last_tail {
        order.pop();
    }

    order.extend(&items[end..]);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;

    static SECTIONS: [char; 4] = ['A', 'B', 'C', 'D'];

    fn expand_str(spec: LoopSpec) -> String {
        expand(&SECTIONS, &spec).unwrap().into_iter().collect()
    }

    #[test]
    fn test_expand_window_repeat() {
        assert_eq!(expand_str(LoopSpec::new(2, 3, 1, false)), "ABCBCD");
    }

    #[test]
    fn test_expand_drop_last_tail() {
        assert_eq!(expand_str(LoopSpec::new(2, 3, 1, true)), "ABCBD");
    }

    #[test]
    fn test_expand_no_repeat() {
        assert_eq!(expand_str(LoopSpec::new(2, 3, 0, false)), "ABCD");
        // Only one instance is dropped
        assert_eq!(expand_str(LoopSpec::new(2, 3, 0, true)), "ABD");
    }

    #[test]
    fn test_expand_single_section_window() {
        assert_eq!(expand_str(LoopSpec::new(3, 3, 2, false)), "ABCCCD");
        assert_eq!(expand_str(LoopSpec::new(1, 1, 0, true)), "BCD");
        assert_eq!(expand_str(LoopSpec::new(4, 4, 1, true)), "ABCD");
    }

    #[test]
    fn test_expand_whole_score() {
        assert_eq!(expand_str(LoopSpec::new(1, 4, 1, false)), "ABCDABCD");
        assert_eq!(expand_str(LoopSpec::new(1, 4, 1, true)), "ABCDABC");
    }

    #[test]
    fn test_expand_returns_references() {
        let order = expand(&SECTIONS, &LoopSpec::new(2, 2, 1, false)).unwrap();
        assert!(std::ptr::eq(order[1], order[2]));
        assert!(std::ptr::eq(order[1], &SECTIONS[1]));
    }

    #[test]
    fn test_expanded_len_matches() {
        for spec in [
            LoopSpec::new(2, 3, 1, false),
            LoopSpec::new(2, 3, 1, true),
            LoopSpec::new(1, 4, 3, true),
            LoopSpec::new(4, 4, 0, false),
        ] {
            let order = expand(&SECTIONS, &spec).unwrap();
            assert_eq!(order.len(), spec.expanded_len(SECTIONS.len()));
        }
    }

    #[test]
    fn test_expand_out_of_range() {
        for spec in [
            LoopSpec::new(0, 2, 1, false),
            LoopSpec::new(3, 2, 1, false),
            LoopSpec::new(2, 5, 1, false),
        ] {
            assert!(matches!(
                expand(&SECTIONS, &spec),
                Err(MalformedScoreError::LoopOutOfRange { .. })
            ));
        }

        let empty: [char; 0] = [];
        assert!(expand(&empty, &LoopSpec::new(1, 1, 0, false)).is_err());
    }

    #[test]
    fn test_loop_display() {
        assert_eq!(LoopSpec::new(1, 2, 3, true).to_string(), "(1,2,3,True)");
    }
}
