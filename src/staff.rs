//! Staff file loading
//!
//! Staff files are dispatched on their extension. Only plain-text staffs
//! (`.txt`) are supported.

use std::fs;
use std::path::Path;

use log::info;

use crate::pipeline::parser::{parse_score, MalformedScoreError};
use crate::pipeline::score::Score;

/// Supported staff file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffFormat {
    /// Plain-text staff notation
    Text,
}

impl StaffFormat {
    /// Pick the format from a file extension
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        match extension.to_ascii_lowercase().as_str() {
            "txt" => Ok(StaffFormat::Text),
            _ => Err(LoadError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Staff loading errors
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("unsupported staff file `{0}`, expected a .txt file")]
    UnsupportedFormat(String),
    #[error("failed to read staff file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed score: {0}")]
    Malformed(#[from] MalformedScoreError),
}

/// Read and parse a staff file
pub fn load_score<P: AsRef<Path>>(path: P) -> Result<Score, LoadError> {
    let path = path.as_ref();

    let score = match StaffFormat::from_path(path)? {
        StaffFormat::Text => parse_score(&fs::read_to_string(path)?)?,
    };

    info!(
        "loaded {}: tempo {}, loop {}, {} section(s)",
        path.display(),
        score.tempo(),
        score.loop_spec(),
        score.sections().len()
    );

    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dispatch() {
        assert_eq!(
            StaffFormat::from_path(Path::new("song.txt")).unwrap(),
            StaffFormat::Text
        );
        assert_eq!(
            StaffFormat::from_path(Path::new("dir/SONG.TXT")).unwrap(),
            StaffFormat::Text
        );
        assert!(matches!(
            StaffFormat::from_path(Path::new("song.mid")),
            Err(LoadError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            StaffFormat::from_path(Path::new("song")),
            Err(LoadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_load_score() {
        let path = std::env::temp_dir().join("solfa_test_load.txt");
        fs::write(
            &path,
            "rythm=60\nloop=(1,1,0,False)\n<section>\n(0,1,1)\n</section>\n",
        )
        .unwrap();

        let score = load_score(&path).unwrap();
        assert_eq!(score.tempo(), 60);
        assert_eq!(score.sections().len(), 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("solfa_test_missing.txt");
        assert!(matches!(load_score(&path), Err(LoadError::Io(_))));
    }

    #[test]
    fn test_load_malformed() {
        let path = std::env::temp_dir().join("solfa_test_malformed.txt");
        fs::write(&path, "rythm=60\n").unwrap();

        assert!(matches!(
            load_score(&path),
            Err(LoadError::Malformed(MalformedScoreError::MissingDirective(
                "loop="
            )))
        ));

        fs::remove_file(&path).unwrap();
    }
}
