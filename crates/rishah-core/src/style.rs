//! Output styles and their instructions
//!
//! Each requested style maps, through a fixed table, to a natural-language
//! directive for the session and the file name(s) the session is told to
//! write. The mapping is pure and does no I/O.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::path::Path;
use std::str::FromStr;

/// Single-style SVG file name, also the fallback for `mermaid`
pub const SVG_FILE: &str = "generated.svg";

/// Prose description written for the `all` style
pub const DESCRIPTION_FILE: &str = "description.txt";
/// Fenced Mermaid diagram written for the `all` style
pub const DIAGRAM_FILE: &str = "diagram.md";
/// SVG recreation written for the `all` style
pub const RECREATION_FILE: &str = "recreation.svg";

const MERMAID_FILES: &[&str] = &["generated.mmd", "generated.md"];
const DESCRIPTION_FILES: &[&str] = &["generated.txt"];
const SVG_FILES: &[&str] = &[SVG_FILE];
const ALL_FILES: &[&str] = &[DESCRIPTION_FILE, DIAGRAM_FILE, RECREATION_FILE];

/// Requested output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Mermaid diagram-as-code, only for structured diagrams
    Mermaid,
    /// Prose description
    Description,
    /// Clean SVG recreation
    Svg,
    /// SVG recreation in a hand-drawn register
    Sketch,
    /// SVG recreation in a minimal register
    Clean,
    /// SVG recreation with full detail
    Detailed,
    /// Description, conditional diagram and SVG recreation
    #[default]
    All,
}

impl OutputStyle {
    /// Every style, in table order
    pub const ALL_STYLES: [OutputStyle; 7] = [
        Self::Mermaid,
        Self::Description,
        Self::Svg,
        Self::Sketch,
        Self::Clean,
        Self::Detailed,
        Self::All,
    ];

    /// Parse a command-line style, falling back to [`OutputStyle::All`]
    #[must_use]
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            Some(s) => s.parse().unwrap_or_else(|_| {
                tracing::warn!(style = s, "unknown style, using all");
                Self::All
            }),
            None => Self::All,
        }
    }

    /// Lowercase style name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mermaid => "mermaid",
            Self::Description => "description",
            Self::Svg => "svg",
            Self::Sketch => "sketch",
            Self::Clean => "clean",
            Self::Detailed => "detailed",
            Self::All => "all",
        }
    }

    /// File names the session is told to write, in lookup order
    #[inline]
    #[must_use]
    pub const fn canonical_files(self) -> &'static [&'static str] {
        match self {
            Self::Mermaid => MERMAID_FILES,
            Self::Description => DESCRIPTION_FILES,
            Self::Svg | Self::Sketch | Self::Clean | Self::Detailed => SVG_FILES,
            Self::All => ALL_FILES,
        }
    }

    /// Name checked when the canonical files are absent
    #[inline]
    #[must_use]
    pub const fn fallback_file(self) -> Option<&'static str> {
        match self {
            Self::Mermaid => Some(SVG_FILE),
            _ => None,
        }
    }

    /// Collection mode used when the caller does not choose one
    #[inline]
    #[must_use]
    pub const fn default_collect_mode(self) -> CollectMode {
        match self {
            Self::All => CollectMode::ListOnly,
            _ => CollectMode::ContentRead,
        }
    }
}

impl Display for OutputStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown style name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output style: {0}")]
pub struct UnknownStyle(pub String);

impl FromStr for OutputStyle {
    type Err = UnknownStyle;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL_STYLES
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStyle(s.to_string()))
    }
}

/// How discovered artifacts are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectMode {
    /// Pick one artifact and read its content
    ContentRead,
    /// List every regular file without reading it
    ListOnly,
}

/// Directive and expected file names derived from a style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleInstruction {
    /// Style this instruction was built for
    pub style: OutputStyle,
    /// Natural-language directive embedded in the prompt
    pub text: String,
    /// Canonical file names, in lookup order
    pub expected_files: &'static [&'static str],
}

impl StyleInstruction {
    /// Build the instruction for `style`, naming files under `output_dir`
    #[must_use]
    pub fn for_style(style: OutputStyle, output_dir: &Path) -> Self {
        let at = |name: &str| output_dir.join(name).display().to_string();

        let text = match style {
            OutputStyle::Mermaid => format!(
                "generate a Mermaid diagram that represents this image and save it as \"{}\". \
                 Only generate Mermaid if the image is a flowchart, sequence diagram, or other \
                 structured diagram; otherwise do not create any file.",
                at(MERMAID_FILES[0])
            ),
            OutputStyle::Description => format!(
                "generate a detailed text description of this image and save it as \"{}\".",
                at(DESCRIPTION_FILES[0])
            ),
            OutputStyle::Svg => format!(
                "generate a clean SVG recreation of this diagram and save it as \"{}\".",
                at(SVG_FILE)
            ),
            OutputStyle::Sketch => format!(
                "generate a self-contained SVG recreation of this image in a hand-drawn sketch \
                 style (rough strokes, informal lettering) and save it as \"{}\".",
                at(SVG_FILE)
            ),
            OutputStyle::Clean => format!(
                "generate a self-contained SVG recreation of this image in a clean, minimal style \
                 (aligned shapes, consistent spacing, no decoration) and save it as \"{}\".",
                at(SVG_FILE)
            ),
            OutputStyle::Detailed => format!(
                "generate a self-contained SVG recreation of this image in a detailed style \
                 (every label, connector, and annotation preserved) and save it as \"{}\".",
                at(SVG_FILE)
            ),
            OutputStyle::All => format!(
                "generate multiple output styles for this image:\n\
                 1. A detailed text description saved as \"{DESCRIPTION_FILE}\"\n\
                 2. If the image contains a diagram, flowchart, sequence diagram, or any \
                 structured diagram, generate Mermaid code saved as \"{DIAGRAM_FILE}\" with \
                 proper mermaid code blocks\n\
                 3. A clean SVG recreation saved as \"{RECREATION_FILE}\"\n\n\
                 Save all files to: {}",
                output_dir.display()
            ),
        };

        Self {
            style,
            text,
            expected_files: style.canonical_files(),
        }
    }
}
