//! In-memory, line-oriented view of a configuration file
//!
//! `ConfigDocument` keeps every line verbatim so that content the patcher
//! does not touch is written back byte for byte, including the file's line
//! ending style and whether it ends with a newline.

use super::key::{SectionHeader, parse_header_line};
use super::syntax::{KeyMatcher, LineSyntax};
use serde::Serialize;

/// Line terminator used by a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Result of a single upsert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PatchOutcome {
    /// The assignment already read exactly as requested
    Unchanged {
        /// 1-based line of the assignment.
        line: usize,
    },
    /// An existing (possibly commented) assignment was rewritten
    Replaced {
        /// 1-based line that was rewritten.
        line: usize,
        /// Line content before the rewrite.
        previous: String,
    },
    /// A new assignment line was inserted
    Inserted {
        /// 1-based line of the new assignment.
        line: usize,
        /// Whether the section header had to be appended first.
        section_created: bool,
    },
}

impl PatchOutcome {
    /// Returns true if the document content changed
    #[must_use]
    pub fn is_change(&self) -> bool {
        !matches!(self, Self::Unchanged { .. })
    }

    /// 1-based line number the outcome refers to
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::Unchanged { line } | Self::Replaced { line, .. } | Self::Inserted { line, .. } => {
                *line
            }
        }
    }

    /// Whether a section header was created
    #[must_use]
    pub fn section_created(&self) -> bool {
        matches!(
            self,
            Self::Inserted {
                section_created: true,
                ..
            }
        )
    }
}

impl std::fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unchanged { line } => write!(f, "unchanged (line {line})"),
            Self::Replaced { line, previous } => {
                write!(f, "replaced line {line} (was: {previous})")
            }
            Self::Inserted {
                line,
                section_created: true,
            } => write!(f, "inserted at line {line} (new section)"),
            Self::Inserted { line, .. } => write!(f, "inserted at line {line}"),
        }
    }
}

/// A parsed configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    lines: Vec<String>,
    ending: LineEnding,
    trailing_newline: bool,
}

impl ConfigDocument {
    /// Splits `content` into lines, remembering the line ending style
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let ending = if content.contains("\r\n") {
            LineEnding::CrLf
        } else {
            LineEnding::Lf
        };
        let trailing_newline = content.ends_with('\n');

        let body = content.strip_suffix('\n').unwrap_or(content);
        let lines = if content.is_empty() {
            Vec::new()
        } else {
            body.split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
                .collect()
        };

        Self {
            lines,
            ending,
            trailing_newline,
        }
    }

    /// Renders the document back to text
    #[must_use]
    pub fn render(&self) -> String {
        let ending = self.ending.as_str();
        let mut out = self.lines.join(ending);
        if self.trailing_newline && !self.lines.is_empty() {
            out.push_str(ending);
        }
        out
    }

    /// All lines, without terminators
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Line ending detected at parse time
    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.ending
    }

    /// 0-based index of the first header line for `section`
    #[must_use]
    pub fn find_section(&self, section: &SectionHeader) -> Option<usize> {
        self.lines.iter().position(|l| section.matches_line(l))
    }

    /// 0-based range of body lines belonging to `section`
    ///
    /// The body runs from the line after the header up to the next header
    /// or end of file.
    #[must_use]
    pub fn section_body(&self, section: &SectionHeader) -> Option<std::ops::Range<usize>> {
        let header = self.find_section(section)?;
        let start = header + 1;
        let end = self.lines[start..]
            .iter()
            .position(|l| parse_header_line(l).is_some())
            .map_or(self.lines.len(), |offset| start + offset);
        Some(start..end)
    }

    /// 0-based indexes of lines assigning the matcher's key, commented or not
    ///
    /// With `scope` set, only lines inside that section are considered; a
    /// missing section yields no matches.
    #[must_use]
    pub fn find_assignments(
        &self,
        matcher: &KeyMatcher,
        scope: Option<&SectionHeader>,
    ) -> Vec<usize> {
        let range = match scope {
            Some(section) => match self.section_body(section) {
                Some(range) => range,
                None => return Vec::new(),
            },
            None => 0..self.lines.len(),
        };

        range
            .filter(|&i| matcher.is_assignment(&self.lines[i]))
            .collect()
    }

    /// Value of the last active assignment in `indexes`
    #[must_use]
    pub fn active_value(&self, matcher: &KeyMatcher, indexes: &[usize]) -> Option<String> {
        indexes
            .iter()
            .rev()
            .find_map(|&i| matcher.active_value(&self.lines[i]))
            .map(str::to_string)
    }

    /// Applies an upsert of `rendered` given the scan result `matches`
    ///
    /// The last entry of `matches` is rewritten if present. Otherwise the
    /// line is inserted after `section` (created at end of file if
    /// missing) or, without a section, appended at end of file. For
    /// `LineSyntax::Ssh` an appended line goes before the first `Match`
    /// block so it stays global.
    pub fn upsert(
        &mut self,
        syntax: LineSyntax,
        section: Option<&SectionHeader>,
        matches: &[usize],
        rendered: String,
    ) -> PatchOutcome {
        if let Some(&last) = matches.last() {
            if self.lines[last] == rendered {
                return PatchOutcome::Unchanged { line: last + 1 };
            }
            let previous = std::mem::replace(&mut self.lines[last], rendered);
            return PatchOutcome::Replaced {
                line: last + 1,
                previous,
            };
        }

        // Appending always leaves the file newline-terminated.
        self.trailing_newline = true;

        match section {
            Some(section) if syntax.has_sections() => {
                if let Some(header) = self.find_section(section) {
                    self.lines.insert(header + 1, rendered);
                    return PatchOutcome::Inserted {
                        line: header + 2,
                        section_created: false,
                    };
                }

                if self.lines.last().is_some_and(|l| !l.trim().is_empty()) {
                    self.lines.push(String::new());
                }
                self.lines.push(section.render());
                self.lines.push(rendered);
                PatchOutcome::Inserted {
                    line: self.lines.len(),
                    section_created: true,
                }
            }
            _ => {
                let at = match syntax {
                    LineSyntax::Ssh => self.first_match_block().unwrap_or(self.lines.len()),
                    LineSyntax::Ini => self.lines.len(),
                };
                self.lines.insert(at, rendered);
                PatchOutcome::Inserted {
                    line: at + 1,
                    section_created: false,
                }
            }
        }
    }

    fn first_match_block(&self) -> Option<usize> {
        self.lines.iter().position(|l| {
            l.split_whitespace()
                .next()
                .is_some_and(|word| word.eq_ignore_ascii_case("Match"))
        })
    }
}
