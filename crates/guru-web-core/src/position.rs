//! Mapping of editor selections onto raw byte offsets.
//!
//! Editors report `line.col` pairs (both 1-indexed); the analysis engine
//! addresses source by byte offset. Lines are delimited by `'\n'` only, so a
//! `'\r'` preceding it counts as an ordinary byte of the line.

use std::fmt;
use std::str::FromStr;

use crate::error::{PositionError, SelectionParseError};

/// A 1-indexed line/column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// Byte offset of this position inside `buf`.
    ///
    /// Line `L` starts right after the `(L-1)`-th `'\n'`. The column is not
    /// checked against the length of the line, so a column past the end of a
    /// line yields an offset past its content.
    pub fn byte_offset_in(&self, buf: &[u8]) -> Result<usize, PositionError> {
        if self.line == 0 || self.col == 0 {
            return Err(PositionError::ZeroIndex {
                line: self.line,
                col: self.col,
            });
        }
        let line_start = if self.line == 1 {
            0
        } else {
            match memchr::memchr_iter(b'\n', buf).nth(self.line - 2) {
                Some(newline) => newline + 1,
                None => {
                    return Err(PositionError::NoSuchLine {
                        line: self.line,
                        lines: line_count(buf),
                    });
                }
            }
        };
        line_start
            .checked_add(self.col - 1)
            .ok_or(PositionError::Overflow {
                line: self.line,
                col: self.col,
            })
    }
}

/// A selection between two positions, both inclusive.
///
/// `start <= end` is expected but not enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    /// Convert to a half-open byte range. The end position names the last
    /// selected character, so the range end is one past its offset.
    pub fn byte_offsets_in(&self, buf: &[u8]) -> Result<ByteRange, PositionError> {
        let start = self.start.byte_offset_in(buf)?;
        let end = self
            .end
            .byte_offset_in(buf)?
            .checked_add(1)
            .ok_or(PositionError::Overflow {
                line: self.end.line,
                col: self.end.col,
            })?;
        Ok(ByteRange { start, end })
    }
}

impl FromStr for Selection {
    type Err = SelectionParseError;

    /// Parse `startLine.startCol-endLine.endCol`.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |reason| SelectionParseError {
            input: input.to_string(),
            reason,
        };
        let (start, end) = input
            .split_once('-')
            .ok_or_else(|| fail("expected '-' between start and end"))?;
        Ok(Selection {
            start: parse_position(start).ok_or_else(|| fail("invalid start position"))?,
            end: parse_position(end).ok_or_else(|| fail("invalid end position"))?,
        })
    }
}

fn parse_position(value: &str) -> Option<Position> {
    let (line, col) = value.split_once('.')?;
    Some(Position::new(parse_decimal(line)?, parse_decimal(col)?))
}

// `usize::from_str` tolerates a leading '+', which the wire form does not.
fn parse_decimal(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Half-open byte range, rendered as `start:end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Number of addressable lines: one more than the number of `'\n'` bytes.
pub fn line_count(buf: &[u8]) -> usize {
    memchr::memchr_iter(b'\n', buf).count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"ab\ncd\nef";

    fn offsets(buf: &[u8], sel: &str) -> String {
        let selection: Selection = sel.parse().expect("selection should parse");
        selection
            .byte_offsets_in(buf)
            .expect("selection should resolve")
            .to_string()
    }

    #[test]
    fn single_line_selection() {
        assert_eq!(offsets(SAMPLE, "1.1-1.2"), "0:2");
    }

    #[test]
    fn multi_line_selection() {
        assert_eq!(offsets(SAMPLE, "2.1-3.2"), "3:8");
    }

    #[test]
    fn end_is_one_past_selected_byte() {
        for (line, col, byte) in [(1, 1, 0), (1, 3, 2), (2, 2, 4), (3, 1, 6)] {
            let sel = Selection {
                start: Position::new(1, 1),
                end: Position::new(line, col),
            };
            let range = sel.byte_offsets_in(SAMPLE).unwrap();
            assert_eq!(range.end, byte + 1, "end {line}.{col}");
        }
    }

    #[test]
    fn offsets_stay_on_requested_line() {
        let buf = b"fn main() {\n\tprintln!(\"x\");\r\n}\n\nlast";
        let lines: Vec<&[u8]> = buf.split(|&b| b == b'\n').collect();
        for (idx, line) in lines.iter().enumerate() {
            for col in 1..=line.len() + 1 {
                let pos = Position::new(idx + 1, col);
                let offset = pos.byte_offset_in(buf).unwrap();
                assert!(offset <= buf.len(), "{pos:?} -> {offset}");
                if col <= line.len() {
                    assert_eq!(buf[offset], line[col - 1], "{pos:?}");
                }
            }
        }
    }

    #[test]
    fn line_after_trailing_newline_is_addressable() {
        let buf = b"ab\n";
        assert_eq!(Position::new(2, 1).byte_offset_in(buf), Ok(3));
    }

    #[test]
    fn missing_line_is_an_error() {
        assert_eq!(
            Position::new(4, 1).byte_offset_in(SAMPLE),
            Err(PositionError::NoSuchLine { line: 4, lines: 3 })
        );
        assert_eq!(
            Position::new(2, 1).byte_offset_in(b""),
            Err(PositionError::NoSuchLine { line: 2, lines: 1 })
        );
    }

    #[test]
    fn zero_line_or_column_is_rejected() {
        assert!(matches!(
            Position::new(0, 1).byte_offset_in(SAMPLE),
            Err(PositionError::ZeroIndex { .. })
        ));
        assert!(matches!(
            Position::new(1, 0).byte_offset_in(SAMPLE),
            Err(PositionError::ZeroIndex { .. })
        ));
    }

    #[test]
    fn column_is_not_clamped() {
        assert_eq!(Position::new(1, 10).byte_offset_in(SAMPLE), Ok(9));
    }

    #[test]
    fn huge_columns_are_rejected_not_wrapped() {
        let max = usize::MAX;
        let sel: Selection = format!("2.1-2.{max}").parse().unwrap();
        assert_eq!(
            sel.byte_offsets_in(SAMPLE),
            Err(PositionError::Overflow { line: 2, col: max })
        );

        // The offset itself fits; widening the end past it does not.
        let col = max - 2;
        let sel: Selection = format!("1.1-2.{col}").parse().unwrap();
        assert_eq!(
            sel.byte_offsets_in(SAMPLE),
            Err(PositionError::Overflow { line: 2, col })
        );
    }

    #[test]
    fn out_of_range_numbers_do_not_parse() {
        let input = format!("1.1-1.{}0", u64::MAX);
        assert!(input.parse::<Selection>().is_err());
    }

    #[test]
    fn parses_wire_form() {
        let sel: Selection = "12.3-14.27".parse().unwrap();
        assert_eq!(sel.start, Position::new(12, 3));
        assert_eq!(sel.end, Position::new(14, 27));
    }

    #[test]
    fn rejects_malformed_selections() {
        for input in [
            "", "1.1", "1.1-", "1-2", "a.1-1.1", "1.1-1.x", "+1.1-1.1", "1.1-1.-1", "1.1-1.1x",
            " 1.1-1.1",
        ] {
            assert!(input.parse::<Selection>().is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn counts_lines() {
        assert_eq!(line_count(b""), 1);
        assert_eq!(line_count(SAMPLE), 3);
        assert_eq!(line_count(b"a\n"), 2);
    }
}
