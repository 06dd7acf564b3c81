//! Conversions between LSP positions and rope char offsets.
//!
//! LSP columns count UTF-16 code units; ropey indexes by char. Line breaks are
//! `\n`, `\r\n` and `\r`, matching the rope's `cr_lines` configuration.

use ropey::Rope;
use tower_lsp::lsp_types::Position;

/// Converts `position` into a char offset into `rope`.
///
/// Returns `None` when the line does not exist, the column runs past the end of
/// the line's content, or the column lands inside a surrogate pair.
pub fn position_to_char(rope: &Rope, position: Position) -> Option<usize> {
    let line = position.line as usize;
    if line >= rope.len_lines() {
        return None;
    }

    let line_start = rope.line_to_char(line);
    let content_end = line_start + line_content_len(rope, line);

    let start_cu = rope.char_to_utf16_cu(line_start);
    let end_cu = rope.char_to_utf16_cu(content_end);
    let target_cu = start_cu + position.character as usize;
    if target_cu > end_cu {
        return None;
    }

    let offset = rope.utf16_cu_to_char(target_cu);
    (rope.char_to_utf16_cu(offset) == target_cu).then_some(offset)
}

/// Returns the position just past the last character of `rope`.
pub fn end_position(rope: &Rope) -> Position {
    let last_line = rope.len_lines() - 1;
    let line_start = rope.line_to_char(last_line);
    let content_end = line_start + line_content_len(rope, last_line);
    let character = rope.char_to_utf16_cu(content_end) - rope.char_to_utf16_cu(line_start);

    Position::new(last_line as u32, character as u32)
}

/// Number of chars on `line`, excluding its terminator.
fn line_content_len(rope: &Rope, line: usize) -> usize {
    let slice = rope.line(line);
    let mut len = slice.len_chars();

    if len > 0 && slice.char(len - 1) == '\n' {
        len -= 1;
        if len > 0 && slice.char(len - 1) == '\r' {
            len -= 1;
        }
    } else if len > 0 && slice.char(len - 1) == '\r' {
        len -= 1;
    }

    len
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ab\ncd", 0, 0, Some(0))]
    #[case("ab\ncd", 0, 2, Some(2))]
    #[case("ab\ncd", 1, 0, Some(3))]
    #[case("ab\ncd", 1, 2, Some(5))]
    // column past the end of the line
    #[case("ab\ncd", 0, 3, None)]
    // line past the end of the text
    #[case("ab\ncd", 2, 0, None)]
    // a trailing newline opens an empty last line
    #[case("ab\n", 1, 0, Some(3))]
    #[case("", 0, 0, Some(0))]
    #[case("", 0, 1, None)]
    fn position_to_char_with_lf(
        #[case] text: &str,
        #[case] line: u32,
        #[case] character: u32,
        #[case] expected: Option<usize>,
    ) {
        let rope = Rope::from_str(text);
        assert_eq!(position_to_char(&rope, Position::new(line, character)), expected);
    }

    #[rstest]
    #[case("ab\r\ncd", 0, 2, Some(2))]
    // the column cannot address the \r of a \r\n pair
    #[case("ab\r\ncd", 0, 3, None)]
    #[case("ab\r\ncd", 1, 1, Some(5))]
    #[case("ab\rcd", 1, 0, Some(3))]
    fn position_to_char_with_cr(
        #[case] text: &str,
        #[case] line: u32,
        #[case] character: u32,
        #[case] expected: Option<usize>,
    ) {
        let rope = Rope::from_str(text);
        assert_eq!(position_to_char(&rope, Position::new(line, character)), expected);
    }

    #[test]
    fn position_to_char_counts_utf16_code_units() {
        // U+1F600 takes two UTF-16 code units but one char
        let rope = Rope::from_str("a\u{1F600}b");

        assert_eq!(position_to_char(&rope, Position::new(0, 1)), Some(1));
        assert_eq!(position_to_char(&rope, Position::new(0, 3)), Some(2));
        assert_eq!(position_to_char(&rope, Position::new(0, 4)), Some(3));
    }

    #[test]
    fn position_to_char_rejects_column_inside_surrogate_pair() {
        let rope = Rope::from_str("a\u{1F600}b");
        assert_eq!(position_to_char(&rope, Position::new(0, 2)), None);
    }

    #[rstest]
    #[case("", Position::new(0, 0))]
    #[case("ab\ncd", Position::new(1, 2))]
    #[case("ab\n", Position::new(1, 0))]
    #[case("x\u{1F600}", Position::new(0, 3))]
    fn end_position_points_past_last_char(#[case] text: &str, #[case] expected: Position) {
        assert_eq!(end_position(&Rope::from_str(text)), expected);
    }
}
