use super::token::{self, Token};
use super::{Mutator, LINE_WIDTHS};
use std::ops::Range;

/// "No more spans"; callers test `start > end`, never equality.
const NO_SPAN: Range<usize> = usize::MAX..0;

impl Mutator<'_> {
  /// Reflows every line that contains a dialog span: newline removal with
  /// box-break accounting, sentence-break restoration, whitespace
  /// normalization, then a pixel-width word wrap against the window rows.
  pub fn dialog_reflow(&mut self) {
    for index in 0..self.lines.len() {
      let mut line = std::mem::take(&mut self.lines[index]);
      let mut removed = 0;
      let mut prev = 0..0;
      let mut edited = false;
      loop {
        let span = self.find_dialog(&line, &prev, index);
        if span.start > span.end {
          break;
        }
        edited = true;
        let mut text = line[span.clone()].to_string();
        removed = remove_lines(&mut text, removed);
        grammar_line(&mut text);
        remove_whitespace(&mut text);
        let end = span.start + text.len();
        line.replace_range(span.clone(), &text);
        prev = span.start..end.max(prev.end + 1);
      }
      if edited {
        let lowered = line.replace(token::SOFT_NEWLINE, token::NEWLINE);
        line = self.wrap(&lowered);
      }
      self.lines[index] = line;
    }
  }

  /// Re-emits lines that have no dialog span, centering physical lines that
  /// follow a whitespace spacer and expanding box breaks.
  pub fn text_reflow(&mut self) {
    for index in 0..self.lines.len() {
      let probe = self.find_dialog(&self.lines[index], &(0..0), index);
      if probe.start <= probe.end {
        continue;
      }
      let line = std::mem::take(&mut self.lines[index]);
      let lowered = line.replace(token::SOFT_NEWLINE, token::NEWLINE);
      let expanded = self.expand_boxes(&lowered);

      let space_advance = self.glyph_advance(' ').max(1);
      let mut out = String::new();
      let mut center_next = false;
      for (row, segment) in expanded.split(token::NEWLINE).enumerate() {
        if row > 0 {
          out.push_str(token::NEWLINE);
        }
        let spaces = segment.bytes().filter(|&b| b == b' ').count();
        let all_whitespace = !segment.is_empty() && segment.bytes().all(|b| b == b' ');
        if all_whitespace && spaces > 2 {
          center_next = true;
          out.push_str(segment);
        } else if center_next {
          center_next = false;
          let trimmed = segment.trim_start_matches(' ');
          let width = self.measure(trimmed);
          let limit = LINE_WIDTHS[row % LINE_WIDTHS.len()];
          let pad = limit.saturating_sub(width) / space_advance / 2;
          for _ in 0..pad {
            out.push(' ');
          }
          out.push_str(trimmed);
        } else {
          out.push_str(segment);
        }
      }
      self.lines[index] = out;
    }
  }

  /// Pixel width of a token sequence. Placeholders use their substitution
  /// advances; line-control codes are zero-width.
  pub fn measure(&self, s: &str) -> u32 {
    (token::tokens(s))
      .map(|t| match t {
        Token::Code(code) => self.placeholder_advance(code),
        Token::Char(c) => self.glyph_advance(c),
      })
      .sum()
  }

  /// The next dialog span at or after `prev.end`.
  ///
  /// An uppercase character opens a span directly. Otherwise the next colon
  /// is taken as a speaker tag and the span opens at the tag. Failing both,
  /// the line's dialog marks are consulted; the span then ends no later than
  /// the next mark.
  fn find_dialog(&self, s: &str, prev: &Range<usize>, index: usize) -> Range<usize> {
    let pos = prev.end;
    if pos >= s.len() {
      return NO_SPAN;
    }
    if s.as_bytes()[pos].is_ascii_uppercase() {
      return pos..dialog_end(s, pos + 1);
    }
    if let Some(colon) = s[pos..].find(':').map(|i| pos + i) {
      let start = dialog_start(s, colon);
      return start..dialog_end(s, start + 1);
    }

    let marks = self.marks.get(index).map(Vec::as_slice).unwrap_or(&[]);
    let mut first: Option<(usize, usize)> = None;
    for needle in marks {
      if let Some(at) = s[pos..].find(needle.as_str()).map(|i| pos + i) {
        if first.map_or(true, |(p, _)| at < p) {
          first = Some((at, needle.len()));
        }
      }
    }
    let Some((at, len)) = first else {
      return NO_SPAN;
    };
    let mut end = dialog_end(s, at + len);
    let mut next: Option<usize> = None;
    for needle in marks {
      if let Some(n) = s[at + 1..].find(needle.as_str()).map(|i| at + 1 + i) {
        if next.map_or(true, |p| n < p) {
          next = Some(n);
        }
      }
    }
    if let Some(n) = next {
      end = end.min(n.saturating_sub(5));
    }
    at..end
  }

  /// Word wrap against the window row widths. Newlines reset the running
  /// width, box breaks pad to the next window, and an overflow backs up to
  /// the most recent space.
  fn wrap(&self, line: &str) -> String {
    let space_advance = self.glyph_advance(' ');
    let mut out = String::new();
    let mut width: u32 = 0;
    let mut row = 0;
    let mut break_at: Option<(usize, u32)> = None;
    let mut pos = 0;
    while pos < line.len() {
      match token::code_at(line, pos) {
        Some(token::NEWLINE) => {
          out.push_str(token::NEWLINE);
          pos += token::NEWLINE.len();
          width = 0;
          row = (row + 1) % LINE_WIDTHS.len();
          break_at = None;
          continue;
        }
        Some(token::BOX_BREAK) => {
          for _ in row..LINE_WIDTHS.len() {
            out.push_str(token::NEWLINE);
          }
          pos += token::BOX_BREAK.len();
          width = 0;
          row = 0;
          break_at = None;
          continue;
        }
        Some(code) => {
          out.push_str(code);
          pos += code.len();
          width += self.placeholder_advance(code);
        }
        None => {
          let Some(c) = line[pos..].chars().next() else {
            break;
          };
          out.push(c);
          pos += c.len_utf8();
          if c == ' ' {
            width += space_advance;
            break_at = Some((out.len() - 1, width));
          } else {
            width += self.glyph_advance(c);
          }
        }
      }
      if width > LINE_WIDTHS[row] {
        if let Some((at, width_through_space)) = break_at.take() {
          out.replace_range(at..at + 1, token::NEWLINE);
          if at > 0 && out.as_bytes()[at - 1] == b' ' {
            out.remove(at - 1);
          }
          width -= width_through_space;
          row = (row + 1) % LINE_WIDTHS.len();
        }
      }
    }
    out
  }

  fn expand_boxes(&self, line: &str) -> String {
    let mut out = String::new();
    let mut row = 0;
    let mut pos = 0;
    while pos < line.len() {
      match token::code_at(line, pos) {
        Some(token::NEWLINE) => {
          out.push_str(token::NEWLINE);
          row = (row + 1) % LINE_WIDTHS.len();
          pos += token::NEWLINE.len();
        }
        Some(token::BOX_BREAK) => {
          for _ in row..LINE_WIDTHS.len() {
            out.push_str(token::NEWLINE);
          }
          row = 0;
          pos += token::BOX_BREAK.len();
        }
        Some(code) => {
          out.push_str(code);
          pos += code.len();
        }
        None => {
          let Some(c) = line[pos..].chars().next() else {
            break;
          };
          out.push(c);
          pos += c.len_utf8();
        }
      }
    }
    out
  }

  fn placeholder_advance(&self, code: &str) -> u32 {
    match code {
      token::PLAYER_NAME => self.bartz_advance(),
      token::GIL => self.gil_advance(),
      token::ITEM => self.item_advance,
      token::ABILITY => self.ability_advance,
      _ => 0,
    }
  }

  /// Six name characters at the widest letter glyph.
  fn bartz_advance(&self) -> u32 {
    6 * ('a'..='z').chain('A'..='Z').map(|c| self.glyph_advance(c)).max().unwrap_or(0)
  }

  /// Seven digits at the widest digit glyph.
  fn gil_advance(&self) -> u32 {
    7 * ('0'..='9').map(|c| self.glyph_advance(c)).max().unwrap_or(0)
  }

  fn glyph_advance(&self, c: char) -> u32 {
    let (_, bytes) = self.table.encode().find(std::iter::once(c));
    bytes.map_or(0, |bytes| {
      (bytes.iter())
        .filter_map(|&byte| self.font.advance(byte as usize))
        .sum()
    })
  }
}

/// The start of the speaker tag owning the colon at `colon`: either the
/// player-name placeholder or the run of letters and spaces before it.
fn dialog_start(s: &str, colon: usize) -> usize {
  if colon >= 4 && &s[colon - 4..colon] == token::PLAYER_NAME {
    return colon - 4;
  }
  let bytes = s.as_bytes();
  let mut start = colon;
  while start > 0 && (bytes[start - 1] == b' ' || bytes[start - 1].is_ascii_alphabetic()) {
    start -= 1;
  }
  start
}

/// Scans forward for the end of a dialog span: the terminator (inclusive),
/// or the character before the next speaker tag.
fn dialog_end(s: &str, from: usize) -> usize {
  let mut pos = from;
  while pos < s.len() {
    match token::code_at(s, pos) {
      Some(token::TERMINATOR) => return pos + token::TERMINATOR.len(),
      Some(code) => {
        if code == token::NEWLINE {
          if let Some(colon) = s[pos..].find(':').map(|i| pos + i) {
            return dialog_start(s, colon).saturating_sub(1);
          }
        }
        pos += code.len();
      }
      None => pos += s[pos..].chars().next().map_or(1, char::len_utf8),
    }
  }
  s.len()
}

/// Erases every newline token from a dialog span. Every fourth removal marks
/// an old window boundary and becomes a box break, unless the span runs to
/// its terminator. Returns the updated running removal count.
fn remove_lines(text: &mut String, mut removed: usize) -> usize {
  let terminated = text.ends_with(token::TERMINATOR);
  let mut pos = 0;
  while pos < text.len() {
    let code = token::code_at(text, pos)
      .map(|code| (code.len(), matches!(code, token::NEWLINE | token::SOFT_NEWLINE)));
    match code {
      Some((len, true)) => {
        text.replace_range(pos..pos + len, "");
        removed += 1;
        if removed % 4 == 0 && !terminated {
          text.insert_str(pos, token::BOX_BREAK);
          pos += token::BOX_BREAK.len();
        }
      }
      Some((len, false)) => pos += len,
      None => pos += text[pos..].chars().next().map_or(1, char::len_utf8),
    }
  }
  if !text.ends_with(token::TERMINATOR) && !text.ends_with(token::BOX_BREAK) {
    text.push_str(token::NEWLINE);
  }
  removed
}

/// Inserts a newline after each sentence terminal that runs straight into
/// more content: `.` not part of an ellipsis, `!` or `?`, followed by a
/// quote or an alphanumeric.
fn grammar_line(text: &mut String) {
  let mut pos = 0;
  while pos < text.len() {
    if let Some(len) = token::code_at(text, pos).map(str::len) {
      pos += len;
      continue;
    }
    let bytes = text.as_bytes();
    let terminal = match bytes[pos] {
      b'.' => pos == 0 || bytes[pos - 1] != b'.',
      b'!' | b'?' => true,
      _ => false,
    };
    let followed = (bytes.get(pos + 1)).is_some_and(|&b| b == b'"' || b.is_ascii_alphanumeric());
    if terminal && followed {
      text.insert_str(pos + 1, token::NEWLINE);
      pos += 1 + token::NEWLINE.len();
    } else {
      pos += 1;
    }
  }
}

/// Strips leading spaces, collapses runs, and drops spaces that sit against
/// control codes, punctuation or a double period. Spaces around placeholder
/// codes always survive.
fn remove_whitespace(text: &mut String) {
  let lead = text.bytes().take_while(|&b| b == b' ').count();
  text.replace_range(..lead, "");

  let mut pos = 0;
  while pos < text.len() {
    if text.as_bytes()[pos] == b' ' {
      let run = text[pos..].bytes().take_while(|&b| b == b' ').count();
      if run > 1 {
        text.replace_range(pos + 1..pos + run, "");
      }
      pos += 1;
    } else {
      pos += token::code_at(text, pos).map_or(1, str::len);
    }
  }

  let mut pos = 0;
  while pos < text.len() {
    if text.as_bytes()[pos] != b' ' {
      pos += token::code_at(text, pos).map_or(1, str::len);
      continue;
    }
    if delete_space_at(text, pos) {
      text.replace_range(pos..pos + 1, "");
    } else {
      pos += 1;
    }
  }
}

fn delete_space_at(text: &str, pos: usize) -> bool {
  let before_code = code_ending_at(text, pos);
  let after_code = token::code_at(text, pos + 1);
  if before_code.is_some_and(token::is_placeholder) || after_code.is_some_and(token::is_placeholder)
  {
    return false;
  }
  if before_code.is_some() || after_code.is_some() {
    return true;
  }
  if pos >= 2 && &text[pos - 2..pos] == ".." {
    return true;
  }
  let bytes = text.as_bytes();
  let before = pos.checked_sub(1).and_then(|i| bytes.get(i)).copied();
  let after = bytes.get(pos + 1).copied();
  let flanked = !before.is_some_and(|b| b.is_ascii_alphanumeric())
    && !after.is_some_and(|b| b.is_ascii_alphanumeric());
  flanked && before != Some(b':') && after != Some(b':')
}

fn code_ending_at(s: &str, end: usize) -> Option<&str> {
  (4..=6).find_map(|len| {
    let start = end.checked_sub(len)?;
    token::code_at(s, start).filter(|code| code.len() == len)
  })
}

#[cfg(test)]
mod tests {
  use super::super::fixtures::*;
  use super::*;

  #[test]
  fn remove_lines_counts_box_breaks_across_spans() {
    let mut text = "a`01`b`01`c`01`d`01`e`01`f`01`g`01`h`01`".to_string();
    let removed = remove_lines(&mut text, 0);
    assert_eq!(removed, 8);
    assert_eq!(text, "abcd`bx`efgh`bx`");
  }

  #[test]
  fn remove_lines_resumes_a_prior_count() {
    let mut text = "x`01`y`01`z".to_string();
    let removed = remove_lines(&mut text, 2);
    assert_eq!(removed, 4);
    assert_eq!(text, "xy`bx`z`01`");
  }

  #[test]
  fn remove_lines_keeps_terminated_spans_flat() {
    let mut text = "a`01`b`01`c`01`d`01`e`00`".to_string();
    let removed = remove_lines(&mut text, 0);
    assert_eq!(removed, 4);
    assert_eq!(text, "abcde`00`");
  }

  #[test]
  fn grammar_line_restores_sentence_breaks() {
    let mut text = "Hey!How are you?Fine.".to_string();
    grammar_line(&mut text);
    assert_eq!(text, "Hey!`01`How are you?`01`Fine.");
  }

  #[test]
  fn grammar_line_leaves_ellipses_alone() {
    let mut text = "What...Really".to_string();
    grammar_line(&mut text);
    assert_eq!(text, "What...Really");
  }

  #[test]
  fn grammar_line_breaks_before_quotes() {
    let mut text = "Stop!\"Go home\"".to_string();
    grammar_line(&mut text);
    assert_eq!(text, "Stop!`01`\"Go home\"");
  }

  #[test]
  fn whitespace_collapses_and_strips() {
    let mut text = "  Hello  world `01` again".to_string();
    remove_whitespace(&mut text);
    assert_eq!(text, "Hello world`01`again");
  }

  #[test]
  fn whitespace_survives_around_placeholders() {
    let mut text = "Take `02` home".to_string();
    remove_whitespace(&mut text);
    assert_eq!(text, "Take `02` home");
  }

  #[test]
  fn whitespace_after_double_period_is_dropped() {
    let mut text = "Wait.. see".to_string();
    remove_whitespace(&mut text);
    assert_eq!(text, "Wait..see");
  }

  #[test]
  fn dialog_reflow_wraps_to_the_window() {
    let table = table();
    let font = font();
    let mut mutator = mutator_from_lines(
      &["The quick brown fox jumps over the lazy dog again and again and again.`00`"],
      &table,
      &font,
    );
    mutator.dialog_reflow();
    let line = &mutator.lines()[0];
    for (row, segment) in line.split("`01`").enumerate() {
      assert!(mutator.measure(segment) <= LINE_WIDTHS[row % LINE_WIDTHS.len()]);
      assert!(!segment.starts_with(' '));
    }
    assert_eq!(line.matches(' ').count() + line.matches("`01`").count(), 13);
  }

  #[test]
  fn dialog_reflow_expands_box_breaks() {
    let table = table();
    let font = font();
    let mut mutator = mutator_from_lines(&["Abc`bx`def`00`"], &table, &font);
    mutator.dialog_reflow();
    assert_eq!(mutator.lines()[0], "Abc`01``01``01`def`00`");
  }

  #[test]
  fn dialog_reflow_respects_marks() {
    let table = table();
    let font = font();
    let mut mutator = mutator_from_lines(&["hey`01`go away`01`now`00`"], &table, &font);
    mutator.mark_dialog(0, "go");
    mutator.dialog_reflow();
    assert_eq!(mutator.lines()[0], "hey`01`go awaynow`00`");
  }

  #[test]
  fn dialog_reflow_keeps_speaker_tags() {
    let table = table();
    let font = font();
    let mut mutator = mutator_from_lines(&["`02`: Let's go`00`"], &table, &font);
    mutator.dialog_reflow();
    assert_eq!(mutator.lines()[0], "`02`: Let's go`00`");
  }

  #[test]
  fn text_reflow_centers_after_a_spacer() {
    let table = table();
    let font = font();
    let mut mutator = mutator_from_lines(&["hi`01`    `01`title`01`end`00`"], &table, &font);
    mutator.text_reflow();
    let expected = format!("hi`01`    `01`{}title`01`end`00`", " ".repeat(10));
    assert_eq!(mutator.lines()[0], expected);
  }

  #[test]
  fn text_reflow_skips_dialog_lines() {
    let table = table();
    let font = font();
    let mut mutator = mutator_from_lines(&["Bartz: hello`00`"], &table, &font);
    mutator.text_reflow();
    assert_eq!(mutator.lines()[0], "Bartz: hello`00`");
  }
}
