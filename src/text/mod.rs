use crate::gba::font::FontTable;
use crate::table::Table;
use log::warn;

mod casing;
mod reflow;
mod token;

pub use token::{tokens, Token, ABILITY, BOX_BREAK, GIL, ITEM, NEWLINE, PLAYER_NAME, SOFT_NEWLINE, TERMINATOR};

/// Pixel widths of the three rows of a dialog window.
pub(crate) const LINE_WIDTHS: [u32; 3] = [217, 217, 212];

/// Owns the decoded script and applies the edit pipeline to it.
///
/// The steps are not commutative; callers run them in order: dialog marks,
/// global find/replace, targeted fixups, name casing, dialog reflow, text
/// reflow, then post-reflow targeted fixups.
pub struct Mutator<'a> {
  lines: Vec<String>,
  marks: Vec<Vec<String>>,
  table: &'a Table,
  font: &'a FontTable,
  item_advance: u32,
  ability_advance: u32,
}

impl<'a> Mutator<'a> {
  /// Decodes the destination byte stream into one string per terminated
  /// entry. Bytes with no table mapping are skipped with a warning.
  pub fn new(
    data: &[u8],
    table: &'a Table,
    font: &'a FontTable,
    item_advance: u32,
    ability_advance: u32,
  ) -> Self {
    let mut lines = Vec::new();
    let mut buffer = String::new();
    let mut pos = 0;
    while pos < data.len() {
      let rest = &data[pos..];
      let (consumed, value) = table.decode().find(rest.iter().copied());
      match value {
        Some(token) if token == TERMINATOR => {
          buffer.push_str(TERMINATOR);
          lines.push(std::mem::take(&mut buffer));
          pos += consumed;
        }
        Some(token) => {
          buffer.push_str(token);
          pos += consumed;
        }
        None => {
          let skipped = consumed.max(1).min(rest.len());
          warn!("missing destination character for code {}", const_hex::encode(&rest[..skipped]));
          pos += skipped;
        }
      }
    }

    let marks = vec![Vec::new(); lines.len()];
    Self { lines, marks, table, font, item_advance, ability_advance }
  }

  pub fn lines(&self) -> &[String] {
    &self.lines
  }

  /// Records a dialog boundary hint for the next reflow of line `line`.
  pub fn mark_dialog(&mut self, line: usize, needle: impl Into<String>) {
    match self.marks.get_mut(line) {
      Some(marks) => marks.push(needle.into()),
      None => warn!("dialog mark for missing line {line}"),
    }
  }

  /// Case-insensitive, casing-preserving, whole-word find/replace over every
  /// line.
  pub fn find_replace(&mut self, needle: &str, replacement: &str) {
    let lower_needle = needle.to_ascii_lowercase();
    let last_alpha = casing::last_alphabetic(&lower_needle);

    for line in &mut self.lines {
      let mut lower_line = line.to_ascii_lowercase();
      let mut at = 0;
      while let Some(found) = lower_line[at..].find(&lower_needle).map(|i| at + i) {
        if whole_word(&lower_line, found, last_alpha) {
          let matched = line[found..found + needle.len()].to_string();
          let recased = casing::transform_casing(replacement, &matched);
          line.replace_range(found..found + needle.len(), &recased);
          at = found + recased.len();
          lower_line = line.to_ascii_lowercase();
        } else {
          at = found + 1;
        }
      }
    }
  }

  /// Case-sensitive, whole-word find/replace on one line. An empty needle
  /// prepends the replacement. Reports whether anything changed.
  pub fn target_find_replace(&mut self, index: usize, needle: &str, replacement: &str) -> bool {
    let Some(line) = self.lines.get_mut(index) else {
      warn!("targeted replacement on missing line {index}");
      return false;
    };
    if needle.is_empty() {
      line.insert_str(0, replacement);
      return true;
    }

    let last_alpha = casing::last_alphabetic(needle);
    let mut replaced_any = false;
    let mut at = 0;
    while let Some(found) = line[at..].find(needle).map(|i| at + i) {
      if whole_word(line, found, last_alpha) {
        line.replace_range(found..found + needle.len(), replacement);
        at = found + replacement.len();
        replaced_any = true;
      } else {
        at = found + 1;
      }
    }
    replaced_any
  }

  /// Rewrites case-insensitive whole-word matches of `name` into Name-Case,
  /// leaving matches that are already name-cased or all-upper alone.
  pub fn name_case(&mut self, name: &str) {
    let lower_needle = name.to_ascii_lowercase();
    let cased = casing::name_casing(name);
    let last_alpha = casing::last_alphabetic(&lower_needle);

    for line in &mut self.lines {
      let mut lower_line = line.to_ascii_lowercase();
      let mut at = 0;
      while let Some(found) = lower_line[at..].find(&lower_needle).map(|i| at + i) {
        if whole_word(&lower_line, found, last_alpha) {
          let matched = &line[found..found + lower_needle.len()];
          if !casing::is_name_case(matched) {
            line.replace_range(found..found + lower_needle.len(), &cased);
            lower_line = line.to_ascii_lowercase();
          }
          at = found + cased.len();
        } else {
          at = found + 1;
        }
      }
    }
  }
}

/// Whole-word guard: nothing alphabetic immediately before the match, and
/// nothing alphabetic just past the needle's last alphabetic character.
fn whole_word(s: &str, at: usize, last_alpha: usize) -> bool {
  let bytes = s.as_bytes();
  let before = at.checked_sub(1).and_then(|i| bytes.get(i));
  let after = bytes.get(at + last_alpha);
  !before.is_some_and(|b| b.is_ascii_alphabetic()) && !after.is_some_and(|b| b.is_ascii_alphabetic())
}
