use regex_lite::Regex;
use std::sync::OnceLock;

pub const TERMINATOR: &str = "`00`";
pub const NEWLINE: &str = "`01`";
pub const PLAYER_NAME: &str = "`02`";
pub const GIL: &str = "`10`";
pub const ITEM: &str = "`11`";
pub const ABILITY: &str = "`12`";

/// An enforced newline, lowered to `` `01` `` after the span edits.
pub const SOFT_NEWLINE: &str = "`nl`";
/// A box break: emitted as enough newlines to reach the next window.
pub const BOX_BREAK: &str = "`bx`";

fn code_pattern() -> &'static Regex {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  PATTERN.get_or_init(|| Regex::new("^`[0-9a-zA-Z]{2,4}`$").expect("control code pattern"))
}

/// The control code starting at byte `pos`, if one is there.
pub fn code_at(s: &str, pos: usize) -> Option<&str> {
  if s.as_bytes().get(pos) != Some(&b'`') {
    return None;
  }
  let close = s.as_bytes()[pos + 1..].iter().position(|&b| b == b'`')?;
  let candidate = &s[pos..pos + close + 2];
  code_pattern().is_match(candidate).then_some(candidate)
}

/// Placeholders render runtime-substituted strings and keep their spacing.
pub fn is_placeholder(code: &str) -> bool {
  matches!(code, PLAYER_NAME | GIL | ITEM | ABILITY)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Token<'a> {
  Code(&'a str),
  Char(char),
}

impl Token<'_> {
  pub fn len(&self) -> usize {
    match self {
      Token::Code(code) => code.len(),
      Token::Char(c) => c.len_utf8(),
    }
  }
}

/// Iterates a mutator string as control codes and literal characters.
pub fn tokens(s: &str) -> Tokens<'_> {
  Tokens { s, pos: 0 }
}

pub struct Tokens<'a> {
  s: &'a str,
  pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
  type Item = Token<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    if self.pos >= self.s.len() {
      return None;
    }
    let token = match code_at(self.s, self.pos) {
      Some(code) => Token::Code(code),
      None => Token::Char(self.s[self.pos..].chars().next()?),
    };
    self.pos += token.len();
    Some(token)
  }
}
