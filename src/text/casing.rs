/// True when `s` has at least one uppercase letter and no lowercase ones.
pub fn is_upper(s: &str) -> bool {
  let mut has_upper = false;
  for c in s.chars() {
    if c.is_ascii_lowercase() {
      return false;
    }
    has_upper |= c.is_ascii_uppercase();
  }
  has_upper
}

/// True when `s` has at least one lowercase letter and no uppercase ones.
pub fn is_lower(s: &str) -> bool {
  let mut has_lower = false;
  for c in s.chars() {
    if c.is_ascii_uppercase() {
      return false;
    }
    has_lower |= c.is_ascii_lowercase();
  }
  has_lower
}

/// All-upper counts as name-cased; so does "Xxxxx".
pub fn is_name_case(s: &str) -> bool {
  if is_upper(s) {
    return true;
  }
  let mut chars = s.chars();
  match chars.next() {
    Some(first) if first.is_ascii_uppercase() => {}
    _ => return false,
  }
  chars.all(|c| !c.is_ascii_uppercase())
}

/// Recases `input` after the casing of the text it replaces: all-upper and
/// all-lower models recase the whole string, a capitalized model only the
/// first character.
pub fn transform_casing(input: &str, model: &str) -> String {
  if is_upper(model) {
    input.to_ascii_uppercase()
  } else if is_lower(model) {
    input.to_ascii_lowercase()
  } else {
    let mut out = input.to_string();
    if model.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
      if let Some(first) = out.get_mut(..1) {
        first.make_ascii_uppercase();
      }
    }
    out
  }
}

/// "Xxxxx": first character upper, remainder lower.
pub fn name_casing(s: &str) -> String {
  let mut out = s.to_ascii_lowercase();
  if let Some(first) = out.get_mut(..1) {
    first.make_ascii_uppercase();
  }
  out
}

/// Index one past the last alphabetic character, 0 if there is none.
pub fn last_alphabetic(s: &str) -> usize {
  (s.bytes().rposition(|b| b.is_ascii_alphabetic())).map_or(0, |i| i + 1)
}
