use crate::text::Mutator;
use log::warn;

/// Global renames, matched case-insensitively and recased after the text
/// they replace.
pub const FIND_REPLACE: &[(&str, &str)] = &[
  ("Butz", "Bartz"),
  ("Cara", "Krile"),
  ("Hiryuu", "wind drake"),
  ("Worus", "Walse"),
  ("Jacole", "Jachol"),
  ("Rugor", "Regole"),
  ("Kelb", "Quelb"),
  ("Mua", "Moore"),
  ("Kuzar", "Kuza"),
  ("Guido", "Ghido"),
  ("Halikarnassos", "Halicarnassus"),
  ("Coco", "Koko"),
  ("Galura", "Garula"),
  ("N-Zone", "Interdimensional Rift"),
  ("Elixer", "Elixir"),
  ("Pheonix", "Phoenix"),
];

/// Proper names normalized to Name-Case wherever the script shouts or
/// whispers them.
pub const NAME_CASE: &[&str] = &[
  "Bartz", "Lenna", "Galuf", "Faris", "Krile", "Cid", "Mid", "Boko", "Syldra", "Gilgamesh",
  "Exdeath", "Dorgann", "Xezat", "Kelger", "Ghido",
];

/// Targeted fixups that must land before the reflow measures the text, so
/// the wrap sees the corrected wording.
pub const PRE_FIXUPS: &[(usize, &str, &str)] = &[
  (57, "teh meteor", "the meteor"),
  (412, "cant'", "can't"),
  (988, "omw", "on my way"),
];

/// Dialog boundary hints for lines the span search can't segment on its own.
pub const DIALOG_MARKS: &[(usize, &str)] = &[
  (118, "`02`"),
  (1203, "Mother"),
  (1845, "Ahh"),
  (2077, "whoa"),
];

/// Post-reflow fixups, applied case-sensitively to single lines.
pub const POST_FIXUPS: &[(usize, &str, &str)] = &[
  (118, "Huh!?", "Huh?!"),
  (905, "", "`01`"),
  (1203, "grandpa", "Grandpa"),
  (1517, "wyvern", "wind drake"),
];

/// Runs the whole editorial script. The order is load-bearing: marks must
/// land before the dialog reflow, the pre-reflow fixups before the wrap
/// measures anything, and the post fixups run against the reflowed text.
pub fn apply(mutator: &mut Mutator<'_>) {
  for &(line, needle) in DIALOG_MARKS {
    mutator.mark_dialog(line, needle);
  }
  for &(needle, replacement) in FIND_REPLACE {
    mutator.find_replace(needle, replacement);
  }
  for &(line, needle, replacement) in PRE_FIXUPS {
    if !mutator.target_find_replace(line, needle, replacement) {
      warn!("no replacement for {needle:?} on line {line}");
    }
  }
  for &name in NAME_CASE {
    mutator.name_case(name);
  }

  mutator.dialog_reflow();
  mutator.text_reflow();

  for &(line, needle, replacement) in POST_FIXUPS {
    if !mutator.target_find_replace(line, needle, replacement) {
      warn!("no replacement for {needle:?} on line {line}");
    }
  }
}

/// Destination-table entry ranges surveyed for the item-name placeholder
/// width.
pub const ITEM_NAME_RANGES: &[(usize, usize)] = &[(416, 671)];

/// Destination-table entry ranges surveyed for the ability-name placeholder
/// width.
pub const ABILITY_NAME_RANGES: &[(usize, usize)] = &[(672, 767)];
