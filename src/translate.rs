use crate::table::Table;
use crate::trie::Trie;
use log::warn;

/// Translates source-script bytes into destination-table bytes.
///
/// The source trie is walked with longest-prefix matching; each matched token
/// is reverse-looked-up in the destination table. Bytes with no mapping are
/// skipped with a warning and never abort the walk.
pub fn translate(src: &[u8], source: &Trie<u8, String>, destination: &Table) -> Vec<u8> {
  let mut out = Vec::new();
  let mut pos = 0;
  while pos < src.len() {
    let rest = &src[pos..];
    let (consumed, token) = source.find(rest.iter().copied());
    match token {
      Some(token) => {
        out.extend_from_slice(&destination.reverse_bytes(token));
        pos += consumed;
      }
      None => {
        let skipped = consumed.max(1).min(rest.len());
        warn!("missing source character for code {}", const_hex::encode(&rest[..skipped]));
        pos += skipped;
      }
    }
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::io;

  fn tables() -> (Trie<u8, String>, Table) {
    let mut source = Trie::new();
    source.insert([0x00u8], "`00`".to_string());
    source.insert([0x8Au8], "H".to_string());
    source.insert([0xA2u8], "i".to_string());
    source.insert([0xE0u8, 0x17], "`01`".to_string());

    let destination = Table::read(io::Cursor::new(
      "00=`00`\n01=`01`\n48=H\n69=i\n".to_string(),
    ))
    .unwrap();
    (source, destination)
  }

  #[test]
  fn retargets_tokens_byte_for_byte() {
    let (source, destination) = tables();
    let out = translate(&[0x8A, 0xA2, 0xE0, 0x17, 0x8A, 0x00], &source, &destination);
    assert_eq!(out, [0x48, 0x69, 0x01, 0x48, 0x00]);
  }

  #[test]
  fn skips_unmapped_bytes() {
    let (source, destination) = tables();
    let out = translate(&[0x8A, 0x7F, 0xA2], &source, &destination);
    assert_eq!(out, [0x48, 0x69]);
  }
}
