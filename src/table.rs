use crate::error::prelude::*;
use crate::io;
use crate::trie::Trie;
use log::warn;

/// A bidirectional character table.
///
/// Built from `HH[HH…]=token` lines: the decode trie maps byte sequences to
/// token strings, the encode trie maps token characters back to those bytes.
/// Both are walked with longest-prefix matching, so multi-byte codes and
/// multi-character tokens need no special casing.
#[derive(Clone, Debug)]
pub struct Table {
  decode: Trie<u8, String>,
  encode: Trie<char, Vec<u8>>,
}

impl Table {
  /// Reads a table file. Lines that aren't `hex=token` are silently skipped.
  pub fn read(reader: impl io::BufRead) -> Result<Self, Error> {
    let mut decode = Trie::new();
    let mut encode = Trie::new();
    for line in reader.lines() {
      let line = line?;
      let Some((key, value)) = line.split_once('=') else {
        continue;
      };
      let Ok(bytes) = const_hex::decode(key) else {
        continue;
      };
      if bytes.is_empty() || value.is_empty() {
        continue;
      }
      decode.insert(bytes.iter().copied(), value.to_string());
      encode.insert(value.chars(), bytes);
    }
    if decode.is_empty() {
      return Err(Error::Empty);
    }
    Ok(Self { decode, encode })
  }

  pub fn decode(&self) -> &Trie<u8, String> {
    &self.decode
  }

  pub fn encode(&self) -> &Trie<char, Vec<u8>> {
    &self.encode
  }

  /// Destination bytes for one table token, by reverse lookup in the decode
  /// trie. Strings that span several tokens fall back to the char-walk
  /// encoder.
  pub fn reverse_bytes(&self, token: &str) -> Vec<u8> {
    let path = self.decode.reverse_find(&token.to_string());
    if path.is_empty() {
      self.encode_string(token)
    } else {
      path
    }
  }

  /// Encodes a token string into table bytes. Characters with no mapping are
  /// skipped with a warning.
  pub fn encode_string(&self, s: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pos = 0;
    while pos < s.len() {
      let rest = &s[pos..];
      let (consumed, value) = self.encode.find(rest.chars());
      match value {
        Some(bytes) => {
          out.extend_from_slice(bytes);
          pos += rest.chars().take(consumed).map(char::len_utf8).sum::<usize>();
        }
        None => {
          let skipped = rest.chars().next().map_or(1, char::len_utf8);
          warn!("no table mapping for {:?}", &rest[..skipped]);
          pos += skipped;
        }
      }
    }
    out
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("Invalid or corrupt character table.")]
  Empty,
  #[error(transparent)]
  IO(#[from] io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  fn table(contents: &str) -> Table {
    Table::read(io::Cursor::new(contents.to_string())).unwrap()
  }

  #[test]
  fn decodes_single_byte_keys() {
    let table = table("41=A\n42=B\n");
    assert_eq!(table.decode().find([0x41u8]), (1, Some(&"A".to_string())));
  }

  #[test]
  fn decodes_multi_byte_keys_longest_first() {
    let table = table("E0=!\nE017=Z\n");
    assert_eq!(table.decode().find([0xE0u8, 0x17]), (2, Some(&"Z".to_string())));
    assert_eq!(table.decode().find([0xE0u8, 0x18]), (1, Some(&"!".to_string())));
  }

  #[test]
  fn skips_malformed_lines() {
    let table = table("41=A\n\nnot a line\nZZ=bad hex\n4=odd\n42=B\n");
    assert_eq!(table.decode().find([0x42u8]), (1, Some(&"B".to_string())));
    assert_eq!(table.decode().find([0x04u8]), (0, None));
  }

  #[test]
  fn empty_table_is_an_error() {
    assert!(matches!(
      Table::read(io::Cursor::new("garbage\n".to_string())),
      Err(Error::Empty)
    ));
  }

  #[test]
  fn reverse_bytes_inverts_decode() {
    let table = table("00=`00`\n41=A\nE017=`01`\n");
    assert_eq!(table.reverse_bytes("`01`"), [0xE0, 0x17]);
    assert_eq!(table.reverse_bytes("A"), [0x41]);
  }

  #[test]
  fn encode_string_round_trips_tokens() {
    let table = table("00=`00`\n41=A\n42=B\nFF0A=`nl`\n");
    assert_eq!(table.encode_string("AB`nl`A`00`"), [0x41, 0x42, 0xFF, 0x0A, 0x41, 0x00]);
  }

  #[test]
  fn encode_string_skips_unmapped_characters() {
    let table = table("41=A\n");
    assert_eq!(table.encode_string("A?A"), [0x41, 0x41]);
  }
}
