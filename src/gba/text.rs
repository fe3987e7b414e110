use crate::gba::font::FontTable;
use crate::gba::{Error, TEXT_SIGNATURE};
use crate::io;
use crate::io::prelude::*;
use crate::table::Table;
use crate::text::TERMINATOR;
use log::warn;

/// The packed text block: an offset index plus terminator-separated token
/// streams.
///
/// Offsets are relative to the end of the offset array, so `offsets[i]`
/// indexes the first byte of entry `i` in `data`.
#[derive(Clone, Debug)]
pub struct TextBlock {
  pub translations: u8,
  pub offsets: Vec<u32>,
  pub data: Vec<u8>,
}

/// Parses the text block; the stream must be positioned at its signature.
pub fn read(stream: &mut (impl Read + Seek)) -> Result<TextBlock, Error> {
  if !stream.next_is(&TEXT_SIGNATURE)? {
    return Err(Error::TextSignature);
  }

  let translations = stream.read_u8()?;
  let text_count = stream.read_u24::<LE>()?;
  let size = stream.read_u32::<LE>()?;

  let mut offsets = Vec::with_capacity(text_count as usize);
  for _ in 0..text_count {
    offsets.push(stream.read_u32::<LE>()?);
  }

  let mut data = vec![0u8; size as usize];
  stream.read_exact(&mut data)?;

  Ok(TextBlock { translations, offsets, data })
}

impl TextBlock {
  /// Bytes of entry `index`, including its terminator.
  pub fn entry(&self, index: usize) -> Option<&[u8]> {
    let start = *self.offsets.get(index)? as usize;
    let end = (self.offsets.get(index + 1))
      .map(|&next| next as usize)
      .unwrap_or(self.data.len());
    self.data.get(start..end)
  }

  /// Widest rendered entry across the given inclusive index ranges, in font
  /// pixels. Only single-byte glyph codes contribute; anything else is
  /// skipped with a warning.
  pub fn max_width(&self, ranges: &[(usize, usize)], table: &Table, font: &FontTable) -> u32 {
    let mut max = 0;
    for &(first, last) in ranges {
      for index in first..=last {
        let Some(entry) = self.entry(index) else {
          continue;
        };
        max = max.max(self.entry_width(entry, table, font));
      }
    }
    max
  }

  fn entry_width(&self, entry: &[u8], table: &Table, font: &FontTable) -> u32 {
    let mut width = 0;
    let mut pos = 0;
    while pos < entry.len() {
      let rest = &entry[pos..];
      match table.decode().find(rest.iter().copied()) {
        (1, Some(token)) if token == TERMINATOR => break,
        (1, Some(_)) => {
          width += font.advance(rest[0] as usize).unwrap_or(0);
          pos += 1;
        }
        (consumed, _) => {
          let skipped = consumed.max(1);
          warn!("unmeasurable code {}", const_hex::encode(&rest[..skipped.min(rest.len())]));
          pos += skipped;
        }
      }
    }
    width
  }
}
