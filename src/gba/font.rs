use crate::gba::{Error, FONT_SIGNATURE};
use crate::io;
use crate::io::prelude::*;

const RESERVED_BYTES: i64 = 256;

#[derive(Clone, Debug)]
pub struct Glyph {
  pub advance: u8,
  pub stride: u8,
  pub bitmap: Vec<u8>,
}

/// The variable-width font embedded in the cartridge.
#[derive(Clone, Debug)]
pub struct FontTable {
  pub height: u8,
  pub glyphs: Vec<Glyph>,
}

impl FontTable {
  /// Pixel advance of a glyph by table index.
  pub fn advance(&self, glyph: usize) -> Option<u32> {
    self.glyphs.get(glyph).map(|glyph| glyph.advance as u32)
  }
}

/// Parses the font block; the stream must be positioned at its signature.
///
/// Glyph offsets are relative to the start of the offset array, so each
/// glyph is read with a seek-out/seek-back around its record.
pub fn read(stream: &mut (impl Read + Seek)) -> Result<FontTable, Error> {
  if !stream.next_is(&FONT_SIGNATURE)? {
    return Err(Error::FontSignature);
  }

  let height = stream.read_u8()?;
  let bit_depth = stream.read_u8()?;
  if bit_depth != 2 {
    return Err(Error::BitDepth(bit_depth));
  }
  let glyph_count = stream.read_u16::<LE>()?;
  stream.seek(io::SeekFrom::Current(RESERVED_BYTES))?;

  let table_start = stream.stream_position()?;
  let mut glyphs = Vec::with_capacity(glyph_count as usize);
  for _ in 0..glyph_count {
    let offset = stream.read_u32::<LE>()?;
    let next = stream.stream_position()?;

    stream.seek(io::SeekFrom::Start(table_start + offset as u64))?;
    let advance = stream.read_u8()?;
    let stride = stream.read_u8()?;
    let mut bitmap = vec![0u8; height as usize * stride as usize];
    stream.read_exact(&mut bitmap)?;

    stream.seek(io::SeekFrom::Start(next))?;
    glyphs.push(Glyph { advance, stride, bitmap });
  }

  Ok(FontTable { height, glyphs })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn synthetic_font_block() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&FONT_SIGNATURE);
    bytes.push(8); // height
    bytes.push(2); // bit depth
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 256]);
    // offsets, relative to the start of this array
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&18u32.to_le_bytes());
    // glyph 0
    bytes.push(5);
    bytes.push(1);
    bytes.extend_from_slice(&[0xAA; 8]);
    // glyph 1
    bytes.push(6);
    bytes.push(1);
    bytes.extend_from_slice(&[0x55; 8]);
    bytes
  }

  #[test]
  fn parses_glyph_records() {
    let font = read(&mut io::Cursor::new(synthetic_font_block())).unwrap();
    assert_eq!(font.height, 8);
    assert_eq!(font.glyphs.len(), 2);
    assert_eq!(font.glyphs[0].advance, 5);
    assert_eq!(font.glyphs[0].bitmap, [0xAA; 8]);
    assert_eq!(font.advance(1), Some(6));
    assert_eq!(font.advance(2), None);
  }

  #[test]
  fn rejects_unexpected_bit_depth() {
    let mut bytes = synthetic_font_block();
    bytes[9] = 4;
    assert!(matches!(
      read(&mut io::Cursor::new(bytes)),
      Err(Error::BitDepth(4))
    ));
  }
}
