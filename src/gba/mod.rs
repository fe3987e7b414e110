use crate::error::prelude::*;
use crate::io::prelude::*;
use crate::{io, scan};

pub mod font;
pub mod huff;
pub mod text;

pub const FONT_SIGNATURE: [u8; 8] = [0x00, 0x00, 0x00, 0x00, b'F', b'O', b'N', b'T'];
pub const TEXT_SIGNATURE: [u8; 8] = [0x00, 0x00, 0x00, 0x00, b'T', b'E', b'X', b'T'];

/// The cartridge header, read from the start of the image.
#[derive(Clone, Debug)]
pub struct Header {
  pub software_title: [u8; 12],
  pub game_serial: [u8; 4],
  pub maker: [u8; 2],
  pub device: u16,
  pub debugger: bool,
  pub version: u8,
  pub logo_ok: bool,
}

impl Header {
  pub fn title(&self) -> String {
    String::from_utf8_lossy(&self.software_title)
      .trim_end_matches('\0')
      .to_string()
  }

  pub fn serial(&self) -> String {
    String::from_utf8_lossy(&self.game_serial).to_string()
  }
}

/// Reads and validates the header; the stream must be positioned at the
/// start of the cartridge.
///
/// A logo that fails to verify is reported in the header rather than raised;
/// a bad fixed byte or complement is fatal.
pub fn read_header(stream: &mut (impl Read + Seek)) -> Result<Header, Error> {
  stream.seek(io::SeekFrom::Current(4))?;
  let logo_ok = verify_logo(stream)?;

  let software_title = stream.read_array::<12>()?;
  let game_serial = stream.read_array::<4>()?;
  let maker = stream.read_array::<2>()?;
  let fixed = stream.read_u8()?;
  if fixed != 0x96 {
    return Err(Error::FixedByte(fixed));
  }
  let device = stream.read_u16::<LE>()?;
  stream.seek(io::SeekFrom::Current(7))?;
  let version = stream.read_u8()?;
  let complement = stream.read_u8()?;

  stream.seek(io::SeekFrom::Current(-30))?;
  let checked = stream.read_array::<28>()?;
  let sum = checked.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte));
  if complement != 0u8.wrapping_sub(sum.wrapping_add(0x19)) {
    return Err(Error::Complement);
  }

  Ok(Header {
    software_title,
    game_serial,
    maker,
    device: device & 0x7FFF,
    debugger: device & 0x8000 != 0,
    version,
    logo_ok,
  })
}

/// Positions the stream at the font block signature.
pub fn find_fonts(stream: &mut (impl Read + Seek)) -> Result<u64, Error> {
  scan::find(stream, &FONT_SIGNATURE)?.ok_or(Error::FontSignature)
}

/// Positions the stream at the text block signature.
pub fn find_texts(stream: &mut (impl Read + Seek)) -> Result<u64, Error> {
  scan::find(stream, &TEXT_SIGNATURE)?.ok_or(Error::TextSignature)
}

const LOGO_TREE: huff::Huff<31> = huff::Huff::new([
  0x40, 0x00, 0x00, 0x00, 0x01, 0x81, 0x82, 0x82, 0x83, 0x0F, 0x83, 0x0C, 0xC3, 0x03, 0x83, 0x01,
  0x83, 0x04, 0xC3, 0x08, 0x0E, 0x02, 0xC2, 0x0D, 0xC2, 0x07, 0x0B, 0x06, 0x0A, 0x05, 0x09,
]);

const LOGO_TILES_WIDTH: usize = 13;

#[rustfmt::skip]
const LOGO_BITMAP: [u8; 208] = [
  0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
  0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x1e, 0x3c, 0xf0, 0x3c, 0x00, 0x00, 0x00,
  0x00, 0x00, 0x00, 0xc0, 0x03, 0x00, 0x21, 0x7c, 0xf0, 0x3c, 0x00, 0xc0, 0x03, 0x00, 0x00, 0x00,
  0xc0, 0x03, 0x80, 0x4e, 0x7c, 0xf0, 0x3c, 0x00, 0xc0, 0x03, 0x00, 0x00, 0x00, 0xc0, 0x03, 0x80,
  0x52, 0xfc, 0xf0, 0x00, 0x00, 0xf0, 0x0f, 0x00, 0x00, 0x00, 0xc0, 0x03, 0x80, 0x4e, 0xfc, 0xf1,
  0x3c, 0xef, 0xf1, 0x8f, 0x1f, 0xde, 0x03, 0xde, 0xc3, 0x8f, 0x52, 0xbc, 0xf1, 0x3c, 0xff, 0xc7,
  0xc3, 0x39, 0xfe, 0x0f, 0xff, 0xe3, 0x1c, 0x21, 0xbc, 0xf3, 0x3c, 0x1f, 0xcf, 0xe3, 0x70, 0x3e,
  0x9e, 0xc7, 0x73, 0x38, 0x1e, 0x3c, 0xf7, 0x3c, 0x0f, 0xcf, 0xf3, 0xf0, 0x1e, 0xde, 0xc3, 0x7b,
  0x78, 0x00, 0x3c, 0xf6, 0x3c, 0x0f, 0xcf, 0xf3, 0xff, 0x1e, 0xde, 0xc3, 0x7b, 0x78, 0x00, 0x3c,
  0xfe, 0x3c, 0x0f, 0xcf, 0xf3, 0x00, 0x1e, 0xde, 0xc3, 0x7b, 0x78, 0x00, 0x3c, 0xfc, 0x3c, 0x0f,
  0xcf, 0xf3, 0xf0, 0x1e, 0xde, 0xc3, 0x7b, 0x78, 0x00, 0x3c, 0xf8, 0x3c, 0x0f, 0xcf, 0xe3, 0xf0,
  0x1e, 0x9e, 0xc3, 0x73, 0x38, 0x00, 0x3c, 0xf8, 0x3c, 0x0f, 0xcf, 0xc3, 0x79, 0x1e, 0x1e, 0xe7,
  0xe3, 0x1c, 0x00, 0x3c, 0xf0, 0x3c, 0x0f, 0xcf, 0x83, 0x1f, 0x1e, 0x1e, 0xfe, 0xc3, 0x0f, 0x00,
];

/// Decompresses the header logo and walks its tile checksums against the
/// reference bitmap.
fn verify_logo(stream: &mut impl Read) -> io::Result<bool> {
  let data = LOGO_TREE.decompress4(stream, 156)?;
  let Some(word) = data.first_chunk::<4>() else {
    return Ok(false);
  };
  let size = (u32::from_le_bytes(*word) >> 8) as usize;

  let mut tile_start = 0;
  let mut tile_y = 0;
  let mut sum: u16 = 0;
  let mut read = 4;
  let mut remaining = size;
  while remaining > 0 {
    let Some(&[lo, hi]) = data.get(read..read + 2).and_then(|pair| pair.first_chunk::<2>()) else {
      return Ok(false);
    };
    sum = sum.wrapping_add(u16::from_le_bytes([lo, hi]));
    for byte in sum.to_le_bytes() {
      match LOGO_BITMAP.get(tile_start + tile_y * LOGO_TILES_WIDTH) {
        Some(&expected) if expected == byte => tile_y += 1,
        _ => return Ok(false),
      }
    }
    if tile_y == 8 {
      tile_y = 0;
      tile_start += 1;
      if tile_start % LOGO_TILES_WIDTH == 0 {
        tile_start += LOGO_TILES_WIDTH * 7;
      }
    }
    read += 2;
    remaining = remaining.saturating_sub(2);
  }
  Ok(true)
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("Cartridge header is missing the fixed byte (expected 0x96, got {0:#04x}).")]
  FixedByte(u8),
  #[error("Cartridge header complement check failed.")]
  Complement,
  #[error("No font block signature in the cartridge image.")]
  FontSignature,
  #[error("No text block signature in the cartridge image.")]
  TextSignature,
  #[error("Font block has unexpected bit depth (expected 2, got {0}).")]
  BitDepth(u8),
  #[error(transparent)]
  IO(#[from] io::Error),
}
