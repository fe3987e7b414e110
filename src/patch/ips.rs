use crate::error::prelude::*;
use crate::image::Image;
use crate::io::prelude::*;
use crate::patch::{Payload, Record, EOF, MAGIC};
use crate::{crc, io};
use std::num;

/// Decodes an IPS stream into a byte image, hashing the patch as it goes.
///
/// The returned checksum covers the magic, every record in wire order and the
/// end-of-file sentinel, which makes it equal to the checksum of the patch
/// bytes themselves.
///
/// A record offset may spell out the bytes `EOF`; the lookahead is treated as
/// the sentinel only when nothing follows it.
pub fn decode(patch: &mut (impl Read + Seek)) -> Result<(Image, crc::Crc32), Error> {
  let end: u64 = patch.seek(io::SeekFrom::End(0))?;
  patch.seek(io::SeekFrom::Start(0))?;
  let mut patch = io::BufReader::new(patch);

  if !patch.next_is(MAGIC)? {
    return Err(Error::Magic);
  }
  let mut hash = crc::Hasher::new();
  hash.write(MAGIC);

  let mut image = Image::new();
  let mut pos = MAGIC.len() as u64;
  loop {
    let head = patch.read_array::<3>()?;
    pos += 3;
    if &head == EOF && pos == end {
      hash.write(EOF);
      break;
    }

    let offset = u32::from_be_bytes([0, head[0], head[1], head[2]]);
    let record = match num::NonZeroU16::new(patch.read_u16::<BE>()?) {
      Some(size) => {
        let mut data = vec![0u8; size.get() as usize];
        patch.read_exact(&mut data)?;
        pos += 2 + size.get() as u64;
        Record { offset, payload: Payload::Copy(data) }
      }
      None => {
        let len = num::NonZeroU16::new(patch.read_u16::<BE>()?).ok_or(Error::RunLength)?;
        let value = patch.read_u8()?;
        pos += 5;
        Record { offset, payload: Payload::Fill { len: len.get(), value } }
      }
    };
    hash.write_record(&record);
    image.apply(&record);
  }

  Ok((image, hash.finalize()))
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("IPS patch didn't start with the correct magic string.")]
  Magic,
  #[error("Encountered a 0-length fill run. The IPS file may be corrupt.")]
  RunLength,
  #[error(transparent)]
  IO(#[from] io::Error),
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decode_bytes(bytes: &[u8]) -> Result<(Image, crc::Crc32), Error> {
    decode(&mut io::Cursor::new(bytes.to_vec()))
  }

  #[test]
  fn decodes_a_copy_record() {
    let patch = [
      0x50, 0x41, 0x54, 0x43, 0x48, // PATCH
      0x00, 0x00, 0x00, 0x00, 0x03, 0x41, 0x42, 0x43, // copy "ABC" at 0
      0x45, 0x4F, 0x46, // EOF
    ];
    let (image, _) = decode_bytes(&patch).unwrap();
    assert_eq!(image.bytes(), b"ABC");
  }

  #[test]
  fn decodes_a_fill_record() {
    let patch = [
      0x50, 0x41, 0x54, 0x43, 0x48, // PATCH
      0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x04, 0x2A, // fill 4 x 0x2A at 5
      0x45, 0x4F, 0x46, // EOF
    ];
    let (image, _) = decode_bytes(&patch).unwrap();
    assert_eq!(image.bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x2A, 0x2A, 0x2A, 0x2A]);
  }

  #[test]
  fn checksum_covers_the_whole_patch() {
    let patch = [
      0x50, 0x41, 0x54, 0x43, 0x48, //
      0x00, 0x00, 0x00, 0x00, 0x03, 0x41, 0x42, 0x43, //
      0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x04, 0x2A, //
      0x45, 0x4F, 0x46,
    ];
    let (_, checksum) = decode_bytes(&patch).unwrap();
    assert_eq!(checksum.value(), crc32fast::hash(&patch));
  }

  #[test]
  fn offset_spelling_eof_is_not_the_sentinel() {
    // A record at offset 0x454F46 ("EOF") followed by the real sentinel.
    let patch = [
      0x50, 0x41, 0x54, 0x43, 0x48, //
      0x45, 0x4F, 0x46, 0x00, 0x01, 0x7E, //
      0x45, 0x4F, 0x46,
    ];
    let (image, _) = decode_bytes(&patch).unwrap();
    assert_eq!(image.len(), 0x454F46 + 1);
    assert_eq!(image.bytes()[0x454F46], 0x7E);
  }

  #[test]
  fn rejects_missing_magic() {
    assert!(matches!(decode_bytes(b"PETCH\x45\x4F\x46"), Err(Error::Magic)));
  }

  #[test]
  fn truncated_record_is_fatal() {
    let patch = [0x50, 0x41, 0x54, 0x43, 0x48, 0x00, 0x00, 0x00, 0x00];
    match decode_bytes(&patch) {
      Err(Error::IO(err)) => assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof),
      other => panic!("expected UnexpectedEof, got {other:?}"),
    }
  }

  #[test]
  fn zero_length_fill_is_fatal() {
    let patch = [
      0x50, 0x41, 0x54, 0x43, 0x48, //
      0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2A, //
      0x45, 0x4F, 0x46,
    ];
    assert!(matches!(decode_bytes(&patch), Err(Error::RunLength)));
  }
}
