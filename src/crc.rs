use crate::patch::Record;
use std::fmt;

/// A finalized CRC-32/IEEE checksum value.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Crc32(u32);

impl Crc32 {
  pub fn new(value: u32) -> Self {
    Self(value)
  }

  pub fn value(&self) -> u32 {
    self.0
  }
}

impl fmt::Display for Crc32 {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:08x}", self.0)
  }
}

/// Streaming CRC-32 over patch content.
///
/// Accepts raw bytes, little-endian integers and whole IPS records. A record
/// is hashed as its on-wire big-endian encoding, so hashing the magic, every
/// record and the end-of-file sentinel reproduces the checksum of the patch
/// file itself.
#[derive(Clone, Debug, Default)]
pub struct Hasher {
  inner: crc32fast::Hasher,
}

impl Hasher {
  pub fn new() -> Self {
    Self { inner: crc32fast::Hasher::new() }
  }

  pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
    self.inner.update(bytes);
    self
  }

  pub fn write_u8(&mut self, value: u8) -> &mut Self {
    self.write(&[value])
  }

  pub fn write_u16(&mut self, value: u16) -> &mut Self {
    self.write(&value.to_le_bytes())
  }

  pub fn write_u32(&mut self, value: u32) -> &mut Self {
    self.write(&value.to_le_bytes())
  }

  pub fn write_record(&mut self, record: &Record) -> &mut Self {
    let mut wire = Vec::with_capacity(record.wire_len());
    record.encode_into(&mut wire);
    self.write(&wire)
  }

  pub fn finalize(self) -> Crc32 {
    Crc32(self.inner.finalize())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::patch::{Payload, Record};

  #[test]
  fn check_value() {
    let mut hasher = Hasher::new();
    hasher.write(b"123456789");
    assert_eq!(hasher.finalize().value(), 0xCBF4_3926);
  }

  #[test]
  fn record_hash_matches_wire_bytes() {
    let records = [
      Record { offset: 0x123456, payload: Payload::Copy(vec![0xAA, 0xBB, 0xCC]) },
      Record { offset: 0x000005, payload: Payload::Fill { len: 4, value: 0x2A } },
    ];

    let mut by_record = Hasher::new();
    let mut wire = Vec::new();
    for record in &records {
      by_record.write_record(record);
      record.encode_into(&mut wire);
    }

    let mut by_bytes = Hasher::new();
    by_bytes.write(&wire);
    assert_eq!(by_record.finalize(), by_bytes.finalize());
  }

  #[test]
  fn integers_hash_little_endian() {
    let mut ints = Hasher::new();
    ints.write_u16(0x3412).write_u32(0x0201_F00D);

    let mut bytes = Hasher::new();
    bytes.write(&[0x12, 0x34, 0x0D, 0xF0, 0x01, 0x02]);
    assert_eq!(ints.finalize(), bytes.finalize());
  }
}
