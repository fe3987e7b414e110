use crate::crc::Crc32;
use crate::error::prelude::*;
use crate::image::Image;
use crate::io;
use crate::patch::ips;

/// CRC-32 of the RPGe v1.1 patch, the only supported source release.
pub const RPGE_V1_1_CRC32: u32 = 0xF11F_1026;

/// The patched SFC image reconstructed from its IPS patch.
#[derive(Clone, Debug)]
pub struct SourceRom {
  image: Image,
  checksum: Crc32,
}

impl SourceRom {
  /// Decodes the patch, applies it to an empty image and gates on the
  /// release checksum.
  pub fn read_ips(patch: &mut (impl io::Read + io::Seek)) -> Result<Self, Error> {
    let (image, checksum) = ips::decode(patch)?;
    if checksum.value() != RPGE_V1_1_CRC32 {
      return Err(Error::WrongRelease { checksum });
    }
    Ok(Self { image, checksum })
  }

  pub fn data(&self) -> &[u8] {
    self.image.bytes()
  }

  pub fn checksum(&self) -> Crc32 {
    self.checksum
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("Stream is not RPGe v1.1 (crc32 {checksum}, expected f11f1026).")]
  WrongRelease { checksum: Crc32 },
  #[error(transparent)]
  Patch(#[from] ips::Error),
}
