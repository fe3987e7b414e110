pub use std::io::*;

/// Exports all traits and marker types used by this crate.
pub mod prelude {
  pub use super::ReadExt;
  pub use byteorder::{ReadBytesExt, BE, LE};
  pub use std::io::prelude::*;
}

/// Fixed-size reads for the patch and cartridge parsers.
pub trait ReadExt: Read {
  fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
    let mut array = [0u8; N];
    self.read_exact(&mut array)?;
    Ok(array)
  }

  /// Reads the next `N` bytes and reports whether they equal `expected`.
  /// The patch magic and the cartridge block signatures are all checked
  /// this way.
  fn next_is<const N: usize>(&mut self, expected: &[u8; N]) -> Result<bool> {
    Ok(&self.read_array::<N>()? == expected)
  }
}

impl<T: Read> ReadExt for T {}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn next_is_consumes_what_it_checks() {
    let mut stream = Cursor::new(b"PATCHEOF".to_vec());
    assert!(stream.next_is(b"PATCH").unwrap());
    assert!(stream.next_is(b"EOF").unwrap());
  }

  #[test]
  fn next_is_reports_a_mismatch() {
    let mut stream = Cursor::new(b"PETCH".to_vec());
    assert!(!stream.next_is(b"PATCH").unwrap());
  }

  #[test]
  fn short_reads_are_unexpected_eof() {
    let mut stream = Cursor::new(b"PAT".to_vec());
    let err = stream.next_is(b"PATCH").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
  }
}
