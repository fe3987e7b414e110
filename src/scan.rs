use crate::io;
use crate::io::prelude::*;

const BUFFER_SIZE: usize = 0x1000;

/// Scans forward for `needle` and leaves the stream positioned at its first
/// byte. Chunks overlap by `needle.len() - 1` bytes so a match can't straddle
/// a chunk boundary.
pub fn find(stream: &mut (impl Read + Seek), needle: &[u8]) -> io::Result<Option<u64>> {
  let mut buffer = [0u8; BUFFER_SIZE];
  loop {
    let start = stream.stream_position()?;
    let filled = fill(stream, &mut buffer)?;
    if let Some(at) = search(&buffer[..filled], needle) {
      let found = start + at as u64;
      stream.seek(io::SeekFrom::Start(found))?;
      return Ok(Some(found));
    }
    if filled < buffer.len() {
      return Ok(None);
    }
    stream.seek(io::SeekFrom::Current(-((needle.len() - 1) as i64)))?;
  }
}

fn fill(stream: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
  let mut filled = 0;
  while filled < buffer.len() {
    match stream.read(&mut buffer[filled..]) {
      Ok(0) => break,
      Ok(amount) => filled += amount,
      Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
      Err(err) => return Err(err),
    }
  }
  Ok(filled)
}

fn search(haystack: &[u8], needle: &[u8]) -> Option<usize> {
  if needle.is_empty() || haystack.len() < needle.len() {
    return None;
  }
  haystack.windows(needle.len()).position(|window| window == needle)
}
