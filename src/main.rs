extern crate core;

use crate::error::prelude::*;
use crate::io::prelude::*;
use fs_err as fs;
use log::{info, warn};
use std::process;

mod cli;
mod crc;
mod error;
mod gba;
mod image;
mod io;
mod patch;
mod rom;
mod scan;
mod script;
mod table;
mod text;
mod translate;
mod trie;

fn main() -> miette::Result<()> {
  pretty_env_logger::init();
  let args: cli::Args = clap::Parser::try_parse().map_err(Error::from)?;
  run(args).map_err(|err| err.into())
}

fn run(args: cli::Args) -> Result<(), Error> {
  let mut ips = fs::File::open(&args.source_ips)?;
  let source = rom::SourceRom::read_ips(&mut ips)?;
  info!(
    "source image: {} bytes, crc32 {:08x}",
    source.data().len(),
    source.checksum().value()
  );

  let source_table = table::Table::read(io::BufReader::new(fs::File::open(&args.source_table)?))?;
  let destination_table =
    table::Table::read(io::BufReader::new(fs::File::open(&args.destination_table)?))?;

  if args.text_start > args.text_end {
    return Err(Error::Range { start: args.text_start, end: args.text_end });
  }
  let script_bytes = (source.data())
    .get(args.text_start as usize..=args.text_end as usize)
    .ok_or(Error::OutOfBounds { start: args.text_start, end: args.text_end })?;

  let mut cart = fs::File::open(&args.destination)?;
  let header = gba::read_header(&mut cart)?;
  if !header.logo_ok {
    warn!("destination logo data does not verify");
  }
  info!("destination: {} ({})", header.title(), header.serial());
  log::debug!(
    "maker {}, device {:#06x}, debugger {}, version {}",
    String::from_utf8_lossy(&header.maker),
    header.device,
    header.debugger,
    header.version
  );

  cart.seek(io::SeekFrom::Start(0))?;
  gba::find_fonts(&mut cart)?;
  let font = gba::font::read(&mut cart)?;

  cart.seek(io::SeekFrom::Start(0))?;
  gba::find_texts(&mut cart)?;
  let texts = gba::text::read(&mut cart)?;
  info!("destination text block: {} entries", texts.offsets.len());

  let translated = translate::translate(script_bytes, source_table.decode(), &destination_table);

  let item_advance = texts.max_width(script::ITEM_NAME_RANGES, &destination_table, &font);
  let ability_advance = texts.max_width(script::ABILITY_NAME_RANGES, &destination_table, &font);

  let mut mutator =
    text::Mutator::new(&translated, &destination_table, &font, item_advance, ability_advance);
  script::apply(&mut mutator);

  let mut offsets = Vec::with_capacity(mutator.lines().len());
  let mut data = Vec::new();
  for line in mutator.lines() {
    offsets.push(data.len() as u32);
    data.extend_from_slice(&destination_table.encode_string(line));
  }

  let mut writer = patch::writer::Writer::new();
  writer.seek(args.text_begin);
  writer.write_u8(texts.translations);
  writer.write_u24(offsets.len() as u32);
  writer.write_u32(data.len() as u32);
  for &offset in &offsets {
    writer.write_u32(offset);
  }
  writer.write(&data);

  let out_path = args.destination.with_extension("text.ips");
  let mut out = io::BufWriter::new(fs::File::create(&out_path)?);
  writer.compile(&mut out)?;
  info!("wrote {}", out_path.display());
  Ok(())
}

#[non_exhaustive]
#[derive(Debug, Error, Diagnostic)]
enum Error {
  #[error(transparent)]
  Cli(#[from] clap::error::Error),
  #[error(transparent)]
  IO(#[from] io::Error),
  #[error(transparent)]
  Source(#[from] rom::Error),
  #[error(transparent)]
  Table(#[from] table::Error),
  #[error(transparent)]
  Destination(#[from] gba::Error),
  #[error("Specified text start address {start:#x} is greater than text end address {end:#x}.")]
  Range { start: u32, end: u32 },
  #[error("Text range {start:#x}..{end:#x} is outside the source image.")]
  OutOfBounds { start: u32, end: u32 },
}

impl process::Termination for Error {
  fn report(self) -> process::ExitCode {
    process::ExitCode::from(match self {
      Error::Cli(_) => 1,
      Error::IO(_) => 2,
      Error::Source(rom::Error::Patch(_)) => 3,
      Error::Source(rom::Error::WrongRelease { .. }) => 4,
      Error::Table(_) => 5,
      Error::Destination(_) => 6,
      Error::Range { .. } | Error::OutOfBounds { .. } => 7,
    })
  }
}
