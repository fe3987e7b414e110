use std::path;

/// Positional arguments, in pipeline order.
#[derive(Clone, Debug, clap::Parser)]
#[command(name = "retext", version, about)]
pub struct Args {
  /// IPS patch that produces the source SFC image
  pub source_ips: path::PathBuf,
  /// Character table for the source script
  pub source_table: path::PathBuf,
  /// First byte of the source text region, hexadecimal
  #[arg(value_parser = parse_hex)]
  pub text_start: u32,
  /// Last byte of the source text region, hexadecimal
  #[arg(value_parser = parse_hex)]
  pub text_end: u32,
  /// Destination cartridge image
  pub destination: path::PathBuf,
  /// Character table for the destination script
  pub destination_table: path::PathBuf,
  /// File offset the rebuilt text block is written at, decimal
  pub text_begin: u64,
}

fn parse_hex(arg: &str) -> Result<u32, String> {
  let digits = arg.trim_start_matches("0x").trim_start_matches("0X");
  u32::from_str_radix(digits, 16).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::Parser;

  #[test]
  fn parses_all_seven_arguments() {
    let args = Args::parse_from([
      "retext",
      "source.ips",
      "sfc.tbl",
      "0x210000",
      "27FFFF",
      "cart.bin",
      "agb.tbl",
      "7340032",
    ]);
    assert_eq!(args.text_start, 0x210000);
    assert_eq!(args.text_end, 0x27FFFF);
    assert_eq!(args.text_begin, 7340032);
  }

  #[test]
  fn rejects_non_hex_ranges() {
    assert!(
      Args::try_parse_from(["retext", "a.ips", "a.tbl", "0xZZ", "1", "c.bin", "b.tbl", "0"])
        .is_err()
    );
  }
}
