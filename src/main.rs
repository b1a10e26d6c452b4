use std::path::Path;

use anyhow::Context;
use clap::{arg, command, ArgMatches, Command};
use huffpack::{
    huffman::{CodeTable, FrequencyTable},
    CodecOptions,
};
use tracing::Level;

fn main() -> anyhow::Result<()> {
    let matches = command!()
        .arg(
            arg!(--"log-level" <LEVEL> "trace, debug, info, warn or error")
                .required(false)
                .default_value("warn")
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("encode")
                .about("Compress a file into a code table and a packed stream")
                .arg(arg!(input: <INPUT> "File to compress"))
                .arg(arg!(table: <TABLE> "Code table output path"))
                .arg(arg!(output: <OUTPUT> "Compressed output path"))
                .arg(arg!(--classic "Write the table without a symbol count")),
        )
        .subcommand(
            Command::new("decode")
                .about("Restore a file from a packed stream and its code table")
                .arg(arg!(input: <COMPRESSED> "Compressed file"))
                .arg(arg!(table: <TABLE> "Code table file"))
                .arg(arg!(output: <OUTPUT> "Decompressed output path")),
        )
        .subcommand(
            Command::new("stats")
                .about("Print the frequency and code table of a file")
                .arg(arg!(input: <INPUT> "File to analyse")),
        )
        .get_matches();

    init_logging(matches.get_one::<String>("log-level").map(String::as_str));

    match matches.subcommand() {
        Some(("encode", matches)) => {
            let (input, table, output) = paths(matches);
            let options = if matches.is_present("classic") {
                CodecOptions::classic()
            } else {
                CodecOptions::default()
            };
            let summary = huffpack::encode_with(input, table, output, options)
                .with_context(|| format!("Failed to encode {input}"))?;
            println!(
                "{} bytes -> {} bytes ({} distinct symbols)",
                summary.symbols, summary.bytes, summary.distinct_symbols
            );
        }
        Some(("decode", matches)) => {
            let (input, table, output) = paths(matches);
            let summary = huffpack::decode(input, table, output)
                .with_context(|| format!("Failed to decode {input}"))?;
            println!("{} bytes restored", summary.symbols);
        }
        Some(("stats", matches)) => {
            let input = matches.get_one::<String>("input").unwrap();
            print_stats(input)?;
        }
        _ => unreachable!("a subcommand is required"),
    }

    Ok(())
}

fn paths(matches: &ArgMatches) -> (&str, &str, &str) {
    let get = |id| matches.get_one::<String>(id).unwrap().as_str();
    (get("input"), get("table"), get("output"))
}

fn init_logging(level: Option<&str>) {
    let level = match level.unwrap_or("warn").to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn print_stats<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Couldn't open {}", path.display()))?;
    let frequencies = FrequencyTable::from_reader(std::io::BufReader::new(file))?;
    let table = CodeTable::from_frequencies(&frequencies);

    for (symbol, code) in table.entries() {
        println!("\t{symbol}\t{}\t{code}", frequencies.count(*symbol));
    }

    let bits = table.encoded_bits(&frequencies);
    println!(
        "{} bytes, {} distinct symbols, {} bits encoded (~{} bytes)",
        frequencies.total(),
        table.len(),
        bits,
        (bits + 7) / 8
    );
    Ok(())
}
