use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use zpipe_codecs::{ZstdCompressor, ZstdDecompressor};
use zpipe_core::{CompressWriter, Compressor as _, DecompressReader, Param};

// ── CLI definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "zpipe",
    about = "Streaming Zstandard compression and decompression for files and pipes",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress a file or stream into a Zstandard frame
    Compress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
        /// Compression level (1 = fast / larger, 22 = slow / smallest)
        #[arg(short, long, default_value_t = 3)]
        level: i32,
        /// Append a content checksum to the frame
        #[arg(long)]
        checksum: bool,
    },
    /// Decompress a Zstandard frame back to raw bytes
    Decompress {
        /// Source file ("-" reads stdin)
        input: PathBuf,
        /// Destination file ("-" writes stdout)
        output: PathBuf,
    },
}

// ── stream selection ───────────────────────────────────────────────────────

fn open_input(path: &PathBuf) -> anyhow::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

fn open_output(path: &PathBuf) -> anyhow::Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdout().lock()));
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    Ok(Box::new(BufWriter::new(file)))
}

// ── commands ───────────────────────────────────────────────────────────────

fn compress(
    input: &PathBuf,
    output: &PathBuf,
    level: i32,
    checksum: bool,
) -> anyhow::Result<()> {
    let mut source = open_input(input)?;
    let sink = open_output(output)?;

    let mut compressor = ZstdCompressor::with_level(level)?;
    if checksum {
        compressor.set_parameter(Param::ChecksumFlag(true))?;
    }

    let mut writer = CompressWriter::new(sink, Box::new(compressor));
    io::copy(&mut source, &mut writer).context("compressing")?;
    writer.close().context("finalizing frame")?;
    Ok(())
}

fn decompress(input: &PathBuf, output: &PathBuf) -> anyhow::Result<()> {
    let source = open_input(input)?;
    let mut sink = open_output(output)?;

    let mut reader = DecompressReader::new(source, Box::new(ZstdDecompressor::new()?));
    io::copy(&mut reader, &mut sink).context("decompressing")?;
    reader.close()?;
    sink.flush()?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Compress {
            input,
            output,
            level,
            checksum,
        } => compress(&input, &output, level, checksum),
        Commands::Decompress { input, output } => decompress(&input, &output),
    }
}
