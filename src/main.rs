use std::io;
use std::path::PathBuf;

use accucpu::console::WriteConsole;
use accucpu::memory::image::StdImage;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use log::LevelFilter;
use simple_logger::SimpleLogger;

/// Runs a program image on the accumulator CPU
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Program image: the memory bank followed by the firmware
    image: PathBuf,
    /// Print the memory bank before and after execution
    #[arg(short, long)]
    dump: bool,
    /// Stop with an error if the program has not halted after this many instructions
    #[arg(long)]
    max_steps: Option<u64>,
    /// More log output, repeat for more detail
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    color_eyre::install()?; // rust error handling

    let args = Args::parse();
    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new().with_level(level).init()?; // logging

    let image = StdImage::from_file(&args.image)?;
    let mut cpu = image.into_processor();

    if args.dump {
        println!("Loaded memory:");
        cpu.memory().dump(io::stdout().lock())?;
    }

    let mut console = WriteConsole::stdout();
    let result = match args.max_steps {
        Some(limit) => cpu.run_limited(limit, &mut console).map(|_| ()),
        None => cpu.run(&mut console),
    };
    result.wrap_err_with(|| format!("while running {}", args.image.display()))?;

    println!("Program finished!");
    if args.dump {
        cpu.memory().dump(io::stdout().lock())?;
    }

    Ok(())
}
