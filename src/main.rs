use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

/// Compiles a mini-C source file to three-address code.
#[derive(Parser)]
#[command(version, about)]
struct Args {
	/// Source file to compile
	source: PathBuf,

	/// Where to write the generated TAC
	#[arg(short, long, default_value = "IR.txt")]
	output: PathBuf,
}

fn main() {
	env_logger::init();
	let args = Args::parse();

	let source = match fs::read_to_string(&args.source) {
		Ok(source) => source,
		Err(err) => {
			eprintln!("Error opening '{}': {err}", args.source.display());
			process::exit(1);
		}
	};

	log::info!("compiling {}", args.source.display());
	let Some(ir) = minicc::compile(&source) else {
		println!("Semantic analysis failed!");
		process::exit(1);
	};

	if let Err(err) = fs::write(&args.output, ir) {
		eprintln!("Error writing '{}': {err}", args.output.display());
		process::exit(1);
	}
	log::info!("wrote {}", args.output.display());
}
