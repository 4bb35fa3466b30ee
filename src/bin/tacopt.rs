use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;

use minicc::optimizer;
use minicc::tac;

/// Constant folding optimizer for three-address code.
///
/// Re-parses the textual TAC written by the compiler, folds and propagates
/// constants within each function, and re-emits the result. Propagation is
/// flow-insensitive: it follows emission order and does not model branch
/// merges.
#[derive(Parser)]
#[command(version, about)]
struct Args {
	/// TAC file to optimize
	#[arg(default_value = "IR.txt")]
	input: PathBuf,

	/// Where to write the optimized TAC
	#[arg(default_value = "Output.txt")]
	output: PathBuf,
}

fn main() {
	env_logger::init();
	let args = Args::parse();

	let text = match fs::read_to_string(&args.input) {
		Ok(text) => text,
		Err(err) => {
			eprintln!("Error: Cannot open input file '{}': {err}", args.input.display());
			process::exit(1);
		}
	};

	let mut code = tac::parse_lines(&text);
	println!("Read {} instructions from '{}'", code.len(), args.input.display());

	let changed = optimizer::optimize(&mut code);
	println!("Total constant folding optimizations: {changed}");

	if let Err(err) = fs::write(&args.output, tac::print_lines(&code)) {
		eprintln!("Error: Cannot create output file '{}': {err}", args.output.display());
		process::exit(1);
	}

	let folded = code.iter().filter(|instr| instr.is_optimized).count();
	println!("Optimized instructions: {folded} of {}", code.len());
	println!("Wrote optimized code to '{}'", args.output.display());
}
