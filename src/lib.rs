pub mod analyzer;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod tac;
pub mod tac_gen;

use analyzer::Analyzer;

/// Runs the whole front end over one in-memory source buffer and returns
/// the generated TAC text, or `None` when the semantic check fails. Parse
/// errors are reported and compilation carries on past them.
pub fn compile(source: &str) -> Option<String> {
	let ast = parser::parse(source);

	let mut analyzer = Analyzer::new();
	if !analyzer.check(&ast) {
		return None;
	}
	log::debug!("symbol table holds {} entries", analyzer.table.len());

	Some(tac_gen::generate(&ast))
}
