//! Semantic Analyzer
//!
//! Walks the AST once against a single flat, program-wide symbol table:
//! there is no nesting, no shadowing, and nothing is ever removed. Checks
//! are limited to declaration/use existence; diagnostics go to stdout and
//! [`Analyzer::check`] reports whether any were emitted. A node that fails
//! its own check is not recursed into further, but its sibling subtrees are
//! still visited.

use crate::parser::{Ast, DataType};

/// Flat name-to-type mapping shared by every function in the program.
/// Insertion-ordered so diagnostics and debug output follow declaration
/// order.
#[derive(Debug, Default)]
pub struct SymbolTable {
	symbols: Vec<(String, DataType)>,
}

impl SymbolTable {
	pub fn new() -> Self {
		Self::default()
	}

	fn declare(&mut self, name: &str, data_type: DataType) {
		self.symbols.push((name.to_string(), data_type));
	}

	pub fn lookup(&self, name: &str) -> Option<DataType> {
		self.symbols
			.iter()
			.find(|(symbol, _)| symbol == name)
			.map(|(_, data_type)| *data_type)
	}

	pub fn len(&self) -> usize {
		self.symbols.len()
	}

	pub fn is_empty(&self) -> bool {
		self.symbols.is_empty()
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, DataType)> {
		self.symbols
			.iter()
			.map(|(name, data_type)| (name.as_str(), *data_type))
	}
}

#[derive(Debug, Default)]
pub struct Analyzer {
	pub table: SymbolTable,
}

impl Analyzer {
	pub fn new() -> Self {
		Self::default()
	}

	/// Returns true iff no semantic error was found anywhere in the tree.
	pub fn check(&mut self, program: &Ast) -> bool {
		self.visit(program)
	}

	fn declare_checked(&mut self, name: &str, data_type: DataType) -> bool {
		if self.table.lookup(name).is_some() {
			println!("Semantic error: Variable '{name}' already declared");
			return false;
		}
		self.table.declare(name, data_type);
		true
	}

	fn visit(&mut self, node: &Ast) -> bool {
		match node {
			Ast::Program(functions) => self.visit_all(functions),
			Ast::Function { params, body, .. } => {
				// Parameters land in the same flat table as declarations
				let mut ok = true;
				for param in params {
					ok = self.declare_checked(&param.name, param.data_type) && ok;
				}
				self.visit(body) && ok
			}
			Ast::VarDecl {
				name,
				data_type,
				init,
			} => {
				if !self.declare_checked(name, *data_type) {
					return false;
				}
				// The name is declared before its initializer is visited, so
				// `int x = x;` resolves to the fresh slot
				match init {
					Some(init) => self.visit(init),
					None => true,
				}
			}
			Ast::Identifier(name) => {
				if self.table.lookup(name).is_none() {
					println!("Semantic error: Undefined variable '{name}'");
					return false;
				}
				true
			}
			Ast::Assign { target, value } => {
				if let Ast::Identifier(name) = target.as_ref() {
					if self.table.lookup(name).is_none() {
						println!("Semantic error: Undefined variable '{name}'");
						return false;
					}
				}
				let target_ok = self.visit(target);
				self.visit(value) && target_ok
			}
			Ast::Binary { left, right, .. } => {
				let left_ok = self.visit(left);
				self.visit(right) && left_ok
			}
			Ast::Unary { operand, .. } => self.visit(operand),
			Ast::If {
				condition,
				then_branch,
				else_branch,
			} => {
				let condition_ok = self.visit(condition);
				let then_ok = self.visit(then_branch);
				self.visit_optional(else_branch) && condition_ok && then_ok
			}
			Ast::While { condition, body } => {
				let condition_ok = self.visit(condition);
				self.visit(body) && condition_ok
			}
			Ast::For {
				init,
				condition,
				step,
				body,
			} => {
				let init_ok = self.visit_optional(init);
				let condition_ok = self.visit_optional(condition);
				let step_ok = self.visit_optional(step);
				self.visit(body) && init_ok && condition_ok && step_ok
			}
			Ast::Return(value) => self.visit_optional(value),
			Ast::Block(statements) => self.visit_all(statements),
			Ast::Call { args, .. } => self.visit_all(args),
			Ast::IntLiteral(_)
			| Ast::FloatLiteral(_)
			| Ast::CharLiteral(_)
			| Ast::StringLiteral(_) => true,
		}
	}

	fn visit_all(&mut self, nodes: &[Ast]) -> bool {
		// Every sibling is visited even after a failure
		nodes.iter().fold(true, |ok, node| self.visit(node) && ok)
	}

	fn visit_optional(&mut self, node: &Option<Box<Ast>>) -> bool {
		match node {
			Some(node) => self.visit(node),
			None => true,
		}
	}
}

mod test {
	#[allow(unused_imports)]
	use super::*;
	#[allow(unused_imports)]
	use crate::parser::parse;

	#[allow(dead_code)]
	fn check(source: &str) -> bool {
		Analyzer::new().check(&parse(source))
	}

	#[test]
	fn redeclaration_is_rejected() {
		assert!(!check("int main() { int x; int x; }"));
		// The table is flat across functions and blocks
		assert!(!check("int f() { int a; return a; } int g() { int a; return a; }"));
		assert!(!check("int main() { int x; { int x; } }"));
	}

	#[test]
	fn parameter_names_share_the_flat_table() {
		assert!(check("int f(int n) { return n; }"));
		assert!(!check("int f(int n) { int n; return n; }"));
		assert!(!check("int f(int n) { return 0; } int g(int n) { return 1; }"));
	}

	#[test]
	fn undefined_references_are_rejected() {
		assert!(!check("int main() { return x; }"));
		assert!(!check("int main() { x = 1; }"));
		assert!(!check("int main() { int y = x + 1; }"));
		assert!(!check("int main() { f(x); }"));
	}

	#[test]
	fn self_reference_in_initializer_is_legal() {
		assert!(check("int main() { int x = x; }"));
	}

	#[test]
	fn errors_in_one_function_do_not_mask_later_declarations() {
		let mut analyzer = Analyzer::new();
		let ok = analyzer.check(&parse(
			"int f() { return missing; } int g() { int a; return a; }",
		));
		assert!(!ok);
		// g's body was still visited and its declaration recorded
		assert!(analyzer.table.lookup("a").is_some());
	}

	#[test]
	fn table_contents() {
		let mut analyzer = Analyzer::new();
		assert!(analyzer.check(&parse("int f(int n) { int a; return a; }")));
		let names: Vec<_> = analyzer.table.iter().map(|(name, _)| name.to_string()).collect();
		assert_eq!(names, vec!["n", "a"]);
		assert_eq!(analyzer.table.lookup("a"), Some(DataType::Int));
		assert_eq!(analyzer.table.lookup("missing"), None);
	}
}
