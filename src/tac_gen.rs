//! Three Address Code Generation
//!
//! Lowers the AST into the textual TAC consumed by the optimizer. One
//! [`generate`] call owns one generator context: the `t<n>` and `L<n>`
//! counters are monotonic for that run and start over on the next. Every
//! expression lowering returns the name of the temporary holding its
//! result, and the caller references exactly that name.

use crate::parser::Ast;

pub fn generate(program: &Ast) -> String {
	let mut generator = TacGen::new();
	generator.gen_node(program);
	generator.out
}

struct TacGen {
	temp_count: usize,
	label_count: usize,
	out: String,
}

impl TacGen {
	fn new() -> Self {
		Self {
			temp_count: 0,
			label_count: 0,
			out: String::new(),
		}
	}

	fn new_temp(&mut self) -> String {
		let temp = format!("t{}", self.temp_count);
		self.temp_count += 1;
		temp
	}

	fn new_label(&mut self) -> String {
		let label = format!("L{}", self.label_count);
		self.label_count += 1;
		label
	}

	fn emit(&mut self, instruction: &str) {
		self.out.push_str("  ");
		self.out.push_str(instruction);
		self.out.push('\n');
	}

	fn emit_label(&mut self, label: &str) {
		self.out.push_str(label);
		self.out.push_str(":\n");
	}

	/// The text a node contributes when it stands on the left of an
	/// assignment. Only identifiers make sense there, but the parser does
	/// not enforce that, so fall back to whatever name the node carries.
	fn lvalue_name(node: &Ast) -> &str {
		match node {
			Ast::Identifier(name) => name,
			Ast::Call { callee, .. } => callee,
			Ast::IntLiteral(text)
			| Ast::FloatLiteral(text)
			| Ast::CharLiteral(text)
			| Ast::StringLiteral(text) => text,
			_ => "",
		}
	}

	fn gen_node(&mut self, node: &Ast) {
		match node {
			Ast::Program(functions) => {
				for function in functions {
					self.gen_node(function);
				}
			}
			Ast::Function {
				name, params, body, ..
			} => {
				self.out.push_str(&format!("FUNCTION {name}:\n"));
				for param in params {
					self.emit(&format!("PARAM {}", param.name));
				}
				self.gen_node(body);
				self.out.push_str(&format!("END FUNCTION {name}\n\n"));
			}
			Ast::Block(statements) => {
				for statement in statements {
					self.gen_node(statement);
				}
			}
			Ast::VarDecl { name, init, .. } => {
				self.emit(&format!("DECLARE {name}"));
				if let Some(init) = init {
					let value = self.gen_expression(init);
					self.emit(&format!("{name} = {value}"));
				}
			}
			Ast::Assign { target, value } => {
				let value = self.gen_expression(value);
				self.emit(&format!("{} = {}", Self::lvalue_name(target), value));
			}
			Ast::If {
				condition,
				then_branch,
				else_branch,
			} => {
				let condition = self.gen_expression(condition);
				let else_label = self.new_label();
				let end_label = self.new_label();
				self.emit(&format!("IF_FALSE {condition} GOTO {else_label}"));
				self.gen_node(then_branch);
				self.emit(&format!("GOTO {end_label}"));
				self.emit_label(&else_label);
				if let Some(else_branch) = else_branch {
					self.gen_node(else_branch);
				}
				self.emit_label(&end_label);
			}
			Ast::While { condition, body } => {
				let start_label = self.new_label();
				let end_label = self.new_label();
				self.emit_label(&start_label);
				let condition = self.gen_expression(condition);
				self.emit(&format!("IF_FALSE {condition} GOTO {end_label}"));
				self.gen_node(body);
				self.emit(&format!("GOTO {start_label}"));
				self.emit_label(&end_label);
			}
			Ast::For {
				init,
				condition,
				step,
				body,
			} => {
				let start_label = self.new_label();
				let end_label = self.new_label();
				if let Some(init) = init {
					self.gen_node(init);
				}
				self.emit_label(&start_label);
				if let Some(condition) = condition {
					let condition = self.gen_expression(condition);
					self.emit(&format!("IF_FALSE {condition} GOTO {end_label}"));
				}
				self.gen_node(body);
				if let Some(step) = step {
					self.gen_expression(step);
				}
				self.emit(&format!("GOTO {start_label}"));
				self.emit_label(&end_label);
			}
			Ast::Return(value) => match value {
				Some(value) => {
					let value = self.gen_expression(value);
					self.emit(&format!("RETURN {value}"));
				}
				None => self.emit("RETURN"),
			},
			// A bare expression in statement position still lowers; its
			// result temporary is simply never referenced
			_ => {
				self.gen_expression(node);
			}
		}
	}

	/// Lowers an expression and returns the operand naming its result.
	fn gen_expression(&mut self, node: &Ast) -> String {
		match node {
			Ast::IntLiteral(text)
			| Ast::FloatLiteral(text)
			| Ast::CharLiteral(text)
			| Ast::StringLiteral(text) => {
				let temp = self.new_temp();
				self.emit(&format!("{temp} = {text}"));
				temp
			}
			Ast::Identifier(name) => {
				let temp = self.new_temp();
				self.emit(&format!("{temp} = {name}"));
				temp
			}
			Ast::Binary { op, left, right } => {
				let left = self.gen_expression(left);
				let right = self.gen_expression(right);
				let temp = self.new_temp();
				self.emit(&format!("{temp} = {left} {} {right}", op.as_str()));
				temp
			}
			Ast::Unary { op, operand } => {
				let operand = self.gen_expression(operand);
				let temp = self.new_temp();
				self.emit(&format!("{temp} = {}{operand}", op.as_str()));
				temp
			}
			Ast::Call { callee, args } => {
				for arg in args {
					let arg = self.gen_expression(arg);
					self.emit(&format!("PUSH_PARAM {arg}"));
				}
				let temp = self.new_temp();
				self.emit(&format!("{temp} = CALL {callee}, {}", args.len()));
				temp
			}
			_ => String::new(),
		}
	}
}

mod test {
	#[allow(unused_imports)]
	use super::*;
	#[allow(unused_imports)]
	use crate::parser::parse;

	#[allow(dead_code)]
	fn tac(source: &str) -> String {
		generate(&parse(source))
	}

	#[test]
	fn assignments() {
		let expected = "\
FUNCTION main:
  DECLARE x
  t0 = 5
  x = t0
  t1 = x
  RETURN t1
END FUNCTION main\n\n";
		assert_eq!(
			tac("int main() {
				int x;
				x = 5;
				return x;
			}"),
			expected
		);
	}

	#[test]
	fn declaration_with_initializer() {
		let expected = "\
FUNCTION main:
  DECLARE x
  t0 = 1
  t1 = 2
  t2 = t0 + t1
  x = t2
END FUNCTION main\n\n";
		assert_eq!(tac("int main() { int x = 1 + 2; }"), expected);
	}

	#[test]
	fn binary_operands_are_threaded() {
		// Each leaf lands in its own temp and the combining instruction
		// references those exact temps
		let expected = "\
FUNCTION main:
  DECLARE a
  t0 = 2
  t1 = 3
  t2 = t0 + t1
  a = t2
END FUNCTION main\n\n";
		assert_eq!(tac("int main() { int a; a = 2 + 3; }"), expected);
	}

	#[test]
	fn unary_minus() {
		let expected = "\
FUNCTION main:
  DECLARE x
  t0 = y
  t1 = -t0
  x = t1
END FUNCTION main\n\n";
		assert_eq!(tac("int main() { int x; x = -y; }"), expected);
	}

	#[test]
	fn if_else_labels() {
		let expected = "\
FUNCTION main:
  DECLARE x
  t0 = x
  t1 = 1
  t2 = t0 < t1
  IF_FALSE t2 GOTO L0
  t3 = 2
  x = t3
  GOTO L1
L0:
  t4 = 3
  x = t4
L1:
END FUNCTION main\n\n";
		assert_eq!(
			tac("int main() {
				int x;
				if (x < 1) {
					x = 2;
				} else {
					x = 3;
				}
			}"),
			expected
		);
	}

	#[test]
	fn while_labels() {
		let expected = "\
FUNCTION main:
L0:
  t0 = x
  IF_FALSE t0 GOTO L1
  t1 = 0
  x = t1
  GOTO L0
L1:
END FUNCTION main\n\n";
		assert_eq!(tac("int main() { while (x) { x = 0; } }"), expected);
	}

	#[test]
	fn for_loop() {
		let expected = "\
FUNCTION main:
  DECLARE i
  t0 = 0
  i = t0
L0:
  t1 = i
  t2 = 3
  t3 = t1 < t2
  IF_FALSE t3 GOTO L1
  t4 = i
  x = t4
  t5 = i
  PUSH_PARAM t5
  t6 = CALL step, 1
  GOTO L0
L1:
END FUNCTION main\n\n";
		assert_eq!(
			tac("int main() { for (int i = 0; i < 3; step(i)) { x = i; } }"),
			expected
		);
	}

	#[test]
	fn calls_push_arguments_in_order() {
		let expected = "\
FUNCTION main:
  DECLARE r
  t0 = 1
  PUSH_PARAM t0
  t1 = x
  t2 = 2
  t3 = t1 + t2
  PUSH_PARAM t3
  t4 = CALL f, 2
  r = t4
END FUNCTION main\n\n";
		assert_eq!(tac("int main() { int r; r = f(1, x + 2); }"), expected);
	}

	#[test]
	fn functions_emit_params_and_counters_continue() {
		let expected = "\
FUNCTION f:
  PARAM n
  t0 = n
  RETURN t0
END FUNCTION f

FUNCTION main:
  t1 = 1
  PUSH_PARAM t1
  t2 = CALL f, 1
  RETURN t2
END FUNCTION main\n\n";
		assert_eq!(
			tac("int f(int n) { return n; } int main() { return f(1); }"),
			expected
		);
	}

	#[test]
	fn counters_reset_per_generation_run() {
		let source = "int main() { return 1; }";
		assert_eq!(tac(source), tac(source));
		assert!(tac(source).contains("t0 = 1"));
	}

	#[test]
	fn return_without_value() {
		let expected = "\
FUNCTION f:
  RETURN
END FUNCTION f\n\n";
		assert_eq!(tac("void f() { return; }"), expected);
	}
}
