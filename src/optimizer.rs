//! Constant Folding and Propagation
//!
//! Walks a parsed instruction sequence in emission order, keeping one
//! constant table per function (`FUNCTION` instructions clear it) and
//! rewriting instructions in place. The analysis is local, linear, and
//! flow-insensitive by design: the table reflects the last instruction
//! seen, not the set of reaching definitions, so facts are not invalidated
//! at control-flow merges. That behavior is part of the documented
//! contract and must not be "fixed" with reachability tracking.

use std::collections::HashMap;

use crate::tac::{Instruction, Opcode};

/// Per-run mapping from variable name to its statically known value.
/// Entries are invalidated rather than removed, matching the append-only
/// shape of the instruction walk.
#[derive(Debug, Default)]
pub struct ConstantTable {
	entries: HashMap<String, (i32, bool)>,
}

impl ConstantTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn set(&mut self, var: &str, value: i32) {
		self.entries.insert(var.to_string(), (value, true));
	}

	pub fn invalidate(&mut self, var: &str) {
		if let Some(entry) = self.entries.get_mut(var) {
			entry.1 = false;
		}
	}

	pub fn get(&self, var: &str) -> Option<i32> {
		match self.entries.get(var) {
			Some((value, true)) => Some(*value),
			_ => None,
		}
	}

	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

/// An integer literal in operand position: an optional sign followed by
/// one or more digits, nothing else.
fn is_number(text: &str) -> bool {
	let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
	!digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit())
}

/// Resolves an operand to a value when it is a literal or a variable the
/// table currently knows. Literals too large for `i32` resolve to nothing
/// and are left alone.
fn constant_operand(operand: &str, table: &ConstantTable) -> Option<i32> {
	if is_number(operand) {
		operand.parse().ok()
	} else {
		table.get(operand)
	}
}

/// Optimizes the sequence in place and returns how many instructions were
/// changed.
pub fn optimize(code: &mut [Instruction]) -> usize {
	let mut table = ConstantTable::new();
	let mut changed = 0;
	for instruction in code.iter_mut() {
		// No knowledge crosses a function boundary
		if instruction.opcode == Opcode::Function {
			table.clear();
		}
		if fold_instruction(instruction, &mut table) {
			changed += 1;
		}
	}
	changed
}

fn fold_instruction(instr: &mut Instruction, table: &mut ConstantTable) -> bool {
	match instr.opcode {
		Opcode::Assign => {
			if is_number(&instr.arg1) {
				let Ok(value) = instr.arg1.parse() else {
					table.invalidate(&instr.result);
					return false;
				};
				instr.is_constant = true;
				instr.constant_value = value;
				table.set(&instr.result, value);
				true
			} else if let Some(value) = table.get(&instr.arg1) {
				instr.arg1 = value.to_string();
				instr.is_constant = true;
				instr.constant_value = value;
				instr.is_optimized = true;
				table.set(&instr.result, value);
				true
			} else {
				table.invalidate(&instr.result);
				false
			}
		}

		Opcode::Add
		| Opcode::Sub
		| Opcode::Mul
		| Opcode::Div
		| Opcode::Mod
		| Opcode::Lt
		| Opcode::Le
		| Opcode::Gt
		| Opcode::Ge
		| Opcode::Eq
		| Opcode::Ne => {
			let lhs = constant_operand(&instr.arg1, table);
			let rhs = constant_operand(&instr.arg2, table);

			if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
				// Division and modulo by zero abort the fold of this one
				// instruction; the destination is no longer known
				if rhs == 0 && matches!(instr.opcode, Opcode::Div | Opcode::Mod) {
					table.invalidate(&instr.result);
					return false;
				}
				let value = evaluate(instr.opcode, lhs, rhs);
				instr.opcode = Opcode::Assign;
				instr.arg1 = value.to_string();
				instr.arg2.clear();
				instr.is_constant = true;
				instr.constant_value = value;
				instr.is_optimized = true;
				table.set(&instr.result, value);
				true
			} else {
				// Propagation without folding: rewrite whichever operands
				// resolved, the destination itself becomes unknown
				let mut rewritten = false;
				if let Some(value) = lhs {
					if !is_number(&instr.arg1) {
						instr.arg1 = value.to_string();
						rewritten = true;
					}
				}
				if let Some(value) = rhs {
					if !is_number(&instr.arg2) {
						instr.arg2 = value.to_string();
						rewritten = true;
					}
				}
				table.invalidate(&instr.result);
				rewritten
			}
		}

		Opcode::UnaryMinus => {
			if let Some(operand) = constant_operand(&instr.arg1, table) {
				let value = operand.wrapping_neg();
				instr.opcode = Opcode::Assign;
				instr.arg1 = value.to_string();
				instr.is_constant = true;
				instr.constant_value = value;
				instr.is_optimized = true;
				table.set(&instr.result, value);
				true
			} else {
				table.invalidate(&instr.result);
				false
			}
		}

		// Call results are always treated as unknown
		Opcode::Call => {
			table.invalidate(&instr.result);
			false
		}

		Opcode::Param | Opcode::IfFalse => {
			if let Some(value) = table.get(&instr.arg1) {
				instr.arg1 = value.to_string();
				return true;
			}
			false
		}

		Opcode::Return => {
			if !instr.arg1.is_empty() {
				if let Some(value) = table.get(&instr.arg1) {
					instr.arg1 = value.to_string();
					return true;
				}
			}
			false
		}

		_ => false,
	}
}

fn evaluate(opcode: Opcode, lhs: i32, rhs: i32) -> i32 {
	match opcode {
		Opcode::Add => lhs.wrapping_add(rhs),
		Opcode::Sub => lhs.wrapping_sub(rhs),
		Opcode::Mul => lhs.wrapping_mul(rhs),
		Opcode::Div => lhs.wrapping_div(rhs),
		Opcode::Mod => lhs.wrapping_rem(rhs),
		Opcode::Lt => (lhs < rhs) as i32,
		Opcode::Le => (lhs <= rhs) as i32,
		Opcode::Gt => (lhs > rhs) as i32,
		Opcode::Ge => (lhs >= rhs) as i32,
		Opcode::Eq => (lhs == rhs) as i32,
		Opcode::Ne => (lhs != rhs) as i32,
		_ => unreachable!("not a foldable opcode: {opcode:?}"),
	}
}

mod test {
	#[allow(unused_imports)]
	use super::*;
	#[allow(unused_imports)]
	use crate::tac::{parse_lines, print_lines};

	#[allow(dead_code)]
	fn optimized(text: &str) -> (Vec<Instruction>, usize) {
		let mut code = parse_lines(text);
		let changed = optimize(&mut code);
		(code, changed)
	}

	#[test]
	fn folds_addition_through_temporaries() {
		let (code, _) = optimized("  t0 = 5\n  t1 = t0 + 3\n");
		assert_eq!(code[1].to_string(), "  t1 = 8    ; [OPTIMIZED]");
		assert_eq!(code[1].opcode, Opcode::Assign);
		assert!(code[1].is_constant && code[1].is_optimized);
		assert_eq!(code[1].constant_value, 8);
	}

	#[test]
	fn division_by_zero_is_not_folded() {
		let (code, _) = optimized("  t0 = 5\n  t1 = t0 / 0\n  t2 = t1\n");
		// The instruction stays textually untouched
		assert_eq!(code[1].to_string(), "  t1 = t0 / 0");
		assert_eq!(code[1].opcode, Opcode::Div);
		assert!(!code[1].is_optimized);
		// ...and t1 is no longer believed constant downstream
		assert_eq!(code[2].to_string(), "  t2 = t1");
		assert!(!code[2].is_optimized);

		let (code, _) = optimized("  t0 = 5\n  t1 = t0 % 0\n");
		assert_eq!(code[1].to_string(), "  t1 = t0 % 0");
	}

	#[test]
	fn comparison_folds_to_zero_or_one() {
		let (code, _) = optimized("  t0 = 5\n  t1 = t0 < 3\n  t2 = t0 == 5\n");
		assert_eq!(code[1].constant_value, 0);
		assert_eq!(code[2].constant_value, 1);
	}

	#[test]
	fn unary_minus_folds() {
		let (code, _) = optimized("  t0 = 5\n  t1 = -t0\n");
		assert_eq!(code[1].to_string(), "  t1 = -5    ; [OPTIMIZED]");
		assert_eq!(code[1].opcode, Opcode::Assign);
		assert_eq!(code[1].constant_value, -5);
	}

	#[test]
	fn partial_operands_propagate_without_folding() {
		let (code, changed) = optimized("  t0 = 5\n  t1 = t0 + x\n");
		assert_eq!(code[1].to_string(), "  t1 = 5 + x");
		assert_eq!(code[1].opcode, Opcode::Add);
		assert!(!code[1].is_optimized);
		assert_eq!(changed, 2);

		// The unknown destination must not be believed constant
		let (code, _) = optimized("  t0 = 5\n  t0 = t0 + x\n  t1 = t0\n");
		assert_eq!(code[2].to_string(), "  t1 = t0");
	}

	#[test]
	fn propagates_into_param_branch_and_return() {
		let text = "\
  t0 = 7
  PUSH_PARAM t0
  IF_FALSE t0 GOTO L0
  RETURN t0
";
		let (code, changed) = optimized(text);
		assert_eq!(code[1].to_string(), "  PUSH_PARAM 7");
		assert_eq!(code[2].to_string(), "  IF_FALSE 7 GOTO L0");
		assert_eq!(code[3].to_string(), "  RETURN 7");
		assert_eq!(changed, 4);
	}

	#[test]
	fn call_results_are_unknown() {
		let (code, _) = optimized("  t0 = 5\n  t0 = CALL f, 0\n  t1 = t0\n");
		assert_eq!(code[2].to_string(), "  t1 = t0");
		assert!(!code[2].is_optimized);
	}

	#[test]
	fn function_boundaries_reset_the_table() {
		let text = "\
FUNCTION f:
  x = 5
END FUNCTION f

FUNCTION g:
  y = x
END FUNCTION g
";
		let (code, _) = optimized(text);
		// x was constant in f, but that fact must not leak into g
		assert_eq!(code[5].to_string(), "  y = x");
		assert!(!code[5].is_optimized);
	}

	#[test]
	fn propagation_is_flow_insensitive_across_branches() {
		// The table follows emission order, not reachability: the constant
		// assigned before the branch survives into the join even though the
		// else arm may have overwritten it at runtime. Documented behavior.
		let text = "\
  x = 1
  IF_FALSE c GOTO L0
  x = CALL f, 0
L0:
  t0 = x
";
		let (code, _) = optimized(text);
		// x = CALL invalidates, so the join sees the invalidated state here;
		// but a constant re-assignment inside one arm does leak past the join
		assert_eq!(code[4].to_string(), "  t0 = x");

		let leaky = "\
  IF_FALSE c GOTO L0
  x = 1
L0:
  t0 = x
";
		let (code, _) = optimized(leaky);
		assert_eq!(code[3].to_string(), "  t0 = 1    ; [OPTIMIZED]");
	}

	#[test]
	fn literal_assignments_count_as_changes_without_marker() {
		let (code, changed) = optimized("  t0 = 5\n");
		assert_eq!(changed, 1);
		assert!(code[0].is_constant);
		assert!(!code[0].is_optimized);
		assert_eq!(code[0].to_string(), "  t0 = 5");
	}

	#[test]
	fn second_pass_over_own_output_is_stable() {
		let text = "\
FUNCTION main:
  DECLARE a
  t0 = 2
  t1 = 3
  t2 = t0 + t1
  a = t2
  t3 = a
  RETURN t3
END FUNCTION main

";
		let mut first = parse_lines(text);
		let first_count = first.len();
		optimize(&mut first);
		let first_output = print_lines(&first);

		let mut second = parse_lines(&first_output);
		assert_eq!(second.len(), first_count);
		optimize(&mut second);
		let second_output = print_lines(&second);

		// The second pass drops the cosmetic markers but rewrites nothing
		assert!(second.iter().all(|instr| !instr.is_optimized));

		let mut third = parse_lines(&second_output);
		assert_eq!(third.len(), first_count);
		optimize(&mut third);
		assert_eq!(print_lines(&third), second_output);
	}
}
