//! TAC Instruction Model
//!
//! The optimizer's view of the generator's textual output: a tagged
//! instruction per line, reconstructed by [`Instruction::parse`] and
//! rendered back by the [`std::fmt::Display`] impl. Parsing is total —
//! anything unrecognized degrades to a passthrough instruction that
//! reproduces its original line verbatim.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
	Assign,
	Add,
	Sub,
	Mul,
	Div,
	Mod,
	Lt,
	Le,
	Gt,
	Ge,
	Eq,
	Ne,
	UnaryMinus,
	Label,
	Goto,
	IfFalse,
	Param,
	Call,
	Return,
	Function,
	EndFunction,
	Declare,
	Comment,
	Unknown,
}

impl Opcode {
	fn operator(&self) -> Option<&'static str> {
		match self {
			Self::Add => Some("+"),
			Self::Sub => Some("-"),
			Self::Mul => Some("*"),
			Self::Div => Some("/"),
			Self::Mod => Some("%"),
			Self::Lt => Some("<"),
			Self::Le => Some("<="),
			Self::Gt => Some(">"),
			Self::Ge => Some(">="),
			Self::Eq => Some("=="),
			Self::Ne => Some("!="),
			_ => None,
		}
	}
}

/// Binary operator patterns in recognition priority order: two-character
/// operators are tried before the single characters they contain.
const BINARY_OPERATORS: [(&str, Opcode); 11] = [
	("<=", Opcode::Le),
	(">=", Opcode::Ge),
	("==", Opcode::Eq),
	("!=", Opcode::Ne),
	("<", Opcode::Lt),
	(">", Opcode::Gt),
	("+", Opcode::Add),
	("-", Opcode::Sub),
	("*", Opcode::Mul),
	("/", Opcode::Div),
	("%", Opcode::Mod),
];

#[derive(Clone, Debug, PartialEq)]
pub struct Instruction {
	pub opcode: Opcode,
	pub result: String,
	pub arg1: String,
	pub arg2: String,
	pub label: String,
	/// The source line as read, reproduced verbatim for passthrough kinds.
	pub original: String,
	pub is_constant: bool,
	pub constant_value: i32,
	pub is_optimized: bool,
}

impl Instruction {
	fn new(opcode: Opcode, original: &str) -> Self {
		Self {
			opcode,
			result: String::new(),
			arg1: String::new(),
			arg2: String::new(),
			label: String::new(),
			original: original.to_string(),
			is_constant: false,
			constant_value: 0,
			is_optimized: false,
		}
	}

	/// Reconstructs one instruction from one line of TAC text. First match
	/// wins; the `FUNCTION`/`END FUNCTION` directives are recognized ahead
	/// of the generic ends-with-`:` label rule so that function boundaries
	/// survive into the folding pass.
	pub fn parse(line: &str) -> Instruction {
		let text = line.trim();

		if text.is_empty() {
			return Self::new(Opcode::Comment, line);
		}

		if let Some(rest) = text.strip_prefix("END FUNCTION") {
			let mut instr = Self::new(Opcode::EndFunction, line);
			instr.label = first_word(rest);
			return instr;
		}

		if let Some(rest) = text.strip_prefix("FUNCTION") {
			let mut instr = Self::new(Opcode::Function, line);
			instr.label = rest.split(':').next().unwrap_or("").trim().to_string();
			return instr;
		}

		if text.ends_with(':') {
			let mut instr = Self::new(Opcode::Label, line);
			instr.label = text.split(':').next().unwrap_or("").to_string();
			return instr;
		}

		if let Some(rest) = text.strip_prefix("DECLARE") {
			let mut instr = Self::new(Opcode::Declare, line);
			instr.result = first_word(rest);
			return instr;
		}

		if let Some(rest) = text
			.strip_prefix("PUSH_PARAM")
			.or_else(|| text.strip_prefix("PARAM"))
		{
			let mut instr = Self::new(Opcode::Param, line);
			instr.arg1 = first_word(rest);
			return instr;
		}

		if let Some(rest) = text.strip_prefix("GOTO") {
			let mut instr = Self::new(Opcode::Goto, line);
			instr.label = first_word(rest);
			return instr;
		}

		if let Some(rest) = text.strip_prefix("IF_FALSE") {
			let mut instr = Self::new(Opcode::IfFalse, line);
			let mut words = rest.split_whitespace();
			instr.arg1 = words.next().unwrap_or("").to_string();
			if words.next() == Some("GOTO") {
				instr.label = words.next().unwrap_or("").to_string();
			}
			return instr;
		}

		if let Some(rest) = text.strip_prefix("RETURN") {
			let mut instr = Self::new(Opcode::Return, line);
			instr.arg1 = first_word(rest);
			return instr;
		}

		if text.contains("CALL") {
			let mut instr = Self::new(Opcode::Call, line);
			if let Some(equals) = text.find('=') {
				instr.result = first_word(&text[..equals]);
				let call = text[equals + 1..].trim();
				if let Some(rest) = call.strip_prefix("CALL") {
					match rest.split_once(',') {
						Some((callee, count)) => {
							instr.arg1 = callee.trim().to_string();
							instr.arg2 = first_word(count);
						}
						None => instr.arg1 = rest.trim().to_string(),
					}
				}
			}
			return instr;
		}

		if let Some(equals) = text.find('=') {
			let mut instr = Self::new(Opcode::Unknown, line);
			instr.result = first_word(&text[..equals]);
			let rhs = text[equals + 1..].trim();

			// Unary minus: a leading `-` with no embedded space
			if let Some(rest) = rhs.strip_prefix('-') {
				if !rest.contains(' ') {
					instr.opcode = Opcode::UnaryMinus;
					instr.arg1 = first_word(rest);
					return instr;
				}
			}

			for (pattern, opcode) in BINARY_OPERATORS {
				if let Some(index) = rhs.find(pattern) {
					instr.opcode = opcode;
					instr.arg1 = first_word(&rhs[..index]);
					instr.arg2 = first_word(&rhs[index + pattern.len()..]);
					return instr;
				}
			}

			instr.opcode = Opcode::Assign;
			instr.arg1 = first_word(rhs);
			return instr;
		}

		Self::new(Opcode::Unknown, line)
	}
}

fn first_word(text: &str) -> String {
	text.split_whitespace().next().unwrap_or("").to_string()
}

/// Renders the canonical text for each instruction, one line per
/// instruction with no trailing newline. `PARAM` always renders as
/// `PUSH_PARAM`; an assignment rewritten by the optimizer carries an
/// inline marker comment.
impl fmt::Display for Instruction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.opcode {
			Opcode::Assign => {
				write!(f, "  {} = {}", self.result, self.arg1)?;
				if self.is_optimized {
					write!(f, "    ; [OPTIMIZED]")?;
				}
				Ok(())
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
				let operator = self.opcode.operator().unwrap_or("?");
				write!(f, "  {} = {} {} {}", self.result, self.arg1, operator, self.arg2)
			}
			Opcode::UnaryMinus => write!(f, "  {} = -{}", self.result, self.arg1),
			Opcode::Label => write!(f, "{}:", self.label),
			Opcode::Goto => write!(f, "  GOTO {}", self.label),
			Opcode::IfFalse => write!(f, "  IF_FALSE {} GOTO {}", self.arg1, self.label),
			Opcode::Param => write!(f, "  PUSH_PARAM {}", self.arg1),
			Opcode::Call => {
				if self.arg2.is_empty() {
					write!(f, "  {} = CALL {}", self.result, self.arg1)
				} else {
					write!(f, "  {} = CALL {}, {}", self.result, self.arg1, self.arg2)
				}
			}
			Opcode::Return => {
				if self.arg1.is_empty() {
					write!(f, "  RETURN")
				} else {
					write!(f, "  RETURN {}", self.arg1)
				}
			}
			Opcode::Function => write!(f, "FUNCTION {}:", self.label),
			Opcode::EndFunction => {
				if self.label.is_empty() {
					write!(f, "END FUNCTION")
				} else {
					write!(f, "END FUNCTION {}", self.label)
				}
			}
			Opcode::Declare => write!(f, "  DECLARE {}", self.result),
			Opcode::Comment | Opcode::Unknown => write!(f, "{}", self.original),
		}
	}
}

/// Parses a whole TAC text, one instruction per line. Blank lines are
/// preserved as passthrough no-ops.
pub fn parse_lines(text: &str) -> Vec<Instruction> {
	text.lines().map(Instruction::parse).collect()
}

/// Inverse of [`parse_lines`]: one line per instruction.
pub fn print_lines(instructions: &[Instruction]) -> String {
	let mut out = String::new();
	for instruction in instructions {
		out.push_str(&instruction.to_string());
		out.push('\n');
	}
	out
}

mod test {
	#[allow(unused_imports)]
	use super::*;

	#[allow(dead_code)]
	fn parsed(line: &str) -> Instruction {
		Instruction::parse(line)
	}

	#[test]
	fn directives() {
		let function = parsed("FUNCTION main:");
		assert_eq!((function.opcode, function.label.as_str()), (Opcode::Function, "main"));

		let end = parsed("END FUNCTION main");
		assert_eq!((end.opcode, end.label.as_str()), (Opcode::EndFunction, "main"));

		let declare = parsed("  DECLARE x");
		assert_eq!((declare.opcode, declare.result.as_str()), (Opcode::Declare, "x"));

		let label = parsed("L3:");
		assert_eq!((label.opcode, label.label.as_str()), (Opcode::Label, "L3"));

		let goto = parsed("  GOTO L3");
		assert_eq!((goto.opcode, goto.label.as_str()), (Opcode::Goto, "L3"));
	}

	#[test]
	fn param_styles_unify() {
		let param = parsed("  PARAM n");
		assert_eq!((param.opcode, param.arg1.as_str()), (Opcode::Param, "n"));

		let push = parsed("  PUSH_PARAM t0");
		assert_eq!((push.opcode, push.arg1.as_str()), (Opcode::Param, "t0"));
	}

	#[test]
	fn branches_and_returns() {
		let branch = parsed("  IF_FALSE t2 GOTO L0");
		assert_eq!(branch.opcode, Opcode::IfFalse);
		assert_eq!((branch.arg1.as_str(), branch.label.as_str()), ("t2", "L0"));

		let ret = parsed("  RETURN t1");
		assert_eq!((ret.opcode, ret.arg1.as_str()), (Opcode::Return, "t1"));

		let bare = parsed("  RETURN");
		assert_eq!((bare.opcode, bare.arg1.as_str()), (Opcode::Return, ""));
	}

	#[test]
	fn calls_capture_destination_and_count() {
		let call = parsed("  t4 = CALL f, 2");
		assert_eq!(call.opcode, Opcode::Call);
		assert_eq!(
			(call.result.as_str(), call.arg1.as_str(), call.arg2.as_str()),
			("t4", "f", "2")
		);
	}

	#[test]
	fn assignments_and_operators() {
		let assign = parsed("  x = t0");
		assert_eq!(assign.opcode, Opcode::Assign);
		assert_eq!((assign.result.as_str(), assign.arg1.as_str()), ("x", "t0"));

		let add = parsed("  t2 = t0 + t1");
		assert_eq!(add.opcode, Opcode::Add);
		assert_eq!(
			(add.result.as_str(), add.arg1.as_str(), add.arg2.as_str()),
			("t2", "t0", "t1")
		);

		// Two-character operators win over their single-character prefixes
		let le = parsed("  t2 = t0 <= t1");
		assert_eq!(le.opcode, Opcode::Le);
		let ge = parsed("  t2 = t0 >= t1");
		assert_eq!(ge.opcode, Opcode::Ge);
		let eq = parsed("  t2 = t0 == t1");
		assert_eq!(eq.opcode, Opcode::Eq);
		let ne = parsed("  t2 = t0 != t1");
		assert_eq!(ne.opcode, Opcode::Ne);

		let uminus = parsed("  t1 = -t0");
		assert_eq!(uminus.opcode, Opcode::UnaryMinus);
		assert_eq!((uminus.result.as_str(), uminus.arg1.as_str()), ("t1", "t0"));

		// A negative right operand still reads as a binary subtraction
		let sub = parsed("  t1 = t0 - 3");
		assert_eq!(sub.opcode, Opcode::Sub);
		assert_eq!((sub.arg1.as_str(), sub.arg2.as_str()), ("t0", "3"));
	}

	#[test]
	fn unrecognized_lines_pass_through() {
		let blank = parsed("");
		assert_eq!(blank.opcode, Opcode::Comment);
		assert_eq!(blank.to_string(), "");

		let noise = parsed("neither directive nor assignment");
		assert_eq!(noise.opcode, Opcode::Unknown);
		assert_eq!(noise.to_string(), "neither directive nor assignment");
	}

	#[test]
	fn round_trip_every_kind() {
		// print(parse(text)) must reproduce opcode and operands for every
		// instruction kind of the format contract
		let lines = [
			"FUNCTION main:",
			"END FUNCTION main",
			"  DECLARE x",
			"L0:",
			"  GOTO L0",
			"  IF_FALSE t0 GOTO L1",
			"  PUSH_PARAM t0",
			"  t1 = CALL f, 2",
			"  RETURN",
			"  RETURN t1",
			"  x = t0",
			"  t2 = t0 + t1",
			"  t2 = t0 - t1",
			"  t2 = t0 * t1",
			"  t2 = t0 / t1",
			"  t2 = t0 % t1",
			"  t2 = t0 < t1",
			"  t2 = t0 <= t1",
			"  t2 = t0 > t1",
			"  t2 = t0 >= t1",
			"  t2 = t0 == t1",
			"  t2 = t0 != t1",
			"  t2 = -t0",
			"",
		];
		for line in lines {
			let once = parsed(line);
			let again = Instruction::parse(&once.to_string());
			assert_eq!(once, again, "round trip diverged for {line:?}");
			assert_eq!(once.to_string(), line, "printed form diverged for {line:?}");
		}

		// The one intentional normalization: PARAM renders as PUSH_PARAM
		let param = parsed("  PARAM n");
		assert_eq!(param.to_string(), "  PUSH_PARAM n");
		let reparsed = Instruction::parse(&param.to_string());
		assert_eq!((reparsed.opcode, reparsed.arg1.as_str()), (Opcode::Param, "n"));
	}

	#[test]
	fn optimized_assign_carries_marker() {
		let mut instr = parsed("  t1 = t0");
		instr.arg1 = "8".to_string();
		instr.is_optimized = true;
		assert_eq!(instr.to_string(), "  t1 = 8    ; [OPTIMIZED]");

		// The marker is cosmetic: reparsing recovers the plain assignment
		let reparsed = Instruction::parse(&instr.to_string());
		assert_eq!(reparsed.opcode, Opcode::Assign);
		assert_eq!((reparsed.result.as_str(), reparsed.arg1.as_str()), ("t1", "8"));
	}

	#[test]
	fn whole_text_round_trip() {
		let text = "\
FUNCTION main:
  DECLARE x
  t0 = 5
  x = t0
END FUNCTION main

";
		let instructions = parse_lines(text);
		assert_eq!(instructions.len(), 6);
		assert_eq!(print_lines(&instructions), text);
	}
}
