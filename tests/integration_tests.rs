use minicc::analyzer::Analyzer;
use minicc::optimizer::optimize;
use minicc::parser::{parse, Ast};
use minicc::tac::{parse_lines, print_lines, Opcode};

#[test]
fn pipeline_folds_constant_arithmetic() {
	let source = "\
int f() {
	int a;
	a = 2 + 3;
	return a;
}

int main() {
	return f();
}
";
	let ast = parse(source);
	let Ast::Program(functions) = &ast else {
		panic!("expected a program root, got {ast:?}");
	};
	assert_eq!(functions.len(), 2);

	let mut analyzer = Analyzer::new();
	assert!(analyzer.check(&ast));
	assert!(analyzer.table.lookup("a").is_some());

	let ir = minicc::compile(source).expect("semantically valid program");
	assert!(ir.contains("FUNCTION f:"));
	assert!(ir.contains("  t2 = t0 + t1\n"));
	assert!(ir.contains("END FUNCTION main\n"));

	let mut code = parse_lines(&ir);
	let changed = optimize(&mut code);
	assert!(changed > 0);

	let optimized = print_lines(&code);
	assert!(
		optimized.contains("  a = 5    ; [OPTIMIZED]\n"),
		"expected the assignment to fold to a constant:\n{optimized}"
	);
	// The fold rode through the whole chain down to the return
	assert!(optimized.contains("  RETURN 5\n"));
	// The call result in main stays unknown
	assert!(optimized.contains("  t4 = CALL f, 0\n"));
	assert!(optimized.contains("  RETURN t4\n"));
}

#[test]
fn optimizer_is_idempotent_over_its_own_output() {
	let source = "\
int main() {
	int x;
	int y;
	x = 4 * 2;
	y = x - 1;
	if (y < 10) {
		y = y + 1;
	}
	return y;
}
";
	let ir = minicc::compile(source).expect("semantically valid program");

	let mut first = parse_lines(&ir);
	let instruction_count = first.len();
	optimize(&mut first);
	let first_output = print_lines(&first);

	let mut second = parse_lines(&first_output);
	assert_eq!(second.len(), instruction_count);
	optimize(&mut second);
	let second_output = print_lines(&second);
	assert!(second.iter().all(|instr| !instr.is_optimized));

	let mut third = parse_lines(&second_output);
	assert_eq!(third.len(), instruction_count);
	optimize(&mut third);
	assert_eq!(print_lines(&third), second_output);
}

#[test]
fn constants_do_not_leak_across_functions() {
	let source = "\
int f() {
	int v;
	v = 41;
	return v;
}

int g(int v2) {
	v2 = v2 + 1;
	return v2;
}
";
	let ir = minicc::compile(source).expect("semantically valid program");
	let mut code = parse_lines(&ir);
	optimize(&mut code);

	// f's return folds, g's arithmetic depends on a parameter and must not
	assert!(print_lines(&code).contains("  RETURN 41\n"));
	let g_boundary = code
		.iter()
		.position(|instr| instr.opcode == Opcode::Function && instr.label == "g")
		.expect("g has a FUNCTION instruction");
	assert!(code[g_boundary..]
		.iter()
		.all(|instr| !instr.is_optimized));
}

#[test]
fn semantic_failure_stops_compilation() {
	assert!(minicc::compile("int main() { return x; }").is_none());
	assert!(minicc::compile("int main() { int a; int a; }").is_none());
	assert!(minicc::compile("int main() { int a = a; return a; }").is_some());
}
