//! Runtime scope, error, and budget behavior of the evaluator.

use minic_eval::{
    run, Budget, EvalConfig, EvalError, Interpreter, IntWidth, OverflowPolicy, RunReport,
    Truthiness, Value,
};
use minic_types::ast::*;
use minic_types::{ErrorKind, Program};
use pretty_assertions::assert_eq;

fn main_only(body: Vec<Stmt>) -> Program {
    Program::new(vec![Function::int("main", &[], body)]).unwrap()
}

fn run_with(config: EvalConfig, program: &Program) -> RunReport {
    Interpreter::new(config).run(program)
}

fn kind(report: &RunReport) -> Option<ErrorKind> {
    report.error().map(EvalError::kind)
}

// ══════════════════════════════════════════════════════════════════════════════
// Scopes
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn inner_binding_unreachable_after_block() {
    // if (1) { int t; t = 5; } print(t);
    let program = main_only(vec![
        Stmt::if_then(
            Expr::int(1),
            vec![Stmt::declare("t"), Stmt::assign("t", Expr::int(5))],
        ),
        Stmt::print(Expr::var("t")),
        Stmt::ret(Expr::int(0)),
    ]);
    let report = run(&program);
    assert_eq!(report.error(), Some(&EvalError::UndefinedVariable("t".into())));
    assert_eq!(kind(&report), Some(ErrorKind::UnresolvedName));
    assert!(report.output.is_empty());
}

#[test]
fn shadowing_restores_outer_value() {
    // int x; x = 1; if (1) { int x; x = 2; print(x); } print(x);
    let program = main_only(vec![
        Stmt::declare("x"),
        Stmt::assign("x", Expr::int(1)),
        Stmt::if_then(
            Expr::int(1),
            vec![
                Stmt::declare("x"),
                Stmt::assign("x", Expr::int(2)),
                Stmt::print(Expr::var("x")),
            ],
        ),
        Stmt::print(Expr::var("x")),
        Stmt::ret(Expr::var("x")),
    ]);
    let report = run(&program);
    assert_eq!(report.output.to_i64s(), vec![2, 1]);
    assert_eq!(report.value(), Some(Value::new(1)));
}

#[test]
fn assignment_in_nested_block_updates_outer_binding() {
    let program = main_only(vec![
        Stmt::declare("x"),
        Stmt::assign("x", Expr::int(1)),
        Stmt::if_then(Expr::int(1), vec![Stmt::assign("x", Expr::int(9))]),
        Stmt::ret(Expr::var("x")),
    ]);
    assert_eq!(run(&program).value(), Some(Value::new(9)));
}

#[test]
fn callee_cannot_see_caller_locals() {
    let peek = Function::int("peek", &[], vec![Stmt::ret(Expr::var("secret"))]);
    let main = Function::int(
        "main",
        &[],
        vec![
            Stmt::declare("secret"),
            Stmt::assign("secret", Expr::int(7)),
            Stmt::ret(Expr::call("peek", vec![])),
        ],
    );
    let program = Program::new(vec![peek, main]).unwrap();
    let report = run(&program);
    assert_eq!(
        report.error(),
        Some(&EvalError::UndefinedVariable("secret".into()))
    );
    assert_eq!(report.backtrace[0].function, "peek");
    assert_eq!(report.backtrace[1].function, "main");
}

#[test]
fn read_before_assignment_fails() {
    let program = main_only(vec![Stmt::declare("x"), Stmt::ret(Expr::var("x"))]);
    let report = run(&program);
    assert_eq!(report.error(), Some(&EvalError::Uninitialized("x".into())));
    assert_eq!(kind(&report), Some(ErrorKind::UseBeforeInit));
}

#[test]
fn redeclaration_in_same_block_fails() {
    let program = main_only(vec![
        Stmt::declare("x"),
        Stmt::print(Expr::int(1)),
        Stmt::declare("x"),
        Stmt::ret(Expr::int(0)),
    ]);
    let report = run(&program);
    assert_eq!(kind(&report), Some(ErrorKind::Redeclaration));
    assert_eq!(report.output.to_i64s(), vec![1]);
    assert_eq!(report.backtrace[0].position, vec![3]);
}

#[test]
fn loop_body_scope_is_fresh_each_iteration() {
    // int i; i = 0; while (i < 3) { int t; t = i; print(t); i = i + 1; } return i;
    let program = main_only(vec![
        Stmt::declare("i"),
        Stmt::assign("i", Expr::int(0)),
        Stmt::while_loop(
            Expr::binary(BinOp::Less, Expr::var("i"), Expr::int(3)),
            vec![
                Stmt::declare("t"),
                Stmt::assign("t", Expr::var("i")),
                Stmt::print(Expr::var("t")),
                Stmt::assign("i", Expr::binary(BinOp::Add, Expr::var("i"), Expr::int(1))),
            ],
        ),
        Stmt::ret(Expr::var("i")),
    ]);
    let report = run(&program);
    assert_eq!(report.output.to_i64s(), vec![0, 1, 2]);
    assert_eq!(report.value(), Some(Value::new(3)));
}

// ══════════════════════════════════════════════════════════════════════════════
// Arithmetic errors
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn division_by_zero_stops_output_at_errant_statement() {
    let program = main_only(vec![
        Stmt::print(Expr::int(1)),
        Stmt::print(Expr::binary(BinOp::Div, Expr::int(5), Expr::int(0))),
        Stmt::print(Expr::int(2)),
        Stmt::ret(Expr::int(0)),
    ]);
    let report = run(&program);
    assert_eq!(report.error(), Some(&EvalError::DivisionByZero));
    assert_eq!(report.output.to_i64s(), vec![1]);
}

#[test]
fn remainder_by_zero_fails() {
    let program = main_only(vec![Stmt::ret(Expr::binary(
        BinOp::Rem,
        Expr::int(5),
        Expr::int(0),
    ))]);
    assert_eq!(kind(&run(&program)), Some(ErrorKind::DivisionByZero));
}

#[test]
fn negative_division_truncates_toward_zero() {
    let program = main_only(vec![
        Stmt::print(Expr::binary(BinOp::Div, Expr::int(-7), Expr::int(2))),
        Stmt::print(Expr::binary(BinOp::Rem, Expr::int(-7), Expr::int(2))),
        Stmt::ret(Expr::int(0)),
    ]);
    assert_eq!(run(&program).output.to_i64s(), vec![-3, -1]);
}

#[test]
fn trap_policy_reports_overflow() {
    let program = main_only(vec![Stmt::ret(Expr::binary(
        BinOp::Add,
        Expr::int(i64::MAX),
        Expr::int(1),
    ))]);
    assert_eq!(run(&program).value(), Some(Value::new(i64::MIN)));

    let trap = EvalConfig::default().with_overflow(OverflowPolicy::Trap);
    let report = run_with(trap, &program);
    assert_eq!(report.error(), Some(&EvalError::IntegerOverflow { bits: 64 }));
}

#[test]
fn eight_bit_wraparound() {
    let program = main_only(vec![Stmt::ret(Expr::binary(
        BinOp::Add,
        Expr::int(127),
        Expr::int(1),
    ))]);
    let config = EvalConfig::default().with_width(IntWidth::I8);
    assert_eq!(run_with(config, &program).value(), Some(Value::new(-128)));
}

// ══════════════════════════════════════════════════════════════════════════════
// Calls & control flow
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn arity_mismatch_rejected_before_any_output() {
    let f = Function::int("f", &["a"], vec![Stmt::ret(Expr::var("a"))]);
    let main = Function::int(
        "main",
        &[],
        vec![
            Stmt::print(Expr::int(1)),
            Stmt::ret(Expr::call("f", vec![])),
        ],
    );
    let errs = Program::new(vec![f, main]).unwrap_err();
    assert!(errs.contains_kind(ErrorKind::ArityMismatch));
}

#[test]
fn infinite_recursion_exhausts_stack() {
    let forever = Function::int(
        "forever",
        &["n"],
        vec![Stmt::ret(Expr::call(
            "forever",
            vec![Expr::binary(BinOp::Add, Expr::var("n"), Expr::int(1))],
        ))],
    );
    let main = Function::int(
        "main",
        &[],
        vec![Stmt::ret(Expr::call("forever", vec![Expr::int(0)]))],
    );
    let program = Program::new(vec![forever, main]).unwrap();

    let report = run_with(EvalConfig::default().with_max_call_depth(64), &program);
    assert_eq!(report.error(), Some(&EvalError::StackExhausted { depth: 64 }));
    assert_eq!(report.max_depth, 64);
    assert_eq!(report.backtrace.len(), 64);

    let report = run(&program);
    assert_eq!(kind(&report), Some(ErrorKind::StackExhausted));
}

#[test]
fn falling_off_int_function_fails() {
    let f = Function::int(
        "f",
        &["n"],
        vec![Stmt::if_then(
            Expr::var("n"),
            vec![Stmt::ret(Expr::int(1))],
        )],
    );
    let main = Function::int(
        "main",
        &[],
        vec![
            Stmt::print(Expr::call("f", vec![Expr::int(1)])),
            Stmt::print(Expr::call("f", vec![Expr::int(0)])),
            Stmt::ret(Expr::int(0)),
        ],
    );
    let program = Program::new(vec![f, main]).unwrap();
    let report = run(&program);
    assert_eq!(report.error(), Some(&EvalError::FallOffEnd("f".into())));
    assert_eq!(report.output.to_i64s(), vec![1]);
}

#[test]
fn return_inside_loop_propagates() {
    // while (1) { return 4; }
    let program = main_only(vec![Stmt::while_loop(
        Expr::int(1),
        vec![Stmt::ret(Expr::int(4))],
    )]);
    assert_eq!(run(&program).value(), Some(Value::new(4)));
}

#[test]
fn arguments_evaluated_left_to_right_in_caller() {
    // int id(int v) { print(v); return v; }
    // int pair(int a, int b) { return a - b; }
    // main: return pair(id(3), id(5));
    let id = Function::int(
        "id",
        &["v"],
        vec![Stmt::print(Expr::var("v")), Stmt::ret(Expr::var("v"))],
    );
    let pair = Function::int(
        "pair",
        &["a", "b"],
        vec![Stmt::ret(Expr::binary(BinOp::Sub, Expr::var("a"), Expr::var("b")))],
    );
    let main = Function::int(
        "main",
        &[],
        vec![Stmt::ret(Expr::call(
            "pair",
            vec![
                Expr::call("id", vec![Expr::int(3)]),
                Expr::call("id", vec![Expr::int(5)]),
            ],
        ))],
    );
    let program = Program::new(vec![id, pair, main]).unwrap();
    let report = run(&program);
    assert_eq!(report.output.to_i64s(), vec![3, 5]);
    assert_eq!(report.value(), Some(Value::new(-2)));
}

#[test]
fn short_circuit_skips_failing_call() {
    let boom = Function::int(
        "boom",
        &[],
        vec![Stmt::ret(Expr::binary(BinOp::Div, Expr::int(1), Expr::int(0)))],
    );
    let main = Function::int(
        "main",
        &[],
        vec![Stmt::ret(Expr::binary(
            BinOp::Or,
            Expr::int(5),
            Expr::call("boom", vec![]),
        ))],
    );
    let program = Program::new(vec![boom, main]).unwrap();
    let report = run(&program);
    assert_eq!(report.value(), Some(Value::TRUE));
    assert_eq!(report.max_depth, 1);
}

#[test]
fn print_call_statement_is_observation() {
    let program = main_only(vec![
        Stmt::call("print", vec![Expr::int(42)]),
        Stmt::ret(Expr::int(0)),
    ]);
    assert_eq!(run(&program).output.to_i64s(), vec![42]);
}

// ══════════════════════════════════════════════════════════════════════════════
// Configuration
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn strict_truthiness_rejects_non_boolean_condition() {
    let program = main_only(vec![
        Stmt::if_then(Expr::int(3), vec![Stmt::print(Expr::int(1))]),
        Stmt::ret(Expr::int(0)),
    ]);
    assert_eq!(run(&program).output.to_i64s(), vec![1]);

    let strict = EvalConfig::default().with_truthiness(Truthiness::Strict);
    let report = run_with(strict, &program);
    assert_eq!(report.error(), Some(&EvalError::InvalidCondition(3)));
}

#[test]
fn step_budget_bounds_infinite_loop() {
    let program = main_only(vec![
        Stmt::while_loop(Expr::int(1), vec![Stmt::print(Expr::int(0))]),
        Stmt::ret(Expr::int(0)),
    ]);
    let report = run_with(EvalConfig::default().with_step_budget(10), &program);
    assert_eq!(
        report.error(),
        Some(&EvalError::BudgetExceeded {
            budget: Budget::Steps,
            limit: 10
        })
    );
    // while (1), then alternating print / condition check.
    assert_eq!(report.output.len(), 5);
    assert_eq!(report.steps, 11);
}

#[test]
fn time_budget_bounds_infinite_loop() {
    let program = main_only(vec![
        Stmt::while_loop(Expr::int(1), vec![]),
        Stmt::ret(Expr::int(0)),
    ]);
    let config = EvalConfig::default().with_time_budget(std::time::Duration::from_millis(20));
    let report = run_with(config, &program);
    assert_eq!(
        report.error(),
        Some(&EvalError::BudgetExceeded {
            budget: Budget::WallClockMillis,
            limit: 20
        })
    );
}

#[test]
fn report_json_carries_error_kind() {
    let program = main_only(vec![Stmt::declare("x"), Stmt::ret(Expr::var("x"))]);
    let json = run(&program).to_json_value();
    assert_eq!(json["outcome"]["error"]["kind"], "use_before_init");
    assert_eq!(
        json["outcome"]["error"]["message"],
        "variable 'x' read before assignment"
    );
}

// ══════════════════════════════════════════════════════════════════════════════
// Nesting & positions
// ══════════════════════════════════════════════════════════════════════════════

fn nested_ifs(depth: usize, innermost: Vec<Stmt>) -> Vec<Stmt> {
    let mut body = innermost;
    for _ in 0..depth {
        body = vec![Stmt::if_then(Expr::int(1), body)];
    }
    body
}

#[test]
fn deeply_nested_blocks_run_to_completion() {
    let mut body = nested_ifs(10_000, vec![Stmt::print(Expr::int(1))]);
    body.push(Stmt::ret(Expr::int(0)));
    let program = main_only(body);

    let report = run(&program);
    assert_eq!(report.value(), Some(Value::new(0)));
    assert_eq!(report.output.to_i64s(), vec![1]);
}

#[test]
fn deeply_nested_failure_reports_full_path() {
    let body = nested_ifs(
        5_000,
        vec![Stmt::ret(Expr::binary(BinOp::Div, Expr::int(1), Expr::int(0)))],
    );
    let report = run(&main_only(body));
    assert_eq!(report.error(), Some(&EvalError::DivisionByZero));
    assert_eq!(report.backtrace[0].position, vec![1; 5_001]);
}

#[test]
fn position_after_loop_is_top_level_index() {
    // int i; i = 0; while (i < 3) { i = i + 1; } return 1 / 0;
    let program = main_only(vec![
        Stmt::declare("i"),
        Stmt::assign("i", Expr::int(0)),
        Stmt::while_loop(
            Expr::binary(BinOp::Less, Expr::var("i"), Expr::int(3)),
            vec![Stmt::assign(
                "i",
                Expr::binary(BinOp::Add, Expr::var("i"), Expr::int(1)),
            )],
        ),
        Stmt::ret(Expr::binary(BinOp::Div, Expr::int(1), Expr::int(0))),
    ]);
    let report = run(&program);
    assert_eq!(report.error(), Some(&EvalError::DivisionByZero));
    assert_eq!(report.backtrace.len(), 1);
    assert_eq!(report.backtrace[0].function, "main");
    assert_eq!(report.backtrace[0].position, vec![4]);
}

#[test]
fn caller_position_is_the_calling_statement() {
    let boom = Function::int(
        "boom",
        &[],
        vec![Stmt::ret(Expr::binary(BinOp::Div, Expr::int(1), Expr::int(0)))],
    );
    let main = Function::int(
        "main",
        &[],
        vec![
            Stmt::print(Expr::int(1)),
            Stmt::if_else(
                Expr::int(0),
                vec![Stmt::ret(Expr::int(0))],
                vec![
                    Stmt::print(Expr::int(2)),
                    Stmt::ret(Expr::call("boom", vec![])),
                ],
            ),
        ],
    );
    let report = run(&Program::new(vec![boom, main]).unwrap());
    assert_eq!(report.backtrace[0].position, vec![1]);
    assert_eq!(report.backtrace[1].position, vec![2, 2]);
}

#[test]
fn declarations_do_not_consume_steps() {
    // int a; int b; a = 1; b = 2; return a + b;
    let program = main_only(vec![
        Stmt::declare("a"),
        Stmt::declare("b"),
        Stmt::assign("a", Expr::int(1)),
        Stmt::assign("b", Expr::int(2)),
        Stmt::ret(Expr::binary(BinOp::Add, Expr::var("a"), Expr::var("b"))),
    ]);
    let report = run_with(EvalConfig::default().with_step_budget(3), &program);
    assert_eq!(report.value(), Some(Value::new(3)));
    assert_eq!(report.steps, 3);
}
