use mathnote::{
    Ast, BinaryOp, Constant, Limits, MathError, Notation, Number, Problem, Relation, TokenID,
    Value,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse(text: &str) -> Ast {
    init_logger();
    Notation::new().parse(text).unwrap().root
}

fn value(text: &str) -> Value {
    parse(text).evaluate().unwrap()
}

fn limited(limits: Limits) -> Notation {
    init_logger();
    Notation::new().with_limits(limits)
}

fn sym(name: &str) -> Value {
    Value::symbol(name)
}

#[test]
fn single_letters_are_variables() {
    for text in ["x", "y", "a", "α"] {
        let parsed = Notation::new().parse(text).unwrap();
        assert!(matches!(parsed.root, Ast::Variable(ref v) if v.as_str() == text));
        assert_eq!(parsed.free_symbols(), [text]);
    }
}

#[test]
fn multi_letter_names_split() {
    assert_eq!(
        value("xyz"),
        Value::mul(Value::mul(sym("x"), sym("y")), sym("z"))
    );
    assert_eq!(value("xy_1"), Value::mul(sym("x"), sym("y_1")));
    assert_eq!(value("x_a"), sym("x_a"));
    let parsed = Notation::new().with_symbol("rate").parse("rate t").unwrap();
    assert_eq!(parsed.free_symbols(), ["rate", "t"]);
}

#[test]
fn quadratic_flattens() {
    let expected = Value::add(
        Value::pow(sym("x"), Value::int(2)),
        Value::add(Value::mul(Value::int(2), sym("x")), Value::int(1)),
    );
    assert_eq!(value("x^2+2x+1"), expected);
    assert_eq!(value("x^2 + 2*x + 1"), expected);
    assert_eq!(value("x^2+2x+1").to_string(), "x^2 + 2*x + 1");
}

#[test]
fn intervals_keep_bracket_semantics() {
    let cases = [
        ("[0, 1]", false, false),
        ("[0, 1)", false, true),
        ("(0, 1]", true, false),
        ("(0, 1)", true, true),
    ];
    for (text, left_open, right_open) in cases {
        let Value::Interval(interval) = value(text) else {
            panic!("{text} is not an interval");
        };
        assert_eq!(interval.left_open, left_open, "{text}");
        assert_eq!(interval.right_open, right_open, "{text}");
    }

    let Value::Interval(interval) = value("[-inf, 0]") else {
        panic!("expected an interval");
    };
    assert!(interval.left_open);
    assert!(!interval.right_open);
}

#[test]
fn closed_interval_to_two_pi() {
    assert!(matches!(
        parse("[0, 2pi]"),
        Ast::Interval {
            left_bracket: '[',
            right_bracket: ']',
            ..
        }
    ));
    let Value::Interval(interval) = value("[0, 2pi]") else {
        panic!("expected an interval");
    };
    assert!(!interval.left_open && !interval.right_open);
    assert_eq!(*interval.lower, Value::int(0));
    assert_eq!(
        *interval.upper,
        Value::mul(Value::int(2), Value::Constant(Constant::Pi))
    );
}

#[test]
fn printing_reparses_to_the_same_tree() {
    let notation = Notation::new();
    for text in [
        "x^2+2x+1",
        "-x^2",
        "x <= 2",
        "[0, 2pi)",
        "R|[0,1]",
        "sin(x)/x",
        "lim_(x->0) sin(x)/x",
        "sum_(k=1)^{4} k^2",
    ] {
        let first = notation.parse(text).unwrap().root;
        let printed = first.to_string();
        let second = notation.parse(&printed).unwrap().root;
        assert_eq!(second.to_string(), printed, "{text}");
        assert_eq!(second.evaluate().unwrap(), first.evaluate().unwrap(), "{text}");
    }
}

#[test]
fn parsing_twice_gives_the_same_tree() {
    init_logger();
    let notation = Notation::new();
    for text in [
        "x^2+2x+1",
        "R|[0,1]",
        "Z|[0, 10]",
        "|x|+2y_1",
        "2|x|+|y|",
        "sum_(k=1)^{4} k",
        "prod_(j=1)^n j",
        "lim_(x->0) sin(x)/x",
        "log_2(8)",
        "[0, 2pi)",
        "x <= 2",
        "5 = 5",
        "sin@cos",
        "-x^2",
        "xyz",
    ] {
        let first = notation.parse(text).unwrap();
        let second = notation.parse(text).unwrap();
        assert_eq!(first.root, second.root, "{text}");
        assert_eq!(first.free_symbols(), second.free_symbols(), "{text}");
    }
}

#[test]
fn bound_variables_stay_in_scope() {
    init_logger();
    let notation = Notation::new();
    let free = |text: &str| -> Vec<String> {
        let parsed = notation.parse(text).unwrap();
        parsed.free_symbols().into_iter().map(String::from).collect()
    };
    assert_eq!(free("sum_(k=1)^n k"), ["n"]);
    assert_eq!(free("prod_(j=1)^{m} j"), ["m"]);
    assert_eq!(free("x + sum_(x=1)^{3} x"), ["x"]);

    // The body is one tight group; a quotient body takes parentheses.
    let grouped = notation.parse("lim_(x->inf) (1/x)").unwrap();
    assert!(matches!(grouped.root, Ast::Limit { .. }));
    assert!(grouped.free_symbols().is_empty());
    let loose = notation.parse("lim_(x->inf) 1/x").unwrap();
    assert!(matches!(
        loose.root,
        Ast::Binary {
            op: BinaryOp::Div,
            ..
        }
    ));
    assert_eq!(loose.free_symbols(), ["x"]);
}

#[test]
fn extreme_exact_powers() {
    assert_eq!(
        value("(-2)^127"),
        Value::Number(Number::Rational(i128::MIN, 1))
    );
    let Value::Number(tiny) = value("(-2)^(-127)") else {
        panic!("expected a number");
    };
    assert!(tiny.to_f64() < 0.0);
    let root = parse("(-2)^127 = 0");
    assert!(matches!(root, Ast::BooleanResult(_)));
    assert_eq!(root.evaluate().unwrap(), Value::Bool(false));
}

#[test]
fn constant_names_can_be_parameters() {
    init_logger();
    let mut notation = Notation::new().with_constant("k", 4.0);
    notation.define("f(k) = 2k").unwrap();
    assert_eq!(
        notation.parse("f(3)").unwrap().evaluate().unwrap(),
        Value::int(6)
    );
    assert_eq!(
        notation.parse("k").unwrap().evaluate().unwrap(),
        Value::Number(Number::Real(4.0))
    );
}

#[test]
fn defined_function_applies() {
    init_logger();
    let mut notation = Notation::new();
    notation.define("f(x) = x^2").unwrap();
    assert_eq!(
        notation.parse("f(3)").unwrap().evaluate().unwrap(),
        Value::int(9)
    );
    assert_eq!(
        notation.parse("f(y + 1)").unwrap().evaluate().unwrap().to_string(),
        "(y + 1)^2"
    );
}

#[test]
fn equality_of_numbers_is_a_boolean() {
    let root = parse("5 = 5");
    assert!(matches!(root, Ast::BooleanResult(_)));
    assert_eq!(root.evaluate().unwrap(), Value::Bool(true));
    assert_eq!(root.to_latex().as_deref(), Some("\\text{True}"));

    let root = parse("x = 5");
    assert!(matches!(root, Ast::Conditional { op: Relation::Eq, .. }));
    assert!(matches!(root.evaluate().unwrap(), Value::Relation(Relation::Eq, ..)));
}

#[test]
fn number_limit_boundary() {
    let notation = limited(Limits {
        max_number: 100.0,
        ..Limits::default()
    });
    assert!(notation.parse("100").is_ok());
    match notation.parse("101") {
        Err(MathError::NumberLiteralOverflow { literal, limit }) => {
            assert_eq!(literal.as_str(), "101");
            assert_eq!(limit, 100.0);
        }
        other => panic!("expected a literal overflow, got {other:?}"),
    }
}

#[test]
fn exponent_limit_boundary() {
    let notation = limited(Limits {
        max_exponent: 10.0,
        ..Limits::default()
    });
    assert!(notation.parse("x^10").is_ok());
    assert!(notation.parse("x^(-10)").is_ok());
    assert!(notation.parse("x^n").is_ok());
    assert!(matches!(
        notation.parse("x^11"),
        Err(MathError::ExponentOverflow { .. })
    ));
    assert!(matches!(
        notation.parse("x^(5+6)"),
        Err(MathError::ExponentOverflow { .. })
    ));
}

#[test]
fn factorial_limit_boundary() {
    let notation = limited(Limits {
        max_factorial: 5.0,
        ..Limits::default()
    });
    assert_eq!(
        notation.parse("5!").unwrap().evaluate().unwrap(),
        Value::int(120)
    );
    match notation.parse("10!") {
        Err(MathError::FactorialOverflow { value, limit }) => {
            assert_eq!(value, 10.0);
            assert_eq!(limit, 5.0);
        }
        other => panic!("expected a factorial overflow, got {other:?}"),
    }
}

#[test]
fn syntax_errors() {
    init_logger();
    let err = Notation::new().parse("x = y = z").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Encountered a EQ: '=' @ 1:7 where it was not expected"
    );
    assert!(matches!(
        Notation::new().parse("x^-1"),
        Err(MathError::Syntax { kind: TokenID::Sub, .. })
    ));
    assert!(matches!(
        Notation::new().parse("(x + 1"),
        Err(MathError::UnexpectedEnd { .. })
    ));
    assert!(matches!(
        Notation::new().parse("x # 1"),
        Err(MathError::Lex { .. })
    ));
}

#[test]
fn implicit_multiplication_shapes() {
    assert!(matches!(
        parse("(x+1)(x-1)"),
        Ast::Binary { op: BinaryOp::Mul, .. }
    ));
    assert_eq!(value("2(3)"), Value::int(6));
    assert_eq!(value("10 % 4"), Value::int(2));
    assert_eq!(value("7/2").to_string(), "7/2");
}

#[test]
fn problem_round_trip() {
    init_logger();
    let problem = Problem {
        equation: "g(x) >= c".into(),
        domain: Some("R|[0, 10]".into()),
        functions: vec!["g(t) = t^2 - 1".into()],
        constants: vec![("c".into(), 3.0)],
        limits: Limits::default(),
    };
    let prepared = problem.prepare().unwrap();
    assert_eq!(prepared.equation.free_symbols(), ["x"]);
    assert!(matches!(prepared.value, Value::Relation(Relation::Ge, ..)));
    assert!(matches!(prepared.domain_value, Some(Value::Interval(_))));

    let bad = Problem {
        functions: vec!["not a function".into()],
        ..Problem::new("x")
    };
    assert!(matches!(bad.prepare(), Err(MathError::NotAFunction { .. })));
}
