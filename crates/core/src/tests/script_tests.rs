use super::*;
use crate::error::IrError;

fn first_scene_body(source: &str) -> Vec<Statement> {
    let program = parse_program(source).expect("parse");
    program
        .scenes
        .into_iter()
        .next()
        .expect("scene")
        .body
}

fn expr(source: &str) -> Expression {
    parse_expression(source).expect("expression")
}

#[test]
fn test_parse_characters_and_scenes() {
    let program = parse_program(
        r##"
character hero(name: "Alex", color: "#ffcc00")
character guide()

scene intro {
    say hero "Hello!"
    say "Narration."
}
"##,
    )
    .expect("parse");

    assert_eq!(program.characters.len(), 2);
    assert_eq!(program.characters[0].display_name, "Alex");
    assert_eq!(program.characters[0].color.as_deref(), Some("#ffcc00"));
    assert_eq!(program.characters[1].display_name, "guide");
    assert_eq!(program.scenes[0].name, "intro");
    assert_eq!(
        program.scenes[0].body[1].kind,
        StatementKind::Say {
            speaker: None,
            text: "Narration.".to_string(),
        }
    );
}

#[test]
fn test_statement_locations_are_one_based() {
    let body = first_scene_body("scene a {\n  say \"x\"\n    wait 2\n}");
    assert_eq!(body[0].location, SourceLocation::new(2, 3));
    assert_eq!(body[1].location, SourceLocation::new(3, 5));
}

#[test]
fn test_parse_every_statement_form() {
    let body = first_scene_body(
        r#"scene s {
    show background "park.png"
    show hero at left
    show guide
    hide hero
    set gold = gold + 1
    wait 1.5
    play music "theme.ogg"
    play sound "door.wav"
    stop music
    transition fade 0.5
    goto ending
    // remember this
    while gold < 10 { set gold = gold + 2 }
    switch mood { case 1 { say "one" } case "two" { } default { say "other" } }
    choice {
        "Go left" -> { goto left }
        "Pay" if gold >= 5 -> { set gold = gold - 5 }
    }
}"#,
    );
    let names: Vec<&str> = body.iter().map(|stmt| stmt.kind.name()).collect();
    assert_eq!(
        names,
        vec![
            "show background",
            "show",
            "show",
            "hide",
            "set",
            "wait",
            "play music",
            "play sound",
            "stop music",
            "transition",
            "goto",
            "comment",
            "while",
            "switch",
            "choice",
        ]
    );
    assert_eq!(
        body[1].kind,
        StatementKind::ShowCharacter {
            character: "hero".to_string(),
            position: Some("left".to_string()),
        }
    );
    assert_eq!(
        body[11].kind,
        StatementKind::Comment {
            text: "remember this".to_string()
        }
    );
    match &body[14].kind {
        StatementKind::Choice { options } => {
            assert_eq!(options.len(), 2);
            assert!(options[0].condition.is_none());
            assert_eq!(options[1].condition.as_ref().map(|c| c.to_string()).as_deref(), Some("gold >= 5"));
        }
        other => panic!("expected choice, got {other:?}"),
    }
}

#[test]
fn test_else_if_chains_nest() {
    let body = first_scene_body("scene s { if a { } else if b { } else { say \"c\" } }");
    let StatementKind::If { else_branch, .. } = &body[0].kind else {
        panic!("expected if");
    };
    let nested = else_branch.as_ref().expect("else branch");
    assert_eq!(nested.len(), 1);
    assert!(matches!(
        &nested[0].kind,
        StatementKind::If { else_branch: Some(inner), .. } if inner.len() == 1
    ));
}

#[test]
fn test_nested_block_is_parsed() {
    let body = first_scene_body("scene s { { say \"inside\" } }");
    assert!(matches!(&body[0].kind, StatementKind::Block { body } if body.len() == 1));
}

#[test]
fn test_keywords_need_word_boundary() {
    let body = first_scene_body("scene s { set notice = not_done or order }");
    assert_eq!(
        body[0].kind,
        StatementKind::Set {
            variable: "notice".to_string(),
            value: Expression::binary(
                BinaryOp::Or,
                Expression::variable("not_done"),
                Expression::variable("order"),
            ),
        }
    );
}

#[test]
fn test_string_escapes() {
    let body = first_scene_body(r#"scene s { say "a \"quoted\" line\nnext\\" }"#);
    assert_eq!(
        body[0].kind,
        StatementKind::Say {
            speaker: None,
            text: "a \"quoted\" line\nnext\\".to_string(),
        }
    );
}

#[test]
fn test_precedence_and_associativity() {
    assert_eq!(
        expr("a + b * c"),
        Expression::binary(
            BinaryOp::Add,
            Expression::variable("a"),
            Expression::binary(BinaryOp::Mul, Expression::variable("b"), Expression::variable("c")),
        )
    );
    assert_eq!(
        expr("a - b - c"),
        Expression::binary(
            BinaryOp::Sub,
            Expression::binary(BinaryOp::Sub, Expression::variable("a"), Expression::variable("b")),
            Expression::variable("c"),
        )
    );
    assert_eq!(
        expr("not a and b"),
        Expression::binary(
            BinaryOp::And,
            Expression::unary(UnaryOp::Not, Expression::variable("a")),
            Expression::variable("b"),
        )
    );
    assert_eq!(
        expr("a or b and c == 1"),
        Expression::binary(
            BinaryOp::Or,
            Expression::variable("a"),
            Expression::binary(
                BinaryOp::And,
                Expression::variable("b"),
                Expression::binary(BinaryOp::Eq, Expression::variable("c"), Expression::int(1)),
            ),
        )
    );
}

#[test]
fn test_negative_literals_and_negation() {
    assert_eq!(expr("-3"), Expression::int(-3));
    assert_eq!(
        expr("-x"),
        Expression::unary(UnaryOp::Neg, Expression::variable("x"))
    );
    assert_eq!(expr("2.50"), Expression::Literal(Literal::Float(2.5)));
    assert_eq!(expr("true"), Expression::Literal(Literal::Bool(true)));
}

#[test]
fn test_printer_uses_minimal_parentheses() {
    let cases = [
        ("a + b * c", "a + b * c"),
        ("(a + b) * c", "(a + b) * c"),
        ("a - (b - c)", "a - (b - c)"),
        ("(a - b) - c", "a - b - c"),
        ("not (a or b)", "not (a or b)"),
        ("-(3)", "-(3)"),
        ("- -3", "-(-3)"),
        ("((x))", "x"),
        ("a<=b", "a <= b"),
    ];
    for (input, printed) in cases {
        let parsed = expr(input);
        assert_eq!(parsed.to_string(), printed, "input {input}");
        assert_eq!(expr(printed), parsed, "reparse of {printed}");
    }
}

#[test]
fn test_format_float_keeps_decimal_point() {
    assert_eq!(format_float(1.0), "1.0");
    assert_eq!(format_float(2.5), "2.5");
    assert_eq!(format_float(-0.25), "-0.25");
    assert_eq!(format_float(f64::NAN), "0.0");
    assert_eq!(format_float(f64::INFINITY), "0.0");
}

#[test]
fn test_syntax_error_is_reported_with_location() {
    let err = parse_program("scene intro {\n    say hero\n}").expect_err("missing text");
    match err {
        IrError::Parse { message, .. } => assert!(message.contains("line"), "{message}"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_integer_out_of_range_is_parse_error() {
    let err = parse_expression("99999999999999999999").expect_err("overflow");
    assert!(matches!(err, IrError::Parse { .. }));
}

#[test]
fn test_generator_output() {
    let program = parse_program(
        r##"character hero(name: "Alex", color: "#ffcc00")
scene intro {
  say hero "Hi \"there\""
  if mood > 3 { say "good" } else if mood == 0 { wait 1 } else { goto ending }
  choice { "Stay" if not tired -> { } }
}"##,
    )
    .expect("parse");
    let text = AstToTextGenerator::default().generate(&program);
    insta::assert_snapshot!(text.trim_end(), @r###"
character hero(name: "Alex", color: "#ffcc00")

scene intro {
    say hero "Hi \"there\""
    if mood > 3 {
        say "good"
    } else if mood == 0 {
        wait 1.0
    } else {
        goto ending
    }
    choice {
        "Stay" if not tired -> {
        }
    }
}
"###);
}

#[test]
fn test_generated_text_reparses_identically() {
    let source = r#"scene a {
    switch x { case 1 { say "one" } default { } }
    while not done { set done = count >= 3 }
    { say "nested" }
    // note
}
scene b { transition dissolve 2 }"#;
    let program = parse_program(source).expect("parse");
    let generator = AstToTextGenerator::new(2);
    let text = generator.generate(&program);
    let reparsed = parse_program(&text).expect("reparse");
    assert_eq!(generator.generate(&reparsed), text);
    assert_eq!(reparsed.scenes.len(), 2);
}
