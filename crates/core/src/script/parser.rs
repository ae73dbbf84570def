use pest::error::{InputLocation, LineColLocation};
use pest::iterators::{Pair, Pairs};
use pest::{Parser, Span};
use pest_derive::Parser as PestParser;
use tracing::{debug, instrument};

use super::ast::{
    BinaryOp, CharacterDecl, ChoiceOption, Expression, Literal, Program, SceneDecl,
    SourceLocation, Statement, StatementKind, SwitchCase, UnaryOp,
};
use crate::error::{IrError, IrResult};

#[derive(PestParser)]
#[grammar = "script/script.pest"]
struct ScriptParser;

/// Parses a complete script into a [`Program`].
#[instrument(skip_all, fields(bytes = source.len()))]
pub fn parse_program(source: &str) -> IrResult<Program> {
    let mut pairs = ScriptParser::parse(Rule::program, source)
        .map_err(|err| syntax_error(source, &err))?;
    let root = pairs
        .next()
        .ok_or_else(|| IrError::parse_at(source, 0, 0, "expected program"))?;

    let mut program = Program::default();
    for item in root.into_inner() {
        match item.as_rule() {
            Rule::character_decl => program.characters.push(build_character(item)?),
            Rule::scene_decl => program.scenes.push(build_scene(item)?),
            // top-level comments and EOI
            _ => {}
        }
    }
    debug!(
        characters = program.characters.len(),
        scenes = program.scenes.len(),
        "parsed script"
    );
    Ok(program)
}

/// Parses a standalone expression, as stored in IR node properties.
pub fn parse_expression(source: &str) -> IrResult<Expression> {
    let mut pairs = ScriptParser::parse(Rule::expression_only, source)
        .map_err(|err| syntax_error(source, &err))?;
    let root = pairs
        .next()
        .ok_or_else(|| IrError::parse_at(source, 0, 0, "expected expression"))?;
    let span = root.as_span();
    let mut inner = root.into_inner();
    build_expression(child(span, &mut inner, "expression")?)
}

/// Whether `text` can stand where the grammar expects a name: speakers,
/// characters, scenes, variables and goto targets.
pub fn is_identifier(text: &str) -> bool {
    ScriptParser::parse(Rule::ident_only, text).is_ok()
}

fn syntax_error(source: &str, err: &pest::error::Error<Rule>) -> IrError {
    let (offset, length) = match err.location {
        InputLocation::Pos(pos) => (pos, 1),
        InputLocation::Span((start, end)) => (start, end.saturating_sub(start).max(1)),
    };
    let (line, column) = match err.line_col {
        LineColLocation::Pos(pos) => pos,
        LineColLocation::Span(start, _) => start,
    };
    IrError::parse_at(
        source,
        offset,
        length,
        format!("{} at line {line}, column {column}", err.variant.message()),
    )
}

fn shape_error(span: Span<'_>, what: &str) -> IrError {
    IrError::parse_at(
        span.get_input(),
        span.start(),
        span.end() - span.start(),
        format!("unexpected grammar shape: {what}"),
    )
}

fn child<'i>(span: Span<'i>, pairs: &mut Pairs<'i, Rule>, what: &str) -> IrResult<Pair<'i, Rule>> {
    pairs
        .next()
        .ok_or_else(|| shape_error(span, &format!("missing {what}")))
}

fn location(pair: &Pair<'_, Rule>) -> SourceLocation {
    let (line, column) = pair.line_col();
    SourceLocation::new(
        u32::try_from(line).unwrap_or(u32::MAX),
        u32::try_from(column).unwrap_or(u32::MAX),
    )
}

// =============================================================================
// Declarations and statements
// =============================================================================

fn build_character(pair: Pair<'_, Rule>) -> IrResult<CharacterDecl> {
    let location = location(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let id = child(span, &mut inner, "character id")?.as_str().to_string();
    let mut display_name = None;
    let mut color = None;
    for field in inner {
        let field_span = field.as_span();
        let mut parts = field.into_inner();
        let name = child(field_span, &mut parts, "field name")?.as_str();
        let value = build_string(child(field_span, &mut parts, "field value")?);
        match name {
            "name" => display_name = Some(value),
            _ => color = Some(value),
        }
    }
    Ok(CharacterDecl {
        display_name: display_name.unwrap_or_else(|| id.clone()),
        id,
        color,
        location,
    })
}

fn build_scene(pair: Pair<'_, Rule>) -> IrResult<SceneDecl> {
    let location = location(&pair);
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let name = child(span, &mut inner, "scene name")?.as_str().to_string();
    let body = build_block(child(span, &mut inner, "scene body")?)?;
    Ok(SceneDecl {
        name,
        body,
        location,
    })
}

fn build_block(pair: Pair<'_, Rule>) -> IrResult<Vec<Statement>> {
    pair.into_inner().map(build_statement).collect()
}

fn build_statement(pair: Pair<'_, Rule>) -> IrResult<Statement> {
    let location = location(&pair);
    let span = pair.as_span();
    let mut outer = pair.into_inner();
    let stmt = child(span, &mut outer, "statement")?;
    let rule = stmt.as_rule();
    let span = stmt.as_span();
    let mut inner = stmt.into_inner();

    let kind = match rule {
        Rule::comment => StatementKind::Comment {
            text: child(span, &mut inner, "comment text")?
                .as_str()
                .trim()
                .to_string(),
        },
        Rule::say_stmt => {
            let first = child(span, &mut inner, "say operand")?;
            if first.as_rule() == Rule::ident {
                StatementKind::Say {
                    speaker: Some(first.as_str().to_string()),
                    text: build_string(child(span, &mut inner, "say text")?),
                }
            } else {
                StatementKind::Say {
                    speaker: None,
                    text: build_string(first),
                }
            }
        }
        Rule::show_background_stmt => StatementKind::ShowBackground {
            asset: build_string(child(span, &mut inner, "background asset")?),
        },
        Rule::show_character_stmt => StatementKind::ShowCharacter {
            character: child(span, &mut inner, "character")?.as_str().to_string(),
            position: inner.next().map(|pos| pos.as_str().to_string()),
        },
        Rule::hide_stmt => StatementKind::HideCharacter {
            character: child(span, &mut inner, "character")?.as_str().to_string(),
        },
        Rule::choice_stmt => StatementKind::Choice {
            options: inner.map(build_choice_option).collect::<IrResult<_>>()?,
        },
        Rule::if_stmt => build_if(span, inner)?,
        Rule::switch_stmt => {
            let subject = build_expression(child(span, &mut inner, "switch subject")?)?;
            let mut cases = Vec::new();
            let mut default = None;
            for arm in inner {
                let arm_rule = arm.as_rule();
                let arm_span = arm.as_span();
                let mut parts = arm.into_inner();
                if arm_rule == Rule::default_case {
                    default = Some(build_block(child(arm_span, &mut parts, "default body")?)?);
                } else {
                    let value = build_expression(child(arm_span, &mut parts, "case value")?)?;
                    let body = build_block(child(arm_span, &mut parts, "case body")?)?;
                    cases.push(SwitchCase { value, body });
                }
            }
            StatementKind::Switch {
                subject,
                cases,
                default,
            }
        }
        Rule::while_stmt => StatementKind::While {
            condition: build_expression(child(span, &mut inner, "loop condition")?)?,
            body: build_block(child(span, &mut inner, "loop body")?)?,
        },
        Rule::set_stmt => StatementKind::Set {
            variable: child(span, &mut inner, "variable")?.as_str().to_string(),
            value: build_expression(child(span, &mut inner, "value")?)?,
        },
        Rule::goto_stmt => StatementKind::Goto {
            target: child(span, &mut inner, "goto target")?.as_str().to_string(),
        },
        Rule::wait_stmt => StatementKind::Wait {
            seconds: build_number(child(span, &mut inner, "wait duration")?)?,
        },
        Rule::play_music_stmt => StatementKind::PlayMusic {
            asset: build_string(child(span, &mut inner, "music asset")?),
        },
        Rule::play_sound_stmt => StatementKind::PlaySound {
            asset: build_string(child(span, &mut inner, "sound asset")?),
        },
        Rule::stop_music_stmt => StatementKind::StopMusic,
        Rule::transition_stmt => StatementKind::Transition {
            kind: child(span, &mut inner, "transition kind")?.as_str().to_string(),
            duration: build_number(child(span, &mut inner, "transition duration")?)?,
        },
        Rule::block_stmt => StatementKind::Block {
            body: build_block(child(span, &mut inner, "block")?)?,
        },
        _ => return Err(shape_error(span, "unknown statement")),
    };
    Ok(Statement::at(kind, location))
}

fn build_if<'i>(span: Span<'i>, mut inner: Pairs<'i, Rule>) -> IrResult<StatementKind> {
    let condition = build_expression(child(span, &mut inner, "if condition")?)?;
    let then_branch = build_block(child(span, &mut inner, "if body")?)?;
    let else_branch = match inner.next() {
        None => None,
        Some(clause) => {
            let clause_span = clause.as_span();
            let mut parts = clause.into_inner();
            let target = child(clause_span, &mut parts, "else body")?;
            if target.as_rule() == Rule::if_stmt {
                let nested_location = location(&target);
                let nested_span = target.as_span();
                let nested = build_if(nested_span, target.into_inner())?;
                Some(vec![Statement::at(nested, nested_location)])
            } else {
                Some(build_block(target)?)
            }
        }
    };
    Ok(StatementKind::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn build_choice_option(pair: Pair<'_, Rule>) -> IrResult<ChoiceOption> {
    let span = pair.as_span();
    let mut inner = pair.into_inner();
    let text = build_string(child(span, &mut inner, "option text")?);
    let next = child(span, &mut inner, "option body")?;
    let (condition, body) = if next.as_rule() == Rule::expression {
        let condition = build_expression(next)?;
        (Some(condition), child(span, &mut inner, "option body")?)
    } else {
        (None, next)
    };
    Ok(ChoiceOption {
        text,
        condition,
        body: build_block(body)?,
    })
}

fn build_number(pair: Pair<'_, Rule>) -> IrResult<f64> {
    let span = pair.as_span();
    pair.as_str()
        .parse::<f64>()
        .map_err(|err| shape_error(span, &format!("invalid number: {err}")))
}

fn build_string(pair: Pair<'_, Rule>) -> String {
    let raw = pair
        .into_inner()
        .next()
        .map(|inner| inner.as_str())
        .unwrap_or_default();
    unescape(raw)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

// =============================================================================
// Expressions
// =============================================================================

fn build_expression(pair: Pair<'_, Rule>) -> IrResult<Expression> {
    let span = pair.as_span();
    match pair.as_rule() {
        Rule::expression => {
            let mut inner = pair.into_inner();
            build_expression(child(span, &mut inner, "expression")?)
        }
        Rule::or_expr
        | Rule::and_expr
        | Rule::equality
        | Rule::comparison
        | Rule::additive
        | Rule::multiplicative => {
            let mut inner = pair.into_inner();
            let mut lhs = build_expression(child(span, &mut inner, "operand")?)?;
            while let Some(op_pair) = inner.next() {
                let op = BinaryOp::from_symbol(op_pair.as_str())
                    .ok_or_else(|| shape_error(op_pair.as_span(), "unknown operator"))?;
                let rhs = build_expression(child(span, &mut inner, "right operand")?)?;
                lhs = Expression::binary(op, lhs, rhs);
            }
            Ok(lhs)
        }
        Rule::unary => {
            let mut ops = Vec::new();
            let mut operand = None;
            for part in pair.into_inner() {
                match part.as_rule() {
                    Rule::not_op => ops.push(UnaryOp::Not),
                    Rule::neg_op => ops.push(UnaryOp::Neg),
                    _ => operand = Some(build_expression(part)?),
                }
            }
            let mut expr = operand.ok_or_else(|| shape_error(span, "missing unary operand"))?;
            for op in ops.into_iter().rev() {
                expr = Expression::unary(op, expr);
            }
            Ok(expr)
        }
        Rule::integer => pair
            .as_str()
            .parse::<i64>()
            .map(|value| Expression::Literal(Literal::Int(value)))
            .map_err(|_| {
                IrError::parse_at(
                    span.get_input(),
                    span.start(),
                    span.end() - span.start(),
                    "integer literal out of range",
                )
            }),
        Rule::float => Ok(Expression::Literal(Literal::Float(build_number(pair)?))),
        Rule::boolean => Ok(Expression::Literal(Literal::Bool(pair.as_str() == "true"))),
        Rule::string => Ok(Expression::Literal(Literal::String(build_string(pair)))),
        Rule::ident => Ok(Expression::Variable(pair.as_str().to_string())),
        _ => Err(shape_error(span, "unexpected expression")),
    }
}
