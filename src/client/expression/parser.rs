//! Expression parser.
use super::{BinaryOp, Expression, UnaryOp};
use chumsky::prelude::*;
use chumsky::Parser;
use serde_json::Value;

type Err<'a> = extra::Err<Rich<'a, char>>;

enum Postfix {
    Field(String),
    Index(Expression),
}

fn string<'a>() -> impl Parser<'a, &'a str, String, Err<'a>> + Clone {
    let escape = just('\\').ignore_then(choice((
        just('\\'),
        just('"'),
        just('/'),
        just('n').to('\n'),
        just('t').to('\t'),
        just('r').to('\r'),
    )));

    none_of("\\\"")
        .or(escape)
        .repeated()
        .collect::<String>()
        .delimited_by(just('"'), just('"'))
        .labelled("string")
}

fn number<'a>() -> impl Parser<'a, &'a str, Value, Err<'a>> + Clone {
    text::int(10)
        .then(just('.').then(text::digits(10)).or_not())
        .to_slice()
        .try_map(|s: &str, span| {
            if let Ok(int) = s.parse::<i64>() {
                return Ok(Value::from(int));
            }
            s.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| Rich::custom(span, format!("invalid number `{s}`")))
        })
        .labelled("number")
}

fn keyword_literal<'a>() -> impl Parser<'a, &'a str, Value, Err<'a>> + Clone {
    text::ascii::ident().try_map(|ident: &str, span| match ident {
        "null" => Ok(Value::Null),
        "true" => Ok(Value::Bool(true)),
        "false" => Ok(Value::Bool(false)),
        _ => Err(Rich::custom(
            span,
            format!("unknown identifier `{ident}`, use `$` to refer to the message"),
        )),
    })
}

fn binary<'a, P, O>(operand: P, operator: O) -> Boxed<'a, 'a, &'a str, Expression, Err<'a>>
where
    P: Parser<'a, &'a str, Expression, Err<'a>> + Clone + 'a,
    O: Parser<'a, &'a str, BinaryOp, Err<'a>> + Clone + 'a,
{
    operand
        .clone()
        .foldl(operator.then(operand).repeated(), |lhs, (op, rhs)| {
            Expression::Binary(op, Box::new(lhs), Box::new(rhs))
        })
        .boxed()
}

/// Expression parser, does not require input end.
pub fn parser<'a>() -> impl Parser<'a, &'a str, Expression, Err<'a>> + Clone {
    recursive(|expr| {
        let op = |sym| just(sym).padded();

        let array = expr
            .clone()
            .separated_by(op(","))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(op("["), op("]"))
            .map(Expression::Array)
            .labelled("array");

        let key = string()
            .or(text::ascii::ident().map(ToString::to_string))
            .padded()
            .labelled("object key");
        let object = key
            .then_ignore(op(":"))
            .then(expr.clone())
            .separated_by(op(","))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(op("{"), op("}"))
            .map(Expression::Object)
            .labelled("object");

        let atom = choice((
            op("$").to(Expression::Root),
            number().map(Expression::Literal),
            string().map(|s| Expression::Literal(Value::String(s))),
            keyword_literal().map(Expression::Literal),
            array,
            object,
            expr.clone().delimited_by(op("("), op(")")),
        ))
        .padded()
        .boxed();

        let postfix = choice((
            op(".")
                .ignore_then(text::ascii::ident())
                .map(|field: &str| Postfix::Field(field.to_string()))
                .labelled("field name"),
            expr.clone()
                .delimited_by(op("["), op("]"))
                .map(Postfix::Index)
                .labelled("index"),
        ));
        let access = atom
            .foldl(postfix.repeated(), |lhs, postfix| match postfix {
                Postfix::Field(field) => Expression::Field(Box::new(lhs), field),
                Postfix::Index(index) => Expression::Index(Box::new(lhs), Box::new(index)),
            })
            .boxed();

        let unary = choice((op("!").to(UnaryOp::Not), op("-").to(UnaryOp::Neg)))
            .repeated()
            .foldr(access, |op, rhs| Expression::Unary(op, Box::new(rhs)))
            .boxed();

        let product = binary(
            unary,
            choice((
                op("*").to(BinaryOp::Mul),
                op("/").to(BinaryOp::Div),
                op("%").to(BinaryOp::Rem),
            )),
        );
        let sum = binary(
            product,
            choice((op("+").to(BinaryOp::Add), op("-").to(BinaryOp::Sub))),
        );
        let comparison = binary(
            sum,
            choice((
                op("<=").to(BinaryOp::Le),
                op(">=").to(BinaryOp::Ge),
                op("<").to(BinaryOp::Lt),
                op(">").to(BinaryOp::Gt),
            )),
        );
        let equality = binary(
            comparison,
            choice((op("==").to(BinaryOp::Eq), op("!=").to(BinaryOp::Ne))),
        );
        let and = binary(equality, op("&&").to(BinaryOp::And));
        binary(and, op("||").to(BinaryOp::Or))
    })
}

/// `<content expression> to <target expression>` parser.
pub fn message_parser<'a>() -> impl Parser<'a, &'a str, (Expression, Expression), Err<'a>> {
    let to = text::ascii::ident()
        .filter(|word: &&str| *word == "to")
        .padded()
        .labelled("`to`");

    parser().then_ignore(to).then(parser()).then_ignore(end())
}
