use crate::error::ParseError;
use crate::translate::{Literal, Tuple};
use nom::{
    branch::alt,
    bytes::complete::{escaped_transform, tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, none_of, one_of},
    combinator::{all_consuming, map, map_res, opt, recognize, value},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    Finish, IResult,
};

fn white(i: &str) -> IResult<&str, &str> {
    multispace0(i)
}

fn ident(i: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_')(i)
}

fn keyword(i: &str) -> IResult<&str, Literal> {
    alt((
            value(Literal::Null, tag("null")),
            value(Literal::Bool(true), tag("true")),
            value(Literal::Bool(false), tag("false")),
            value(Literal::Decimal(f64::NAN), tag("NaN")),
            value(Literal::Decimal(f64::INFINITY), tag("inf")),
            value(Literal::Decimal(f64::NEG_INFINITY), tag("-inf")),
    ))(i)
}

fn exponent(i: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(i)
}

/// Needs a fraction or an exponent, everything else is an integer
fn decimal(i: &str) -> IResult<&str, f64> {
    map_res(
        recognize(tuple((
            opt(char('-')),
            digit1,
            alt((recognize(tuple((char('.'), digit1, opt(exponent)))), exponent)),
        ))),
        |n: &str| n.parse(),
    )(i)
}

fn integer(i: &str) -> IResult<&str, i128> {
    map_res(recognize(pair(opt(char('-')), digit1)), |n: &str| n.parse())(i)
}

fn b64(i: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')(i)
}

fn bytes(i: &str) -> IResult<&str, Vec<u8>> {
    map_res(preceded(char(':'), b64), base64::decode)(i)
}

fn string(i: &str) -> IResult<&str, String> {
    delimited(
            char('"'),
            map(opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((
                        value("\\", tag("\\")),
                        value("\"", tag("\"")),
                )))), |c| c.unwrap_or_default()),
            char('"'),
    )(i)
}

fn literal(i: &str) -> IResult<&str, Literal> {
    alt((
        map(string, Literal::Text),
        map(bytes, Literal::Bytes),
        map(decimal, Literal::Decimal),
        map(integer, Literal::Integer),
        keyword,
    ))(i)
}

fn node(i: &str) -> IResult<&str, Tuple> {
    let (i, _) = pair(white, char('('))(i)?;
    let (i, name) = preceded(white, ident)(i)?;
    let (i, parsed) = match name {
        "described" => map(pair(node, node), |(d, v)| Tuple::Described(Box::new(d), Box::new(v)))(i)?,
        "list"      => map(many0(node), Tuple::List)(i)?,
        "map"       => map(many0(pair(node, node)), Tuple::Map)(i)?,
        "array"     => {
            let (i, descriptor) = opt(node)(i)?;
            let (i, name) = preceded(white, ident)(i)?;
            // bare literals are leaves of the element type, compound elements are spelled out
            let (i, elements) = many0(alt((
                node,
                map(preceded(white, literal), |literal| Tuple::Leaf { name: name.to_owned(), literal: Some(literal) }),
            )))(i)?;
            (i, Tuple::Array { descriptor: descriptor.map(Box::new), name: name.to_owned(), elements })
        },
        _           => map(
            opt(preceded(white, literal)),
            |literal| Tuple::Leaf { name: name.to_owned(), literal },
        )(i)?,
    };
    let (i, _) = pair(white, char(')'))(i)?;
    Ok((i, parsed))
}

/// Parses a single tuple, optionally surrounded by whitespace.
pub fn parse(input: &str) -> Result<Tuple, ParseError> {
    all_consuming(terminated(node, white))(input)
        .finish()
        .map(|(_, tuple)| tuple)
        .map_err(|e| ParseError::new(input, e))
}
