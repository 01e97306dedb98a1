use winnow::combinator::alt;
use winnow::error::ModalResult;
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::{Operator, RuleError};

use super::token::Token;

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

// -- Punctuation & operators ------------------------------------------------

fn paren(input: &mut &str) -> ModalResult<Token> {
    alt(('('.value(Token::LeftParen), ')'.value(Token::RightParen))).parse_next(input)
}

// Two-character forms must be tried before their one-character prefixes.
fn comparison(input: &mut &str) -> ModalResult<Operator> {
    alt((
        ">=".value(Operator::Gte),
        "<=".value(Operator::Lte),
        ">".value(Operator::Gt),
        "<".value(Operator::Lt),
        "=".value(Operator::Eq),
    ))
    .parse_next(input)
}

// -- Operands ---------------------------------------------------------------

fn quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    ('\'', take_till(0.., '\''), '\'').take().parse_next(input)
}

fn negative_number<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        '-',
        take_while(1.., |c: char| c.is_ascii_digit()),
        take_while(0.., |c: char| is_word_char(c) || c == '.'),
    )
        .take()
        .parse_next(input)
}

fn word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., is_word_char),
        take_while(0.., |c: char| is_word_char(c) || c == '.'),
    )
        .take()
        .parse_next(input)
}

fn keyword_or_operand(word: &str) -> Token {
    match word {
        "AND" => Token::Operator(Operator::And),
        "OR" => Token::Operator(Operator::Or),
        other => Token::Operand(other.to_owned()),
    }
}

fn token(input: &mut &str) -> ModalResult<Token> {
    alt((
        paren,
        comparison.map(Token::Operator),
        quoted.map(|s: &str| Token::Operand(s.to_owned())),
        negative_number.map(|s: &str| Token::Operand(s.to_owned())),
        word.map(keyword_or_operand),
    ))
    .parse_next(input)
}

// -- Entry point ------------------------------------------------------------

/// Split rule text into tokens, left to right.
///
/// # Errors
///
/// Returns [`RuleError::InvalidToken`] at the first character that starts no
/// token class, and [`RuleError::EmptyExpression`] if the text holds no tokens.
pub fn tokenize(text: &str) -> Result<Vec<Token>, RuleError> {
    let mut input = text;
    let mut tokens = Vec::new();

    loop {
        input = input.trim_start();
        if input.is_empty() {
            break;
        }
        let rest = input;
        match token.parse_next(&mut input) {
            Ok(tok) => tokens.push(tok),
            Err(_) => {
                return Err(RuleError::InvalidToken {
                    offset: text.len() - rest.len(),
                    found: rest.split_whitespace().next().unwrap_or(rest).to_owned(),
                });
            }
        }
    }

    if tokens.is_empty() {
        return Err(RuleError::EmptyExpression);
    }
    Ok(tokens)
}
