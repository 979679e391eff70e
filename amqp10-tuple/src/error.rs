use crate::translate::Category;
use amqp10_codec::{EncodeError, Type};
use thiserror::Error;

/// The input is not valid tuple notation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid tuple notation at position {position}: {kind}")]
pub struct ParseError {
    position: usize,
    kind: String,
}

impl ParseError {
    pub(crate) fn new(input: &str, e: nom::error::Error<&str>) -> Self {
        Self { position: input.len() - e.input.len(), kind: e.code.description().to_owned() }
    }

    /// Byte offset into the input at which parsing failed.
    pub fn position(&self) -> usize {
        self.position
    }
}

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Unsupported {category} type {name}")]
    UnsupportedType { name: String, category: Category },
    #[error("Invalid {ty} literal: {source}")]
    Literal {
        ty: Type,
        #[source]
        source: EncodeError,
    },
}
