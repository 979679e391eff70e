//! A textual tuple notation for AMQP values, meant for writing test vectors and filter expressions by hand.
//!
//! Every leaf names its wire type explicitly, so the notation maps onto codec values without any inference:
//!
//! ```text
//! (list (uint 1) (symbol "a") (binary :AQID))
//! (map (symbol "k") (ulong 7))
//! (array uint 1 2 3)
//! (array (symbol "com.example:point") list (list (int 1) (int 2)) (list (int 3) (int 4)))
//! (described (symbol "apache.org:selector-filter:string") (string "colour = 'green'"))
//! ```
//!
//! Leaf type names are exactly the type names of `amqp10_codec::Type`. A name which is not part of that table, or
//! names a type the codec cannot encode, is rejected together with its category so typos never turn into silently
//! miscoded bytes.
//!
//! Array elements are bare literals of the element type, or full tuples for lists, maps and arrays. A tuple right
//! after `array` is the descriptor shared by all elements. Doubles and floats also accept `NaN`, `inf` and `-inf`.
//!
//! # Examples
//!
//! ```
//! let value = amqp10_tuple::read("(list (uint 1) (symbol \"a\"))").unwrap();
//! let mut buf = Vec::new();
//! amqp10_codec::encode(&value, &mut buf).unwrap();
//! assert_eq!(buf, [0xc0, 0x06, 0x02, 0x52, 0x01, 0xa3, 0x01, 0x61]);
//! ```

mod error;
mod parser;
mod translate;

pub use error::*;
pub use parser::parse;
pub use translate::*;

use amqp10_codec::Value;

/// Parses and translates in one step.
pub fn read(input: &str) -> Result<Value, TranslateError> {
    translate(&parse(input)?)
}
