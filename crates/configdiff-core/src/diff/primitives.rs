use crate::{Coercions, Node};

/// Decides whether two scalars are the same under `coercions`.
///
/// Same-kind scalars compare by value (numbers use plain floating-point
/// equality). Cross-kind pairs are only equal when the matching coercion is
/// enabled. Containers never compare equal here.
///
/// ```
/// # use configdiff_core::{diff::equal_scalars, Coercions, Node, Number};
/// let text = Node::String("3".into());
/// let number = Node::Number(Number::new(3.0).unwrap());
/// assert!(!equal_scalars(&text, &number, Coercions::default()));
/// let coercions = Coercions { numeric_strings: true, ..Coercions::default() };
/// assert!(equal_scalars(&text, &number, coercions));
/// ```
#[must_use]
pub fn equal_scalars(old: &Node, new: &Node, coercions: Coercions) -> bool {
    match (old, new) {
        (Node::Null, Node::Null) => true,
        (Node::Bool(a), Node::Bool(b)) => a == b,
        (Node::Number(a), Node::Number(b)) => a == b,
        (Node::String(a), Node::String(b)) => a == b,
        (Node::String(text), Node::Number(number)) | (Node::Number(number), Node::String(text))
            if coercions.numeric_strings =>
        {
            text.parse::<f64>().is_ok_and(|parsed| parsed == number.get())
        }
        (Node::String(text), Node::Bool(flag)) | (Node::Bool(flag), Node::String(text))
            if coercions.bool_strings =>
        {
            matches!((text.as_str(), flag), ("true", true) | ("false", false))
        }
        _ => false,
    }
}
