//! Selector markup: a compact, indentation-sensitive description of a DOM
//! subtree (`ui-card.card#main[role="group"]\n\t"title"`).

pub mod builder;
pub mod tokenizer;

pub use builder::create_element;
pub use tokenizer::{tokenize, AttributeOperator, AttributeToken, Token};
