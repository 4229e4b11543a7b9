//! Tree-query (XPath) construction and rendering.
//!
//! - [`expression`]: expression tree and composition DSL
//! - [`renderer`]: XPath 1.0 serialization

pub mod expression;
pub mod renderer;

pub use expression::{attr, normalized_text, Expression};
pub use renderer::{quote_literal, Renderer};
