//! API schema definitions

pub mod gemini;
