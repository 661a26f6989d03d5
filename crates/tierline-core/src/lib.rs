//! Tierline Core Types and Definitions
//!
//! This crate provides the foundational types shared by the Tierline layout
//! engine and its consumers. It includes:
//!
//! - **Identifiers**: Lexically ordered symbol and element identifiers ([`identifier::Id`])
//! - **Geometry**: Integer grid geometry ([`geometry`] module)
//! - **Symbols**: The single-line diagram symbol model ([`symbol`] module)

pub mod geometry;
pub mod identifier;
pub mod symbol;
