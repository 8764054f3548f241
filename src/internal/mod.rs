//! Low-level logic used throughout this crate
//!
//! This module serves as a general heading for definitions that are
//! designed primarily for library-internal use, and do not have an
//! immediately obvious alternate module to live under.
//!
//! Currently this is only the [`Stack`] abstraction, which backs both the
//! field-id scopes of the Compact protocol and the frame stack of the
//! SimpleJSON protocol. When the `smallvec_framestack` feature is enabled,
//! the concrete stack type [`FrameStack`] is an inline `SmallVec` instead of
//! a `Vec`, avoiding heap allocation for shallow nesting.

pub mod stack;

pub use stack::{FrameStack, Stack};
