//! Integration test crate for EVA.
//!
//! Holds cross-crate tests that drive the annotation store through the
//! log, settings and export layers together.

#[cfg(test)]
mod annotation;

#[cfg(test)]
mod properties;
