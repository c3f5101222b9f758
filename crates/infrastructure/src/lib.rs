//! Ferrous Cache Infrastructure Layer
pub mod dns;
