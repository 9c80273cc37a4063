//! Wire-level types shared between the newsroom client core and its hosting shells.

pub mod domain;
pub mod error;
pub mod protocol;
