//! Plain data structures with no scheduling awareness.

pub mod ring;
