//! Amazon's first-party models. Nova and Titan share the provider token but not the payload shape.

pub(crate) mod nova;
pub(crate) mod titan;
