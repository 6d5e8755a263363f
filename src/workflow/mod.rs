//! Editing stages and their soft readiness gates.

pub(crate) mod stage;
