//! Client-side form engine for a CV record: normalize → reconcile → change → validate → encode.

pub mod change;
pub mod encode;
pub mod field_errors;
pub mod model;
pub mod normalize;
pub mod path;
pub mod reconcile;
pub mod validate;
