pub mod data;
pub mod json;
pub mod policy;
pub mod validate;
