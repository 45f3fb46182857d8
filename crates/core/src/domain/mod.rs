pub mod diagnostic;
pub mod options;
pub mod resource;
