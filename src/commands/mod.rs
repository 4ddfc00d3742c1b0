pub mod evaluate;
pub mod inputs;
pub mod probe;
pub mod status;
