pub mod choices;
pub mod codes;
