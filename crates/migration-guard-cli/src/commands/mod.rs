pub mod check;
pub mod versions;
