pub mod achievement;
pub mod challenge;
pub mod check_in;
pub mod mood;
pub mod preferences;
