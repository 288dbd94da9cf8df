pub mod ping;
pub mod signup;
pub mod track;
