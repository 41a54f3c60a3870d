pub mod input;
pub mod auto_close;
