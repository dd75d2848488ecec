pub mod sim;
pub mod utils;
