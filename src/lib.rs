use std::process;

use error::ScanError;

pub mod error;
pub mod interface;
pub mod logger;
pub mod port;
pub mod scan;
pub mod source;

pub fn abort(error: ScanError) -> ! {
    eprintln!("Internal Error: {}", error);
    process::exit(1);
}
