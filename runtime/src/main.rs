use cinder::runtime::{Runtime, RuntimeConfig};
use std::env;
use std::process;

fn main() {
    let mut path = None;
    let mut config = RuntimeConfig::default();

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--trace" => config = config.with_trace(true),
            "--debug" => config = config.with_debug_mode(true),
            _ => {
                if path.replace(arg).is_some() {
                    eprintln!("Usage: cinder [--trace] [--debug] <file.ash>");
                    process::exit(2);
                }
            }
        }
    }

    let Some(path) = path else {
        eprintln!("Usage: cinder [--trace] [--debug] <file.ash>");
        process::exit(2);
    };

    let runtime = Runtime::with_config(config);
    if let Err(e) = runtime.execute_file(&path) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
