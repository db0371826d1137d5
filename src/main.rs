use std::process;

fn main() {
    if let Err(err) = ceptra_cursor::app::run() {
        eprintln!("fatal: {err:#}");
        process::exit(1);
    }
}
