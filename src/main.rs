fn main() {
    if let Err(err) = storm_board::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
