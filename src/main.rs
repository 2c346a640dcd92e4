fn main() {
    if let Err(e) = sgclean::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
