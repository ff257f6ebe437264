fn main() {
    if let Err(e) = irisbind::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(irisbind::exit_code(&e));
    }
}
