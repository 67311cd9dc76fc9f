fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Err(err) = wildwood::run(&args) {
        eprintln!("wildwood: {}", err);
        std::process::exit(1);
    }
}
