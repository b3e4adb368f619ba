fn main() {
    if let Err(err) = dynrow::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
