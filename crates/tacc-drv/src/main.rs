fn main() {
    if let Err(e) = tacc_drv::run() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
