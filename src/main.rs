fn main() {
    if let Err(err) = seqsketch::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
