fn main() -> Result<(), Box<dyn std::error::Error>> {
    lowkey::cli::main()
}
