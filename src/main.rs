fn main() -> anyhow::Result<()> {
    strutrouter::cli::run_cli()
}
