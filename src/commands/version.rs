pub fn run() -> anyhow::Result<()> {
    println!("generalscaler {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
