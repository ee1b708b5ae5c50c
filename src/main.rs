use i2c_shim::{init_tracing, run_probe};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=trace shows every chunk on the bus
    init_tracing();

    // Load configuration from CONFIG_PATH or default
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    tracing::info!("[i2c-probe] configuration path: {}", config_path);

    run_probe(&config_path)?;
    Ok(())
}
