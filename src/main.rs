use attendance::{AppConfig, app};

/// Main entry point for the attendance web server
///
/// # Arguments
/// * `[bind_addr] [latitude] [longitude] [radius] [users.json]` - all optional,
///   falling back to `ATTENDANCE_*` environment variables and then defaults
///
/// # Returns
/// * `Result<(), Box<dyn std::error::Error>>` - Success or error object
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env()?;
    app::run(config).await
}
