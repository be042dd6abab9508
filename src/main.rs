mod assignment;
mod availability;
mod booking;
mod config;
mod data;
mod desk;
mod error;
mod groups;
mod planner;
mod server;
mod store;
mod transfer;

#[cfg(test)]
mod fixtures;

use config::Config;
use data::SchoolData;
use error::DeskError;
use log::{error, info};

fn load_school(config: &Config) -> Result<SchoolData, DeskError> {
    let Some(path) = &config.school_file else {
        return Ok(SchoolData::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| DeskError::SchoolFile(format!("{}: {}", path.display(), e)))?;
    let school: SchoolData = serde_json::from_str(&raw)
        .map_err(|e| DeskError::SchoolFile(format!("{}: {}", path.display(), e)))?;
    info!(
        "Loaded {} teachers and {} classes from {}.",
        school.teachers.len(),
        school.classes.len(),
        path.display()
    );
    Ok(school)
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(&config.log_filter),
    )
    .init();

    let school = match load_school(&config) {
        Ok(school) => school,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server::run_server(&config, school).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
