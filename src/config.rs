use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub log_filter: String,
    pub school_file: Option<PathBuf>,
    pub solver_threads: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            log_filter: "info".to_string(),
            school_file: None,
            solver_threads: 1,
        }
    }
}

fn env_string(name: &str, default: String) -> String {
    env::var(name).ok().filter(|v| !v.trim().is_empty()).unwrap_or(default)
}

fn env_i32(name: &str, default: i32) -> i32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<i32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: env_string("SUBSTITUTE_BIND", defaults.bind_addr),
            log_filter: env_string("SUBSTITUTE_LOG", defaults.log_filter),
            school_file: env::var("SUBSTITUTE_SCHOOL_FILE").ok().map(PathBuf::from),
            solver_threads: env_i32("SUBSTITUTE_SOLVER_THREADS", defaults.solver_threads),
        }
    }
}
