use dotenvy::dotenv;
use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<Config> = Lazy::new(|| {
    dotenv().ok(); // Load .env file if present
    Config {
        supabase_url: get_env("SUPABASE_URL"),
        supabase_anon_key: get_env("SUPABASE_ANON_KEY"),
        static_dir: get_env_or_default("STATIC_DIR", "static"),
    }
});

pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub static_dir: String,
}

fn get_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("Missing required environment variable: {key}"))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
