use std::env;
use std::str::FromStr;

use chrono::NaiveTime;
use tracing::warn;

pub const DEFAULT_WORK_START: &str = "09:00";
pub const DEFAULT_WORK_END: &str = "17:00";
pub const DEFAULT_SLOT_DURATION_MINUTES: i64 = 30;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
    pub slot_duration_minutes: i64,
    /// Offset of the clinic's wall clock from UTC. Working hours and
    /// "appointments on date X" are both interpreted in this offset.
    pub clinic_utc_offset_minutes: i32,
    pub sms_sender: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            work_start: clock_from_env("WORK_START", DEFAULT_WORK_START),
            work_end: clock_from_env("WORK_END", DEFAULT_WORK_END),
            slot_duration_minutes: parse_from_env("SLOT_DURATION_MINUTES", DEFAULT_SLOT_DURATION_MINUTES),
            clinic_utc_offset_minutes: parse_from_env("CLINIC_UTC_OFFSET_MINUTES", 0),
            sms_sender: env::var("SMS_SENDER")
                .unwrap_or_else(|_| "DENTAL".to_string()),
            server_port: parse_from_env("SERVER_PORT", 3000),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }

    /// Configuration pointing at a given store URL with the default working day.
    pub fn with_supabase(url: &str, anon_key: &str, jwt_secret: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            supabase_anon_key: anon_key.to_string(),
            supabase_jwt_secret: jwt_secret.to_string(),
            work_start: default_clock(DEFAULT_WORK_START),
            work_end: default_clock(DEFAULT_WORK_END),
            slot_duration_minutes: DEFAULT_SLOT_DURATION_MINUTES,
            clinic_utc_offset_minutes: 0,
            sms_sender: "DENTAL".to_string(),
            server_port: 3000,
        }
    }
}

fn default_clock(value: &str) -> NaiveTime {
    NaiveTime::parse_from_str(value, "%H:%M").unwrap_or(NaiveTime::MIN)
}

fn clock_from_env(key: &str, default: &str) -> NaiveTime {
    match env::var(key) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M").unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default_clock(default)
        }),
        Err(_) => default_clock(default),
    }
}

fn parse_from_env<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}
