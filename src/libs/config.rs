//! Persistent application configuration.
//!
//! Stored as pretty-printed JSON in `config.json` inside the platform data
//! directory. Every module is optional and omitted from the file until it is
//! configured through `jira-kpi init`; a missing file is the default
//! configuration.
//!
//! ```json
//! {
//!   "jira": { "login": "jdoe", "api_url": "https://jira.example.com" },
//!   "github": { "access_token": "", "api_url": "https://api.github.com", "max_retries": 3, "cool_down_secs": 60 },
//!   "report": { "jql": "project = KPI", "max_results": 900, "developers": ["Jane Doe"], "bsas": [], "enrich_commits": true, "format": "csv" },
//!   "calendar": { "working_days": ["Mon", "Tue", "Wed", "Thu", "Fri"], "day_start": "08:00", "day_end": "18:00", "timezone": "UTC" }
//! }
//! ```

use super::business_time::CalendarConfig;
use super::data_storage::DataStorage;
use super::export::ExportFormat;
use super::history::Identities;
use crate::api::{GitHubConfig, JiraConfig};
use crate::libs::messages::Message;
use crate::{msg_error_anyhow, msg_print};
use anyhow::{Context, Result};
use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_MAX_RESULTS: u32 = 900;

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

#[derive(Debug, Clone)]
pub struct ConfigModule {
    pub key: String,
    pub name: String,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReportConfig {
    #[serde(default)]
    pub jql: String,

    #[serde(default = "default_max_results")]
    pub max_results: u32,

    /// Display names recognized as developers.
    #[serde(default)]
    pub developers: Vec<String>,

    /// Display names recognized as business analysts.
    #[serde(default)]
    pub bsas: Vec<String>,

    #[serde(default)]
    pub enrich_commits: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    #[serde(default)]
    pub format: ExportFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            jql: String::new(),
            max_results: DEFAULT_MAX_RESULTS,
            developers: Vec::new(),
            bsas: Vec::new(),
            enrich_commits: false,
            output_path: None,
            format: ExportFormat::default(),
        }
    }
}

impl ReportConfig {
    pub fn module() -> ConfigModule {
        ConfigModule {
            key: "report".to_string(),
            name: "Report".to_string(),
        }
    }

    pub fn identities(&self) -> Identities {
        Identities::new(self.developers.clone(), self.bsas.clone())
    }

    pub fn init(config: &Option<Self>) -> Result<Self> {
        let config = config.clone().unwrap_or_default();
        let theme = ColorfulTheme::default();

        msg_print!(Message::ConfigModuleReport);

        let jql = Input::with_theme(&theme)
            .with_prompt("Default JQL query")
            .default(config.jql)
            .interact_text()?;
        let max_results = Input::with_theme(&theme)
            .with_prompt("Maximum issues per run")
            .default(config.max_results)
            .interact_text()?;
        let developers: String = Input::with_theme(&theme)
            .with_prompt("Developers (comma-separated display names)")
            .default(config.developers.join(", "))
            .allow_empty(true)
            .interact_text()?;
        let bsas: String = Input::with_theme(&theme)
            .with_prompt("Business analysts (comma-separated display names)")
            .default(config.bsas.join(", "))
            .allow_empty(true)
            .interact_text()?;
        let enrich_commits = Confirm::with_theme(&theme)
            .with_prompt("Look up GitHub commits for each issue?")
            .default(config.enrich_commits)
            .interact()?;

        Ok(Self {
            jql,
            max_results,
            developers: split_names(&developers),
            bsas: split_names(&bsas),
            enrich_commits,
            output_path: config.output_path,
            format: config.format,
        })
    }
}

fn split_names(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|name| !name.is_empty()).map(str::to_string).collect()
}

fn calendar_module() -> ConfigModule {
    ConfigModule {
        key: "calendar".to_string(),
        name: "Work calendar".to_string(),
    }
}

fn init_calendar(config: &Option<CalendarConfig>) -> Result<CalendarConfig> {
    let config = config.clone().unwrap_or_default();
    let theme = ColorfulTheme::default();

    msg_print!(Message::ConfigModuleCalendar);

    let checked: Vec<bool> = WEEKDAYS.iter().map(|day| config.working_days.contains(day)).collect();
    let selected = MultiSelect::with_theme(&theme)
        .with_prompt("Working days")
        .items(&WEEKDAYS.iter().map(|day| day.to_string()).collect::<Vec<_>>())
        .defaults(&checked)
        .interact()?;

    let day_start: String = Input::with_theme(&theme)
        .with_prompt("Working day starts at (HH:MM)")
        .default(config.day_start.format("%H:%M").to_string())
        .validate_with(|raw: &String| parse_hhmm(raw).map(|_| ()))
        .interact_text()?;
    let day_end: String = Input::with_theme(&theme)
        .with_prompt("Working day ends at (HH:MM)")
        .default(config.day_end.format("%H:%M").to_string())
        .validate_with(|raw: &String| parse_hhmm(raw).map(|_| ()))
        .interact_text()?;
    let timezone: String = Input::with_theme(&theme)
        .with_prompt("Timezone (IANA name)")
        .default(config.timezone)
        .validate_with(|raw: &String| raw.parse::<Tz>().map(|_| ()).map_err(|_| format!("unknown timezone '{}'", raw)))
        .interact_text()?;

    let calendar = CalendarConfig {
        working_days: selected.into_iter().map(|index| WEEKDAYS[index]).collect(),
        day_start: parse_hhmm(&day_start).map_err(anyhow::Error::msg)?,
        day_end: parse_hhmm(&day_end).map_err(anyhow::Error::msg)?,
        timezone,
    };
    calendar
        .build()
        .map_err(|e| msg_error_anyhow!(Message::InvalidCalendar(e.to_string())))?;
    Ok(calendar)
}

fn parse_hhmm(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| format!("'{}': {}", raw, e))
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GitHubConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar: Option<CalendarConfig>,
}

impl Config {
    pub fn path() -> Result<PathBuf> {
        Ok(DataStorage::new().get_path(CONFIG_FILE_NAME)?)
    }

    pub fn read() -> Result<Config> {
        Self::read_from(&Self::path()?)
    }

    pub fn read_from(path: &Path) -> Result<Config> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let config_str = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&config_str).map_err(|e| msg_error_anyhow!(Message::ConfigParseError(e.to_string())))
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config_file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(&config_file, &self)?;
        Ok(())
    }

    /// Interactive wizard over the selected modules. Current values are
    /// offered as defaults.
    pub fn init() -> Result<Self> {
        let mut config = match Self::read() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "existing configuration unreadable, starting from defaults");
                Config::default()
            }
        };

        let modules = [JiraConfig::module(), GitHubConfig::module(), ReportConfig::module(), calendar_module()];

        let selected = MultiSelect::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::SelectConfigModules.to_string())
            .items(&modules.iter().map(|module| &module.name).collect::<Vec<_>>())
            .interact()?;

        for &selection in &selected {
            match modules[selection].key.as_str() {
                "jira" => config.jira = Some(JiraConfig::init(&config.jira)?),
                "github" => config.github = Some(GitHubConfig::init(&config.github)?),
                "report" => config.report = Some(ReportConfig::init(&config.report)?),
                "calendar" => config.calendar = Some(init_calendar(&config.calendar)?),
                _ => {}
            }
        }

        Ok(config)
    }
}
