use crate::config;
use crate::fetchers::{CanvasClient, ImapMailFetcher, OpenMeteoClient, RssNewsFetcher};
use crate::services::{DashboardService, FreshnessCache};
use crate::types::{CanvasData, MailSummary, NewsDigest, Snapshot, WeatherReport};
use clap::{Parser, Subcommand};

/// Personal morning dashboard: deadlines, weather, news, and unread mail
#[derive(Parser)]
#[command(name = "daybrief")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Refresh every enabled source (default)
    Snapshot {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show upcoming assignments and recent announcements
    Canvas {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show current weather conditions
    Weather {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show latest headlines
    News {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show unread mail summaries
    Mail {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the config file location
    Config,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        // no subcommand means a full snapshot
        let command = self.command.unwrap_or(Commands::Snapshot { json: false });

        if matches!(command, Commands::Config) {
            println!("{}", config::default_config_path()?.display());
            return Ok(());
        }

        let path = config::default_config_path()?;
        let user_config = config::load_or_init(&path)?;

        let cache = FreshnessCache::default();
        let canvas = CanvasClient::new()?;
        let weather = OpenMeteoClient::new()?;
        let news = RssNewsFetcher::new()?;
        let mailbox = ImapMailFetcher::new();
        let service = DashboardService::new(&cache, &canvas, &weather, &news, &mailbox);

        match command {
            Commands::Config => {}
            Commands::Snapshot { json } => {
                let snapshot = service.snapshot(&user_config);
                print_snapshot(&snapshot, json)?;
            }
            Commands::Canvas { json } => {
                let data = service
                    .canvas_data(&user_config.canvas.token, &user_config.canvas.course_aliases);
                if json {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                } else {
                    print_canvas(&data);
                }
            }
            Commands::Weather { json } => {
                let report = service.weather(&user_config.location);
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    print_weather(&report);
                }
            }
            Commands::News { json } => {
                let digest = service.news();
                if json {
                    println!("{}", serde_json::to_string_pretty(&digest)?);
                } else {
                    print_news(&digest);
                }
            }
            Commands::Mail { json } => {
                let summaries = service.unread_mail(&user_config.emails);
                if json {
                    println!("{}", serde_json::to_string_pretty(&summaries)?);
                } else {
                    print_mail(&summaries);
                }
            }
        }
        Ok(())
    }
}

fn print_snapshot(snapshot: &Snapshot, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    print_weather(&snapshot.weather);
    println!();
    print_canvas(&snapshot.canvas);
    println!();
    print_news(&snapshot.news);
    println!();
    print_mail(&snapshot.mail);
    Ok(())
}

fn print_canvas(data: &CanvasData) {
    if data.assignments.is_empty() && data.announcements.is_empty() {
        println!("No Canvas activity.");
        return;
    }
    if !data.assignments.is_empty() {
        println!("Assignments:");
        for assignment in &data.assignments {
            println!(
                "  [{}] {} (due {})",
                assignment.course,
                assignment.name,
                assignment.due_at.as_deref().unwrap_or("no due date")
            );
        }
    }
    if !data.announcements.is_empty() {
        println!("Announcements:");
        for announcement in &data.announcements {
            println!("  [{}] {}", announcement.course, announcement.title);
        }
    }
}

fn print_weather(report: &WeatherReport) {
    match report.temp {
        Some(temp) => println!(
            "Weather: {}°F, {} ({})",
            temp, report.condition, report.location
        ),
        None => println!("Weather: {}", report.condition),
    }
}

fn print_news(digest: &NewsDigest) {
    if digest.items.is_empty() {
        println!("No headlines.");
        return;
    }
    println!("Headlines:");
    for item in &digest.items {
        println!("  [{}] {}", item.source, item.title);
    }
}

fn print_mail(summaries: &[MailSummary]) {
    if summaries.is_empty() {
        println!("No unread mail.");
        return;
    }
    println!("Unread mail:");
    for summary in summaries {
        println!(
            "  [{}] {}: {}",
            summary.account, summary.sender, summary.subject
        );
    }
}
