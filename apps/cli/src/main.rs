use std::sync::Arc;

use anyhow::{bail, Result};
use cities_core::{
    CitiesController, CitiesEvent, CityDirectory, DocumentCityDirectory, RestCityDirectory,
};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use shared::domain::{CityDraft, CityId, UserId};
use storage::DocumentStore;
use tokio::sync::broadcast;

mod config;

use config::{load_settings, prepare_database_url};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long)]
    user: String,
    #[arg(long)]
    backend: Option<String>,
    #[arg(long)]
    rest_url: Option<String>,
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    List,
    Show {
        id: String,
    },
    Add {
        name: String,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    Remove {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("warn").init();
    let cli = Cli::parse();

    let mut settings = load_settings();
    if let Some(backend) = cli.backend {
        settings.backend = backend;
    }
    if let Some(rest_url) = cli.rest_url {
        settings.rest_url = rest_url;
    }
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    let directory: Arc<dyn CityDirectory> = match settings.backend.as_str() {
        "document" => {
            let database_url = prepare_database_url(&settings.database_url);
            let store = DocumentStore::new(&database_url).await?;
            Arc::new(DocumentCityDirectory::new(store))
        }
        "rest" => Arc::new(RestCityDirectory::new(settings.rest_url.clone())),
        other => bail!("unknown backend '{other}' (expected 'document' or 'rest')"),
    };

    let controller = CitiesController::new_with_directory(directory);
    let mut events = controller.subscribe_events();

    controller
        .set_active_user(Some(UserId::new(cli.user.clone())))
        .await;
    if let CitiesEvent::Rejected(message) = wait_until_settled(&mut events).await? {
        bail!("{message}");
    }

    match cli.command {
        Command::List => {
            let state = controller.state().await;
            if state.cities.is_empty() {
                println!("no cities logged for user {}", cli.user);
            }
            for city in &state.cities {
                println!("{}", serde_json::to_string(city)?);
            }
        }
        Command::Show { id } => {
            controller.get_city(parse_city_id(&id)).await;
            if let Some(CitiesEvent::Rejected(message)) = last_terminal_event(&mut events) {
                bail!("{message}");
            }
            let state = controller.state().await;
            match state.current_city {
                Some(city) => println!("{}", serde_json::to_string(&city)?),
                None => bail!("no city with id {id}"),
            }
        }
        Command::Add {
            name,
            country,
            notes,
        } => {
            let mut fields = Map::new();
            fields.insert("cityName".to_string(), Value::String(name));
            if let Some(country) = country {
                fields.insert("country".to_string(), Value::String(country));
            }
            if let Some(notes) = notes {
                fields.insert("notes".to_string(), Value::String(notes));
            }
            controller.create_city(CityDraft { fields }).await;
            if let Some(CitiesEvent::Rejected(message)) = last_terminal_event(&mut events) {
                bail!("{message}");
            }
            let state = controller.state().await;
            if let Some(city) = state.current_city {
                println!("added {}", serde_json::to_string(&city)?);
            }
        }
        Command::Remove { id } => {
            controller.delete_city(parse_city_id(&id)).await;
            if let Some(CitiesEvent::Rejected(message)) = last_terminal_event(&mut events) {
                bail!("{message}");
            }
            println!("removed city {id}");
        }
    }

    Ok(())
}

/// Numeric ids are how the REST backend counts records; everything else is
/// passed through as text.
fn parse_city_id(raw: &str) -> CityId {
    match raw.parse::<i64>() {
        Ok(number) => CityId::Number(number),
        Err(_) => CityId::from(raw),
    }
}

/// Drains events already produced by a completed operation and returns the
/// last terminal one.
fn last_terminal_event(rx: &mut broadcast::Receiver<CitiesEvent>) -> Option<CitiesEvent> {
    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        if !matches!(event, CitiesEvent::Loading) {
            last = Some(event);
        }
    }
    last
}

/// Waits for the initial load to reach a terminal event.
async fn wait_until_settled(rx: &mut broadcast::Receiver<CitiesEvent>) -> Result<CitiesEvent> {
    loop {
        match rx.recv().await {
            Ok(CitiesEvent::Loading) => continue,
            Ok(event) => return Ok(event),
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => bail!("controller event stream closed"),
        }
    }
}
