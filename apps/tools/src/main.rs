use anyhow::Result;
use cities_core::CITIES_COLLECTION;
use clap::{Parser, Subcommand};
use shared::protocol::CitiesDocument;
use storage::DocumentStore;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/cities.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every collection in the store.
    Collections,
    /// Print the document keys in a collection.
    ListDocs { collection: String },
    /// Print one document's body.
    ShowDoc { collection: String, key: String },
    /// Seed an empty cities document for a user.
    InitUser { user: String },
    /// Remove a document outright.
    DeleteDoc { collection: String, key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let store = DocumentStore::new(&cli.database_url).await?;

    match cli.command {
        Command::Collections => {
            for collection in store.list_collections().await? {
                println!("{collection}");
            }
        }
        Command::ListDocs { collection } => {
            for document in store.list_documents(&collection).await? {
                println!("{}\t{}", document.key, document.updated_at);
            }
        }
        Command::ShowDoc { collection, key } => {
            match store.read_document(&collection, &key).await? {
                Some(body) => println!("{}", serde_json::to_string_pretty(&body)?),
                None => println!("no document '{collection}/{key}'"),
            }
        }
        Command::InitUser { user } => {
            let body = serde_json::to_value(CitiesDocument::default())?;
            store.create_document(CITIES_COLLECTION, &user, &body).await?;
            println!("initialized cities document for user {user}");
        }
        Command::DeleteDoc { collection, key } => {
            if store.delete_document(&collection, &key).await? {
                println!("deleted document '{collection}/{key}'");
            } else {
                println!("no document '{collection}/{key}'");
            }
        }
    }

    Ok(())
}
