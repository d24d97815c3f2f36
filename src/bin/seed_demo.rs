use std::error::Error;
use std::process::exit;

use clap::Parser;
use rusqlite::Connection;

use creator_cfo::{
    Clock, DEFAULT_CURRENCY, connect_source, create_user, delete_user_by_email, get_user_by_email,
    initialize_db, mock_provider::RandomTransactionGenerator,
};

/// The email address of the demo account.
const DEMO_EMAIL: &str = "demo@creatorcfo.com";

/// A utility for seeding the creator_cfo database with a demo account.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database. It is created if it does not exist.
    #[arg(long)]
    db_path: String,

    /// Delete the demo user, along with their sources and transactions, before seeding.
    #[arg(long)]
    reset: bool,

    /// A provider to connect for the demo user, e.g. "stripe". May be repeated.
    #[arg(long)]
    provider: Vec<String>,

    /// The canonical name of the timezone transactions are dated in.
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,
}

/// Create the demo user and optionally connect mock sources for them.
fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let now = match Clock::Local(args.timezone.clone()).now() {
        Ok(now) => now,
        Err(error) => {
            eprintln!("{error}");
            exit(1);
        }
    };

    println!("Opening database at {:#?}", args.db_path);
    let conn = Connection::open(&args.db_path)?;
    initialize_db(&conn)?;

    if args.reset && delete_user_by_email(DEMO_EMAIL, &conn)? {
        println!("Deleted the existing demo user and their data.");
    }

    let user = match get_user_by_email(DEMO_EMAIL, &conn) {
        Ok(user) => {
            println!("Demo user already exists with ID {}.", user.id);
            user
        }
        Err(creator_cfo::Error::NotFound) => {
            let user = create_user(DEMO_EMAIL, DEFAULT_CURRENCY, &conn)?;
            println!("Created demo user {} with ID {}.", user.email, user.id);
            user
        }
        Err(error) => return Err(error.into()),
    };

    let generator = RandomTransactionGenerator::new();
    for provider in &args.provider {
        let (source, imported) =
            connect_source(user.id, Some(provider.as_str()), now, &generator, &conn)?;
        println!("Connected {} and imported {imported} transactions.", source.provider);
    }

    println!("Success!");

    Ok(())
}
