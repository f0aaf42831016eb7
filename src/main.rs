use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cupquiz::config::AppConfig;
use cupquiz::questions::QuestionBank;
use cupquiz::session::SessionClient;
use cupquiz::store::{MemoryStore, SharedStore};
use cupquiz::types::{Category, CUPS_PER_TEAM, CUP_COUNT};

const HELP: &str = "\
Befehle:
  join <name>       Spiel beitreten
  leave <name>      Spieler entfernen
  category [name]   Kategorie wählen (leer = alle)
  teams             Teams generieren
  hit <1-20>        Becher treffen
  answer <text>     Antwort abschicken
  reset             Becher zurücksetzen
  state             Spielstand anzeigen
  stats             Statistiken anzeigen
  quit              Beenden";

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist, only log if it's a different issue
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cupquiz=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting BeerPong Quiz...");

    let config = AppConfig::from_env();

    let bank = match &config.questions_url {
        Some(url) => QuestionBank::fetch(url).await,
        None => QuestionBank::from_path(&config.questions_path),
    }
    .unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to load questions: {}. Every cup hit will be a no-op.",
            e
        );
        QuestionBank::default()
    });

    let store: Arc<dyn SharedStore> = Arc::new(MemoryStore::new());
    let client = SessionClient::connect(
        store,
        config.session_id.clone(),
        bank,
        config.name_file.clone(),
    )
    .await
    .expect("Failed to connect to session");

    println!("BeerPong Quiz — Session '{}'", config.session_id);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        let (command, rest) = match line.split_once(' ') {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "join" => client.join(rest).await,
            "leave" => client.remove_player(rest).await,
            "category" => {
                if rest.is_empty() {
                    client.select_category(None).await;
                } else {
                    match Category::from_label(rest) {
                        Some(category) => client.select_category(Some(category)).await,
                        None => {
                            println!("Unbekannte Kategorie. Bekannt:");
                            for category in Category::ALL {
                                println!("  {}", category);
                            }
                        }
                    }
                }
            }
            "teams" => client.generate_teams().await,
            "hit" => match rest.parse::<usize>() {
                Ok(cell) if (1..=CUP_COUNT).contains(&cell) => client.hit_cup(cell - 1).await,
                _ => println!("Erwartet: hit <1-{}>", CUP_COUNT),
            },
            "answer" => client.submit_answer(rest).await,
            "reset" => client.reset_game().await,
            "state" => {}
            "stats" => {
                println!("Statistiken");
                for name in client.roster().await {
                    let stats = client.stats(&name).await;
                    println!(
                        "  {}: ✅ {} ❌ {} 🏆 {}",
                        name, stats.correct, stats.wrong, stats.games_won
                    );
                }
                continue;
            }
            "quit" | "exit" => break,
            "help" => {
                println!("{}", HELP);
                continue;
            }
            _ => {
                println!("Unbekannter Befehl, 'help' zeigt alle Befehle.");
                continue;
            }
        }

        // Let the watcher tasks catch up with our own writes before rendering
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        print_state(&client).await;
    }

    client.shutdown().await;
}

async fn print_state(client: &SessionClient) {
    for notification in client.notifications().await {
        println!("[{}]", notification.message);
    }

    let roster = client.roster().await;
    let current = client.current_player().await;
    let names: Vec<String> = roster
        .iter()
        .map(|name| {
            if Some(name) == current.as_ref() {
                format!("[{}]", name)
            } else {
                name.clone()
            }
        })
        .collect();
    println!("Spieler: {}", names.join(" "));

    if let Some(teams) = client.teams().await {
        println!(
            "Team 1: {} | Team 2: {}",
            teams.first.join(", "),
            teams.second.join(", ")
        );
    }

    let cups = client.cups().await;
    for (row, half) in cups.chunks(CUPS_PER_TEAM).enumerate() {
        let cells: Vec<String> = half
            .iter()
            .enumerate()
            .map(|(i, active)| {
                let number = row * CUPS_PER_TEAM + i + 1;
                if *active {
                    format!("{:2}", number)
                } else {
                    " ·".to_string()
                }
            })
            .collect();
        println!("Team {}: {}", row + 1, cells.join(" "));
    }

    if let Some(active) = client.active_question().await {
        println!("Frage (Becher {}): {}", active.cup_index + 1, active.question.question);
    }
    if let Some(feedback) = client.feedback().await {
        println!("{}", feedback);
    }
}
