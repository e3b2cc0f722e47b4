use anyhow::{Context, Result, anyhow, bail};

use scout_xi::app::GUEST_USER_ID;
use scout_xi::config::Config;
use scout_xi::http_client::http_client;
use scout_xi::local_store::SqliteStore;
use scout_xi::logging;
use scout_xi::model::Player;
use scout_xi::remote::ApiClient;
use scout_xi::search::{ProfileUrlPattern, SearchResolver};
use scout_xi::session::Session;
use scout_xi::sync::{SyncCoordinator, Synced};

const USAGE: &str = "usage: scout_cli <command>

commands:
  login --email <email> --password <password>
  register --email <email> --password <password> --username <name>
  logout
  whoami
  search <name or profile link>
  similar <player id>
  favorites
  formation
  sync";

fn main() -> Result<()> {
    let config = Config::load();
    logging::init_stderr_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };
    let rest = &args[1..];

    let db_path = config
        .db_path
        .clone()
        .context("unable to resolve local store path")?;
    let store = SqliteStore::open(&db_path).context("open local store")?;
    let api = ApiClient::new(http_client(&config)?, config.api_base.clone());
    let session = Session::new(&store, &api);
    let sync = SyncCoordinator::new(&store, &api, &session);
    let resolver = SearchResolver::new(&api, ProfileUrlPattern::new(&config.profile_domain));

    match command.as_str() {
        "login" => {
            let email = flag_value(rest, "--email").context("--email is required")?;
            let password = flag_value(rest, "--password").context("--password is required")?;
            let user = session.login(&email, &password)?;
            println!("Signed in as {}", user.display_name());
        }
        "register" => {
            let email = flag_value(rest, "--email").context("--email is required")?;
            let password = flag_value(rest, "--password").context("--password is required")?;
            let username = flag_value(rest, "--username").context("--username is required")?;
            let user = session.register(&email, &password, &username)?;
            println!("Registered {}", user.display_name());
        }
        "logout" => {
            session.logout();
            println!("Signed out");
        }
        "whoami" => match session.current_user() {
            Ok(user) => println!("{} <{}> id={}", user.display_name(), user.email, user.id),
            Err(err) => println!("{err}"),
        },
        "search" => {
            let query = rest.join(" ");
            if query.trim().is_empty() {
                bail!("search needs a query");
            }
            print_players(&resolver.search(&query)?);
        }
        "similar" => {
            let id = rest.first().ok_or_else(|| anyhow!("similar needs a player id"))?;
            print_players(&resolver.similar(id)?);
        }
        "favorites" => {
            let user_id = user_id(&session);
            let favorites = sync.favorites(&user_id);
            report_source(&favorites);
            print_players(favorites.value());
        }
        "formation" => {
            let user_id = user_id(&session);
            let formation = sync.formation(&user_id);
            report_source(&formation);
            for (id, at) in &formation.value().players {
                println!("{id:<12} x={:>6.1} y={:>6.1}", at.x, at.y);
            }
        }
        "sync" => {
            let user_id = user_id(&session);
            let (favorites, formation) = sync.sync_all(&user_id);
            report_source(&favorites);
            report_source(&formation);
            println!(
                "favorites: {} | placements: {}",
                favorites.value().len(),
                formation.value().players.len()
            );
        }
        other => {
            println!("unknown command: {other}\n\n{USAGE}");
        }
    }

    Ok(())
}

fn user_id(session: &Session<'_>) -> String {
    session
        .current_user()
        .map(|u| u.id)
        .unwrap_or_else(|_| GUEST_USER_ID.to_string())
}

fn report_source<T>(outcome: &Synced<T>) {
    if let Some(err) = outcome.error() {
        eprintln!("(offline copy: {err})");
    }
}

fn print_players(players: &[Player]) {
    if players.is_empty() {
        println!("no players");
        return;
    }
    for p in players {
        let age = p.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<10} {:<26} {:<20} {:>3} {:<16} {}",
            p.id, p.name, p.position, age, p.nationality, p.value
        );
    }
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}
