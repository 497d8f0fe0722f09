use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use gegenpress_companion::app_state::{AppStateStore, InitialRoute};
use gegenpress_companion::config::AppConfig;
use gegenpress_companion::league_api::CompanionApi;
use gegenpress_companion::refresh::{GameweekService, LifecycleEvent, RefreshOutcome};
use gegenpress_companion::schedule_fetch::HttpScheduleFetcher;
use gegenpress_companion::store::open_store;
use gegenpress_companion::telemetry::{AppEvent, Telemetry, telemetry_from_config};

const USAGE: &str = "\
usage: gegenpress <command> [args]

commands:
  status                     show selected league/manager and current gameweek
  refresh                    refresh the gameweek schedule if needed
  current                    print the current gameweek
  league <id>                look up a league (5-7 digits) and follow it
  select <manager>           pick a manager (id or name) from the selected league
  leagues                    list followed leagues
  use <id>                   switch to a followed league
  remove <id>                stop following a league
  images [--category <c>]    list preview images for the current gameweek
  download [--category <c>] [--dir <path>]
                             download images for sharing";

struct App {
    config: AppConfig,
    state: AppStateStore,
    gameweeks: GameweekService,
    api: CompanionApi,
    telemetry: Arc<dyn Telemetry>,
    start_refresh: RefreshOutcome,
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_tracing();

    let config = AppConfig::from_env();
    let store = open_store(&config)?;
    let fetcher = Arc::new(HttpScheduleFetcher::new(&config));
    let gameweeks = GameweekService::new(store.clone(), fetcher);
    let start_refresh = gameweeks.on_lifecycle(LifecycleEvent::Start);

    let app = App {
        state: AppStateStore::new(store),
        api: CompanionApi::new(&config),
        telemetry: telemetry_from_config(&config),
        gameweeks,
        start_refresh,
        config,
    };

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(cmd) = args.first() else {
        println!("{USAGE}");
        return Ok(());
    };
    let result = run(&app, cmd, &args[1..]);
    app.telemetry.flush();
    result
}

fn run(app: &App, cmd: &str, rest: &[String]) -> Result<()> {
    match cmd {
        "status" => app.status(),
        "refresh" => {
            println!("Refresh: {:?}", app.start_refresh);
            Ok(())
        }
        "current" => {
            match app.gameweeks.current_gameweek() {
                Some(gw) => println!("Gameweek {} (since {})", gw.id, gw.switch_time.to_rfc3339()),
                None => println!("Gameweek data is still loading."),
            }
            Ok(())
        }
        "league" => app.add_league(positional(rest).context("missing league id")?),
        "select" => app.select_manager(&rest.join(" ")),
        "leagues" => app.list_leagues(),
        "use" => {
            let entry = app
                .state
                .switch_league(positional(rest).context("missing league id")?)?;
            println!("Selected {} ({})", entry.league_name, entry.league_id);
            Ok(())
        }
        "remove" => {
            let id = positional(rest).context("missing league id")?;
            if app.state.remove_league(id)? {
                println!("Removed league {id}");
            } else {
                println!("League {id} was not in the list");
            }
            Ok(())
        }
        "images" => app.show_images(flag_value(rest, "--category")),
        "download" => app.download(
            flag_value(rest, "--category"),
            flag_value(rest, "--dir").map(PathBuf::from),
        ),
        "help" | "--help" | "-h" => {
            println!("{USAGE}");
            Ok(())
        }
        other => bail!("unknown command {other:?}\n\n{USAGE}"),
    }
}

impl App {
    fn status(&self) -> Result<()> {
        match self.state.initial_route() {
            InitialRoute::LeagueInput => println!("No league selected. Run `gegenpress league <id>`."),
            InitialRoute::Home => {
                if let Some(user) = self.state.user_league_data()? {
                    println!("{} / {}", user.league_name, user.manager.player_name);
                }
            }
        }
        match self.gameweeks.current_gameweek() {
            Some(gw) => println!("Gameweek {}", gw.id),
            None => println!("Gameweek: loading..."),
        }
        Ok(())
    }

    fn add_league(&self, raw_id: &str) -> Result<()> {
        let lookup = self.api.fetch_league(raw_id)?;
        let entry = self.state.add_league(&lookup)?;
        self.telemetry.record(AppEvent::LeagueAdded {
            league_id: entry.league_id.clone(),
        });
        println!("{} ({})", entry.league_name, entry.league_id);
        for manager in &entry.managers {
            println!("  {:>10}  {}", manager.id, manager.player_name);
        }
        println!("Pick your manager with `gegenpress select <name or id>`.");
        Ok(())
    }

    fn select_manager(&self, who: &str) -> Result<()> {
        if who.trim().is_empty() {
            bail!("please select a manager before proceeding");
        }
        let user = self.state.select_manager(who)?;
        self.telemetry.record(AppEvent::ManagerSelected {
            league_id: user.league_id.clone(),
            manager_id: user.manager.id.clone(),
        });
        println!("{} / {}", user.league_name, user.manager.player_name);
        Ok(())
    }

    fn list_leagues(&self) -> Result<()> {
        let selected = self.state.selected_league()?.map(|s| s.league_id);
        let leagues = self.state.leagues()?;
        if leagues.is_empty() {
            println!("No leagues yet.");
        }
        for league in leagues {
            let marker = if selected.as_deref() == Some(league.league_id.as_str()) {
                "*"
            } else {
                " "
            };
            let manager = league
                .manager
                .as_ref()
                .map(|m| m.player_name.as_str())
                .unwrap_or("-");
            println!("{marker} {:<8} {:<32} {manager}", league.league_id, league.league_name);
        }
        Ok(())
    }

    fn categories(&self, only: Option<&str>) -> Vec<String> {
        match only {
            Some(cat) => vec![cat.trim().to_lowercase()],
            None => self.config.categories.clone(),
        }
    }

    fn show_images(&self, only: Option<&str>) -> Result<()> {
        let user = self
            .state
            .user_league_data()?
            .context("please select a league and manager first")?;
        let Some(gw) = self.gameweeks.current_gameweek() else {
            println!("Gameweek data is still loading.");
            return Ok(());
        };

        let tabs = self
            .api
            .fetch_tabs(&user.league_id, gw.id, &self.categories(only))
            .context("failed to fetch images")?;
        println!("{} / Gameweek {}", user.league_name, gw.id);
        for tab in &tabs {
            self.telemetry.record(AppEvent::ImagesViewed {
                league_id: user.league_id.clone(),
                gameweek: gw.id,
                category: tab.category.clone(),
            });
            println!("[{}]", tab.title());
            if let Some(msg) = tab.placeholder() {
                println!("  {msg}");
                continue;
            }
            for image in &tab.images {
                println!("  {}", self.api.image_url(image));
            }
        }
        Ok(())
    }

    fn download(&self, only: Option<&str>, dir: Option<PathBuf>) -> Result<()> {
        let user = self
            .state
            .user_league_data()?
            .context("please select a league and manager first")?;
        let Some(gw) = self.gameweeks.current_gameweek() else {
            println!("Gameweek data is still loading.");
            return Ok(());
        };
        let category = self
            .categories(only)
            .into_iter()
            .next()
            .context("no image category configured")?;

        let images = self.api.fetch_images(&user.league_id, gw.id, &category)?;
        if images.is_empty() {
            println!("There are no images to share.");
            return Ok(());
        }
        let dir = dir.unwrap_or_else(|| PathBuf::from(format!("gegenpress-gw{}", gw.id)));
        let paths = self
            .api
            .download_images(&images, &dir)
            .context("failed to download images")?;
        self.telemetry.record(AppEvent::ImagesShared {
            league_id: user.league_id.clone(),
            gameweek: gw.id,
            count: paths.len(),
        });
        for path in paths {
            println!("{}", path.display());
        }
        Ok(())
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gegenpress_companion=info,gegenpress=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn positional(args: &[String]) -> Option<&str> {
    args.iter()
        .map(String::as_str)
        .find(|arg| !arg.starts_with("--"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(flag).and_then(|v| v.strip_prefix('=')) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed);
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.as_str());
            }
        }
    }
    None
}
