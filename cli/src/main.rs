use std::cell::Cell;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use hypewall::api::ApiError;
use hypewall::command::{Command as WallCommand, Effect, handle};
use hypewall::config::{ConfigError, DEFAULT_API_BASE, parse_poll_interval};
use hypewall::entry::EntryPoint;
use hypewall::links::LinkKind;
use hypewall::model::{EntrySetup, WallModel};
use hypewall::render::{CommentCard, WallRender};
use hypewall::services::board::{self, WallError};
use hypewall::services::compose::{self, SubmitError};
use hypewall::services::poller::{CommentPoller, PollOutcome, run_poller};
use hypewall::theme::Aesthetic;

mod api;
mod store;

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

use api::ReqwestApi;
use store::FileTokenStore;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Wall(#[from] WallError),
    #[error("{0}")]
    Submit(#[from] SubmitError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Rejected(String),
    #[error("unknown aesthetic {0:?}; expected one of {1}")]
    UnknownAesthetic(String, String),
    #[error("nothing to open at {0:?}")]
    NothingToOpen(String),
    #[error("no config directory for the token file; pass --token-file or set HYPEWALL_TOKEN_FILE")]
    NoTokenPath,
    #[error("token store: {0}")]
    Store(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "hypewall", about = "Hype wall board client")]
struct Cli {
    #[arg(long, env = "HYPEWALL_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Origin used to build share links; defaults to the API base.
    #[arg(long, env = "HYPEWALL_ORIGIN")]
    origin: Option<String>,

    #[arg(long, env = "HYPEWALL_POLL_SECS")]
    poll_secs: Option<String>,

    #[arg(long, env = "HYPEWALL_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    #[arg(short, long, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a board and become its creator.
    Create {
        recipient_name: String,
        #[arg(long, default_value = "professional")]
        aesthetic: String,
    },
    /// Join a board by code as a contributor.
    Join { code: String },
    /// Open a board link (or join code) and show its details.
    Open { target: String },
    /// Post a message to a board.
    Post(PostArgs),
    /// Print the current wall.
    Comments { target: String },
    /// Print the creator share links.
    Links { target: String },
    /// Keep the wall on screen, refreshing on the poll interval.
    Watch {
        target: String,
        /// Stop after this many poll ticks.
        #[arg(long)]
        ticks: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct PostArgs {
    /// Board link or join code.
    target: String,
    message: String,
    #[arg(long, default_value = "")]
    author: String,
    /// Palette color; defaults to the first color of the board's palette.
    #[arg(long)]
    color: Option<String>,
}

struct CliContext {
    api: ReqwestApi,
    store: FileTokenStore,
    origin: String,
    poll_interval: Duration,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN })
        .init();

    let token_path = cli.token_file.or_else(store::default_path).ok_or(CliError::NoTokenPath)?;
    let api_base = cli.api_base.trim().trim_end_matches('/').to_owned();
    let ctx = CliContext {
        api: ReqwestApi::new(api_base.clone()),
        store: FileTokenStore::open(token_path)?,
        origin: cli.origin.unwrap_or(api_base),
        poll_interval: parse_poll_interval(cli.poll_secs.as_deref())?,
    };

    match cli.command {
        Command::Create { recipient_name, aesthetic } => run_create(&ctx, &recipient_name, &aesthetic).await,
        Command::Join { code } => run_join(&ctx, code).await,
        Command::Open { target } => {
            let (model, setup) = open_model(&ctx, &target).await?;
            print_setup(&model, &setup);
            Ok(())
        }
        Command::Post(args) => run_post(&ctx, args).await,
        Command::Comments { target } => run_comments(&ctx, &target).await,
        Command::Links { target } => run_links(&ctx, &target).await,
        Command::Watch { target, ticks } => run_watch(&ctx, &target, ticks).await,
    }
}

async fn run_create(ctx: &CliContext, recipient_name: &str, aesthetic: &str) -> Result<(), CliError> {
    let aesthetic = parse_aesthetic(aesthetic)?;
    let mut model = WallModel::new(ctx.origin.clone());
    handle(&mut model, WallCommand::SelectAesthetic(aesthetic));
    let effect = accept(handle(&mut model, WallCommand::CreateBoard { recipient_name: recipient_name.to_owned() }))?;
    let Effect::CreateBoard { aesthetic, recipient_name } = effect else {
        return Ok(());
    };
    let session = board::create_board(&ctx.api, &ctx.store, aesthetic, &recipient_name).await?;
    let setup = model.enter(session);
    print_setup(&model, &setup);
    Ok(())
}

async fn run_join(ctx: &CliContext, code: String) -> Result<(), CliError> {
    let mut model = WallModel::new(ctx.origin.clone());
    let Effect::JoinBoard { code } = accept(handle(&mut model, WallCommand::JoinBoard { code }))? else {
        return Ok(());
    };
    let session = board::join_board(&ctx.api, &code).await?;
    let setup = model.enter(session);
    print_setup(&model, &setup);
    Ok(())
}

async fn run_post(ctx: &CliContext, args: PostArgs) -> Result<(), CliError> {
    let (mut model, _) = open_model(ctx, &args.target).await?;
    if let Some(color) = args.color {
        if !model.session.select_color(&color) {
            let palette = model.session.palette().join(", ");
            return Err(CliError::Rejected(format!("{color} is not in this board's palette ({palette})")));
        }
    }
    model.draft.author = args.author;
    model.draft.message = args.message;
    if !matches!(accept(handle(&mut model, WallCommand::PostMessage))?, Effect::PostMessage) {
        return Ok(());
    }

    let submitted = compose::submit(&model.session, &mut model.draft, &ctx.api).await?;
    model.apply_submitted(&submitted);
    println!("{}", submitted.notice.text);
    println!("{}", format_card(&CommentCard::from_comment(&submitted.comment)));
    Ok(())
}

async fn run_comments(ctx: &CliContext, target: &str) -> Result<(), CliError> {
    let (model, setup) = open_model(ctx, target).await?;
    let board_id = wall_board_id(&setup)?;
    let mut poller = CommentPoller::new();
    poller.start(board_id);
    match poller.refresh(&ctx.api).await {
        PollOutcome::Rendered(render) => print_wall(&render),
        PollOutcome::Failed(e) => return Err(e.into()),
        PollOutcome::Idle => print_wall(&model.render),
    }
    Ok(())
}

async fn run_links(ctx: &CliContext, target: &str) -> Result<(), CliError> {
    let (mut model, _) = open_model(ctx, target).await?;
    for (label, kind) in [("Contributors", LinkKind::Contributor), ("Viewers", LinkKind::View)] {
        if let Effect::CopyToClipboard(url) = accept(handle(&mut model, WallCommand::CopyLink(kind)))? {
            println!("{label:<13}{url}");
        }
    }
    if let Some(code) = model.share_links().and_then(|l| l.join_code) {
        println!("{:<13}{code}", "Join code");
    }
    Ok(())
}

async fn run_watch(ctx: &CliContext, target: &str, ticks: Option<u64>) -> Result<(), CliError> {
    let (model, setup) = open_model(ctx, target).await?;
    let board_id = wall_board_id(&setup)?;
    let mut poller = CommentPoller::new();
    poller.start(board_id);

    let remaining = Cell::new(ticks);
    let alive = || match remaining.get() {
        Some(0) => false,
        Some(n) => {
            remaining.set(Some(n - 1));
            true
        }
        None => true,
    };
    let active = model.views.active();
    let mut last: Option<WallRender> = None;
    let watch = run_poller(&mut poller, &ctx.api, ctx.poll_interval, tokio::time::sleep, alive, || active, |render| {
        if last.as_ref() != Some(&render) {
            print_wall(&render);
            last = Some(render);
        }
    });

    tokio::select! {
        () = watch => {}
        _ = tokio::signal::ctrl_c() => tracing::debug!("interrupted"),
    }
    Ok(())
}

/// Resolve `target` and enter the board under the resolved role.
async fn open_model(ctx: &CliContext, target: &str) -> Result<(WallModel, EntrySetup), CliError> {
    let entry = entry_from_target(target);
    let Some(session) = board::open(&ctx.api, &ctx.store, &entry).await? else {
        return Err(CliError::NothingToOpen(target.to_owned()));
    };
    let mut model = WallModel::new(ctx.origin.clone());
    let setup = model.enter(session);
    Ok((model, setup))
}

/// A board URL resolves like the browser would; anything else is a join code.
fn entry_from_target(target: &str) -> EntryPoint {
    match reqwest::Url::parse(target.trim()) {
        Ok(url) => {
            let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
            EntryPoint::from_parts(url.path(), &pairs)
        }
        Err(_) => EntryPoint::Code(target.trim().to_owned()),
    }
}

fn parse_aesthetic(raw: &str) -> Result<Aesthetic, CliError> {
    Aesthetic::from_id(raw).ok_or_else(|| {
        let known: Vec<&str> = Aesthetic::ALL.iter().map(|a| a.id()).collect();
        CliError::UnknownAesthetic(raw.to_owned(), known.join(", "))
    })
}

/// Turn a notice effect into an error; pass any other effect through.
fn accept(effect: Effect) -> Result<Effect, CliError> {
    match effect {
        Effect::Notify(notice) => Err(CliError::Rejected(notice.text)),
        other => Ok(other),
    }
}

fn wall_board_id(setup: &EntrySetup) -> Result<String, CliError> {
    setup
        .poll_board_id
        .clone()
        .ok_or_else(|| CliError::Rejected("Contributors cannot view the wall.".to_owned()))
}

fn print_setup(model: &WallModel, setup: &EntrySetup) {
    println!("Board for {} ({})", setup.recipient_name, model.session.selected_aesthetic.display_name());
    if let Some(id) = model.session.board_id() {
        println!("{:<13}{id}", "Board id");
    }
    println!("{:<13}{}", "Role", model.session.role);
    if let Some(palette) = setup.palette {
        println!("{:<13}{}", "Colors", palette.join(" "));
    }
    if let Some(links) = &setup.share_links {
        println!("{:<13}{}", "Contributors", links.contributor_url);
        println!("{:<13}{}", "Viewers", links.view_url);
        if let Some(code) = &links.join_code {
            println!("{:<13}{code}", "Join code");
        }
    }
    if setup.poll_board_id.is_some() {
        print_wall(&model.render);
    }
}

fn print_wall(render: &WallRender) {
    println!("-- {} message(s) --", render.comment_count());
    if render.viewer.shows_empty_state() {
        println!("No messages yet.");
    }
    for card in &render.viewer.cards {
        println!("{}", format_card(card));
    }
}

fn format_card(card: &CommentCard) -> String {
    format!("[{}] {} ({}): {}", card.time, card.author, card.color, card.message)
}
