//! Wayfarer CLI - command-line client for the Wayfarer travel network
//!
//! Talks to the REST backend with the same session pipeline the app uses.
//! `compose` runs fully offline and writes the composited JPEG to disk.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::EnvFilter;

use wayfarer_core::api::SearchScope;
use wayfarer_core::compositor::{parse_hex_color, FontSpec};
use wayfarer_core::config::DEFAULT_API_URL;
use wayfarer_core::realtime::{self, InboxUpdate, RealtimeChannel, SocketFrames};
use wayfarer_core::types::ConnectionStatus;
use wayfarer_core::{
    Api, ClientConfig, ClientError, Compositor, CredentialStore, HttpPlacesProvider, Inbox,
    JourneyDraft, PagedList, PlacesProvider, ReqwestTransport, Storage, TextOverlay, Toast,
    TokenKind, Transform,
};

type CliApi = Api<ReqwestTransport, Storage>;

/// Background used by text journeys and text cards when none is given
const DEFAULT_BACKGROUND: &str = "#3B82F6";

/// Wayfarer CLI - share journeys, chat with connections, find places
#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Data directory for the credential database
    #[arg(long, global = true, env = "WAYFARER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Backend API base URL
    #[arg(long, global = true, env = "WAYFARER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Realtime Socket.IO endpoint (derived from the API URL when omitted)
    #[arg(long, global = true, env = "WAYFARER_REALTIME_URL")]
    realtime_url: Option<String>,

    /// API key for place autocomplete and geocoding
    #[arg(long, global = true, env = "WAYFARER_MAPS_KEY", hide_env_values = true)]
    maps_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and session state
    Info,

    /// Log in with email and password
    Login {
        email: String,
        /// Password (read from stdin when omitted)
        #[arg(long, env = "WAYFARER_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Log out and forget stored credentials
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Show the post feed
    Feed {
        /// First page to fetch
        #[arg(short, long, default_value_t = 1)]
        page: u32,
        /// How many pages to walk
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },

    /// Create journeys
    Journey {
        #[command(subcommand)]
        action: JourneyAction,
    },

    /// Manage connections
    Connections {
        #[command(subcommand)]
        action: ConnectionAction,
    },

    /// Read and send direct messages
    Chats {
        #[command(subcommand)]
        action: ChatAction,
    },

    /// Read notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationAction,
    },

    /// Search users, posts and groups
    Search {
        query: String,
        /// all, users, posts or groups
        #[arg(short, long, default_value = "all")]
        scope: String,
    },

    /// Look up places
    Places {
        #[command(subcommand)]
        action: PlacesAction,
    },

    /// Composite an image (or a text card) into a journey JPEG, offline
    Compose {
        /// Source image; omit for a solid text card
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Where to write the JPEG
        #[arg(short, long)]
        output: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
        /// Background color for text cards
        #[arg(long, default_value = DEFAULT_BACKGROUND)]
        background: String,
        /// Print the result as a data URI as well
        #[arg(long)]
        data_uri: bool,
    },
}

/// Preview adjustments shared by `compose` and `journey create-photo`
#[derive(clap::Args)]
struct EditArgs {
    #[arg(long, default_value_t = 1.0)]
    scale: f32,
    /// Rotation in degrees
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    rotate: f32,
    /// Pan offset in preview pixels, as X,Y
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    pan: Option<(f32, f32)>,
    /// Overlay text
    #[arg(long)]
    text: Option<String>,
    /// Overlay anchor in preview pixels, as X,Y (default: preview center)
    #[arg(long, value_parser = parse_pair, allow_hyphen_values = true)]
    at: Option<(f32, f32)>,
    #[arg(long, default_value_t = 24.0)]
    font_size: f32,
    #[arg(long, default_value = "#FFFFFF")]
    color: String,
}

#[derive(Subcommand)]
enum JourneyAction {
    /// Share a text journey
    CreateText {
        text: String,
        #[arg(long, default_value = DEFAULT_BACKGROUND)]
        background: String,
    },
    /// Share a photo journey, composited locally
    CreatePhoto {
        path: PathBuf,
        #[command(flatten)]
        edit: EditArgs,
    },
    /// Share a video journey
    CreateVideo {
        path: PathBuf,
        /// MIME type (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConnectionAction {
    /// List connections
    List {
        /// pending, accepted, rejected or blocked
        #[arg(long)]
        status: Option<String>,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Send a connection request
    Request { user_id: String },
    /// Accept a pending request
    Accept { connection_id: String },
    /// Reject a pending request
    Reject { connection_id: String },
}

#[derive(Subcommand)]
enum ChatAction {
    /// List conversations
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show messages in a conversation
    Show {
        chat_id: String,
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Send a message
    Send { chat_id: String, message: String },
    /// Print inbox changes pushed by the backend until interrupted
    Listen {
        /// Your user id, for unread counting (looked up when omitted)
        #[arg(long)]
        me: Option<String>,
        /// Read frames from stdin, one per line, instead of the socket
        #[arg(long)]
        stdin: bool,
    },
}

#[derive(Subcommand)]
enum NotificationAction {
    /// List notifications
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Mark one notification, or all with --all, as read
    Read {
        notification_id: Option<String>,
        #[arg(long, conflicts_with = "notification_id")]
        all: bool,
    },
}

#[derive(Subcommand)]
enum PlacesAction {
    /// Suggest places for partial input
    Autocomplete { input: String },
    /// Resolve an address to coordinates
    Geocode { address: String },
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("wayfarer={}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".wayfarer")
        .join("data")
}

fn parse_pair(raw: &str) -> Result<(f32, f32), String> {
    let (x, y) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{}'", raw))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

fn guess_video_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "mp4" | "m4v" => Some("video/mp4"),
        "mov" => Some("video/quicktime"),
        "webm" => Some("video/webm"),
        _ => None,
    }
}

fn parse_status(raw: &str) -> Result<ConnectionStatus> {
    Ok(match raw.to_ascii_lowercase().as_str() {
        "pending" => ConnectionStatus::Pending,
        "accepted" => ConnectionStatus::Accepted,
        "rejected" => ConnectionStatus::Rejected,
        "blocked" => ConnectionStatus::Blocked,
        other => bail!("unknown connection status '{}'", other),
    })
}

fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let mut config = ClientConfig::new(&cli.api_url, data_dir)?;
    if let Some(key) = &cli.maps_key {
        config = config.with_maps_api_key(key.clone());
    }
    if let Some(url) = &cli.realtime_url {
        config = config.with_realtime_url(url)?;
    }
    Ok(config)
}

fn open_api(config: &ClientConfig) -> Result<CliApi> {
    let storage = Storage::new(config.database_path())
        .with_context(|| format!("opening {}", config.database_path().display()))?;
    let transport = ReqwestTransport::new(config)?;
    Ok(Api::new(transport, storage, config))
}

impl EditArgs {
    fn transform(&self) -> Transform {
        Transform {
            scale: self.scale,
            rotation_deg: self.rotate,
            pan: self.pan.unwrap_or((0.0, 0.0)),
        }
    }

    fn overlay(&self, compositor: &Compositor) -> Result<Option<TextOverlay>> {
        let Some(text) = &self.text else {
            return Ok(None);
        };
        let font = FontSpec::new("sans-serif", self.font_size, &self.color)?;
        let preview = compositor.preview();
        let anchor = self.at.unwrap_or((
            preview.width as f32 / 2.0,
            preview.height as f32 / 2.0,
        ));
        Ok(Some(TextOverlay::new(text.clone(), font, anchor)))
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        match err.downcast_ref::<ClientError>() {
            Some(client_err) => {
                debug!(error = %client_err, "Command failed");
                eprintln!("Error: {}", Toast::from_error(client_err).message);
            }
            None => eprintln!("Error: {:#}", err),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    match cli.command {
        Commands::Info => {
            let storage = Storage::new(config.database_path())?;
            let session = if storage.token(TokenKind::Access)?.is_some() {
                "active"
            } else if storage.token(TokenKind::Refresh)?.is_some() {
                "refreshable"
            } else {
                "none"
            };
            println!("Wayfarer v{}", env!("CARGO_PKG_VERSION"));
            println!("API:            {}", config.api_base_url);
            println!("Realtime:       {}", config.realtime_endpoint()?);
            println!("Data directory: {}", config.data_dir.display());
            println!(
                "Places:         {}",
                if config.maps_api_key.is_some() { "configured" } else { "not configured" }
            );
            println!("Session:        {}", session);
        }

        Commands::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => read_password_line().await?,
            };
            let api = open_api(&config)?;
            let user = api.login(&email, &password).await?;
            info!(user_id = %user.id, "Logged in");
            println!("Logged in as {} ({})", user.display_name(), user.email);
        }

        Commands::Logout => {
            let api = open_api(&config)?;
            api.logout().await?;
            println!("Logged out.");
        }

        Commands::Whoami => {
            let api = signed_in(&config)?;
            let user = api.me().await?;
            println!("{}", user.display_name());
            println!("  ID:    {}", user.id);
            println!("  Email: {}", user.email);
            if let Some(location) = &user.location {
                println!("  From:  {}", location);
            }
        }

        Commands::Feed { page, pages } => {
            let api = signed_in(&config)?;
            let mut feed = PagedList::new();
            let mut next = page.max(1);
            for _ in 0..pages.max(1) {
                let fetched = api.feed(next).await?;
                feed.append_page(fetched);
                if !feed.has_more() {
                    break;
                }
                next = feed.next_page();
            }
            if feed.is_empty() {
                println!("Your feed is empty.");
            }
            for post in feed.iter() {
                println!(
                    "[{}] {} - {} ({} likes, {} comments)",
                    post.id,
                    post.author.name,
                    post.created_at.format("%Y-%m-%d %H:%M"),
                    post.like_count,
                    post.comment_count
                );
                println!("    {}", post.content);
                if let Some(location) = &post.location {
                    println!("    @ {}", location);
                }
            }
            if feed.has_more() {
                println!("More available from page {}.", feed.next_page());
            }
        }

        Commands::Journey { action } => {
            let api = signed_in(&config)?;
            let draft = match action {
                JourneyAction::CreateText { text, background } => {
                    JourneyDraft::text(text, background)
                }
                JourneyAction::CreatePhoto { path, edit } => {
                    let image = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    JourneyDraft::Photo {
                        image: image.into(),
                        transform: edit.transform(),
                        overlay: edit.overlay(api.compositor())?,
                    }
                }
                JourneyAction::CreateVideo { path, mime } => {
                    let mime = match mime {
                        Some(m) => m,
                        None => guess_video_mime(&path)
                            .map(str::to_string)
                            .context("cannot guess the video type, pass --mime")?,
                    };
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    JourneyDraft::video(bytes, mime)
                }
            };
            let journey = api.create_journey(draft).await?;
            println!("Shared {} journey {}", journey.kind.as_str(), journey.id);
        }

        Commands::Connections { action } => {
            let api = signed_in(&config)?;
            match action {
                ConnectionAction::List { status, page } => {
                    let status = status.as_deref().map(parse_status).transpose()?;
                    let page = api.connections(page, status).await?;
                    if page.items.is_empty() {
                        println!("No connections.");
                    }
                    for c in &page.items {
                        println!(
                            "[{}] {} -> {} ({})",
                            c.id, c.requester.name, c.recipient.name, c.status
                        );
                    }
                }
                ConnectionAction::Request { user_id } => {
                    let c = api.request_connection(&user_id).await?;
                    println!("Request sent to {} ({})", c.recipient.name, c.status);
                }
                ConnectionAction::Accept { connection_id } => {
                    let c = api.accept_connection(&connection_id).await?;
                    println!("Connected with {}", c.requester.name);
                }
                ConnectionAction::Reject { connection_id } => {
                    let c = api.reject_connection(&connection_id).await?;
                    println!("Rejected request from {}", c.requester.name);
                }
            }
        }

        Commands::Chats { action } => match action {
            ChatAction::Listen { me, stdin } => {
                let (me, frames) = if stdin {
                    let Some(me) = me else {
                        bail!("--stdin needs --me <user-id>");
                    };
                    (me, stdin_frames())
                } else {
                    let api = signed_in(&config)?;
                    // Goes through the refresh pipeline, so the stored token is current
                    let user = api.me().await?;
                    let token = api.client().store().token(TokenKind::Access)?;
                    let frames = realtime::connect(&config, token.as_deref()).await?;
                    println!("Listening as {} on {}", user.id, config.realtime_endpoint()?);
                    (me.unwrap_or(user.id), frames)
                };
                listen(me, frames).await?
            }
            ChatAction::List { page } => {
                let api = signed_in(&config)?;
                let page = api.chats(page).await?;
                if page.items.is_empty() {
                    println!("No conversations.");
                }
                for chat in &page.items {
                    let names: Vec<&str> =
                        chat.participants.iter().map(|p| p.name.as_str()).collect();
                    let preview = chat
                        .last_message
                        .as_ref()
                        .map(|m| m.preview(40))
                        .unwrap_or_default();
                    println!(
                        "[{}] {} ({} unread) {}",
                        chat.id,
                        names.join(", "),
                        chat.unread_count,
                        preview
                    );
                }
            }
            ChatAction::Show { chat_id, page } => {
                let api = signed_in(&config)?;
                let page = api.messages(&chat_id, page).await?;
                for m in &page.items {
                    println!(
                        "{} {}: {}",
                        m.created_at.format("%H:%M"),
                        m.sender.name,
                        m.content
                    );
                }
                if page.has_more {
                    println!("Older messages on page {}.", page.page + 1);
                }
            }
            ChatAction::Send { chat_id, message } => {
                let api = signed_in(&config)?;
                let sent = api.send_message(&chat_id, &message).await?;
                println!("Sent {}", sent.id);
            }
        },

        Commands::Notifications { action } => {
            let api = signed_in(&config)?;
            match action {
                NotificationAction::List { page } => {
                    let page = api.notifications(page).await?;
                    if page.items.is_empty() {
                        println!("No notifications.");
                    }
                    for n in &page.items {
                        let marker = if n.is_read { " " } else { "*" };
                        println!("{} [{}] {}", marker, n.id, n.message);
                    }
                }
                NotificationAction::Read {
                    notification_id,
                    all,
                } => {
                    let message = match (notification_id, all) {
                        (_, true) => api.mark_all_notifications_read().await?,
                        (Some(id), false) => api.mark_notification_read(&id).await?,
                        (None, false) => bail!("pass a notification id or --all"),
                    };
                    println!("{}", message.unwrap_or_else(|| "Marked as read.".into()));
                }
            }
        }

        Commands::Search { query, scope } => {
            let scope: SearchScope = scope.parse().map_err(anyhow::Error::msg)?;
            let api = signed_in(&config)?;
            let results = api.search(&query, scope).await?;
            if results.is_empty() {
                println!("No results.");
            }
            for user in &results.users {
                println!("user  [{}] {}", user.id, user.name);
            }
            for post in &results.posts {
                println!("post  [{}] {}: {}", post.id, post.author.name, post.content);
            }
            for group in &results.groups {
                println!("group [{}] {}", group.id, group.name);
            }
        }

        Commands::Places { action } => {
            let provider = HttpPlacesProvider::new(&config)?;
            match action {
                PlacesAction::Autocomplete { input } => {
                    for s in provider.autocomplete(&input).await? {
                        println!("[{}] {}", s.place_id, s.description);
                    }
                }
                PlacesAction::Geocode { address } => {
                    for p in provider.geocode(&address).await? {
                        println!("{} ({:.6}, {:.6})", p.address, p.lat, p.lng);
                    }
                }
            }
        }

        Commands::Compose {
            input,
            output,
            edit,
            background,
            data_uri,
        } => {
            let compositor = Compositor::new();
            let overlay = edit.overlay(&compositor)?;
            let composite = match input {
                Some(path) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("reading {}", path.display()))?;
                    compositor.compose_bytes(&bytes, edit.transform(), overlay.as_ref())?
                }
                None => {
                    let Some(overlay) = overlay else {
                        bail!("a text card needs --text when no --input is given");
                    };
                    compositor.render_text_card(parse_hex_color(&background)?, &overlay)?
                }
            };
            tokio::fs::write(&output, &composite.jpeg)
                .await
                .with_context(|| format!("writing {}", output.display()))?;
            println!(
                "Wrote {}x{} JPEG to {}",
                composite.width,
                composite.height,
                output.display()
            );
            if data_uri {
                println!("{}", composite.to_data_uri());
            }
        }
    }

    Ok(())
}

/// Open the API, refusing to go online without stored credentials
fn signed_in(config: &ClientConfig) -> Result<CliApi> {
    let api = open_api(config)?;
    if !api.client().has_session()? {
        bail!("not logged in, run `wayfarer login <email>` first");
    }
    Ok(api)
}

async fn read_password_line() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("reading password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("no password given");
    }
    Ok(password)
}

fn stdin_frames() -> SocketFrames {
    let lines = BufReader::new(tokio::io::stdin()).lines();
    Box::pin(stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            _ => None,
        }
    }))
}

/// Run frames through the real-time pump and print inbox changes.
async fn listen(me: String, frames: SocketFrames) -> Result<()> {
    let channel = RealtimeChannel::new(Inbox::new(me));
    let mut updates = channel.subscribe();

    let cancel = channel.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, closing realtime channel");
            cancel.cancel();
        }
    });
    let pump = channel.spawn(frames);

    let printer = tokio::spawn(async move {
        loop {
            let update = match updates.recv().await {
                Ok(update) => update,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Inbox updates dropped");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match update {
                InboxUpdate::ChatAdded { chat_id } => println!("new chat {}", chat_id),
                InboxUpdate::ChatUpdated { chat_id } => println!("chat {} updated", chat_id),
                InboxUpdate::MessageAdded {
                    chat_id,
                    message_id,
                } => println!("message {} in chat {}", message_id, chat_id),
            }
        }
    });

    let stats = pump.await.context("realtime pump panicked")?;
    drop(channel);
    let _ = printer.await;

    println!(
        "{} frames: {} applied, {} ignored, {} malformed",
        stats.frames, stats.applied, stats.ignored, stats.malformed
    );
    Ok(())
}
