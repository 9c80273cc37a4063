use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use client_core::{
    config::normalize_base_url, load_home_feed, load_settings, load_settings_from, mapper,
    AutoConfirm, ClearableField, ClientSettings, ConfirmationProvider, ContentForm, ContentItem,
    ContentTransport, FetchOutcome, HttpTransport, ImageUpload, ListingProfile, ListingView,
    RemoveOutcome, ViewSnapshot,
};
use shared::domain::{ContentId, ContentKind, SortKey};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "newsroom", about = "Browse and manage news and announcements")]
struct Args {
    /// Overrides the api base url from settings and environment.
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Every news item, unpaged.
    Home,
    /// One page of a listing: news, announcements, admin-news, admin-announcements.
    List {
        view: ListingProfile,
        #[arg(long)]
        query: Option<String>,
        /// 1-based page number.
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
        /// id,asc | id,desc | subject,asc | subject,desc
        #[arg(long)]
        sort: Option<SortKey>,
    },
    Show {
        id: i64,
    },
    Create {
        kind: ContentKind,
        #[command(flatten)]
        fields: FormFields,
    },
    /// Fields left out keep their stored value.
    Update {
        kind: ContentKind,
        id: i64,
        #[command(flatten)]
        fields: FormFields,
        #[arg(long, value_enum)]
        clear: Vec<ClearArg>,
    },
    Delete {
        kind: ContentKind,
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    UploadImage {
        id: i64,
        path: PathBuf,
    },
}

#[derive(ClapArgs, Debug, Default)]
struct FormFields {
    #[arg(long)]
    subject: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[arg(long)]
    news_url: Option<String>,
    #[arg(long)]
    valid_until: Option<String>,
    #[arg(long)]
    image_path: Option<String>,
}

impl FormFields {
    fn apply(self, form: &mut ContentForm) {
        let slots = [
            (self.subject, &mut form.subject),
            (self.content, &mut form.content),
            (self.news_url, &mut form.news_url),
            (self.valid_until, &mut form.valid_until),
            (self.image_path, &mut form.image_path),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ClearArg {
    NewsUrl,
    ValidUntil,
    ImagePath,
}

impl From<ClearArg> for ClearableField {
    fn from(arg: ClearArg) -> Self {
        match arg {
            ClearArg::NewsUrl => ClearableField::NewsUrl,
            ClearArg::ValidUntil => ClearableField::ValidUntil,
            ClearArg::ImagePath => ClearableField::ImagePath,
        }
    }
}

struct StdinConfirm;

impl ConfirmationProvider for StdinConfirm {
    fn confirm(&self, message: &str) -> bool {
        eprint!("{message} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(args.config.as_deref(), args.base_url.as_deref())?;
    info!(api_base_url = %settings.api_base_url, "console: settings loaded");
    let transport: Arc<dyn ContentTransport> = Arc::new(HttpTransport::from_settings(&settings)?);

    match args.command {
        Command::Home => {
            let feed = load_home_feed(transport.as_ref()).await?;
            if feed.is_empty() {
                println!("No news yet.");
            }
            for item in &feed {
                print_row(item);
            }
        }
        Command::List {
            view,
            query,
            page,
            size,
            sort,
        } => {
            let view = ListingView::new(view, transport, Arc::new(AutoConfirm), &settings);
            list(&view, query, page, size, sort).await?;
        }
        Command::Show { id } => {
            let wire = transport.get_item(ContentId(id)).await?;
            print_detail(&mapper::normalize(wire));
        }
        Command::Create { kind, fields } => {
            let view = admin_view(kind, transport, Arc::new(AutoConfirm), &settings);
            view.edit_form(|form| fields.apply(form)).await;
            let created = view.submit().await?;
            println!("Created #{}", created.id);
            print_detail(&created);
        }
        Command::Update {
            kind,
            id,
            fields,
            clear,
        } => {
            let view = admin_view(kind, transport, Arc::new(AutoConfirm), &settings);
            let id = ContentId(id);
            let current = view.open_detail(id).await?;
            if current.kind() != kind {
                bail!("item {id} is {}, not {kind}", current.kind());
            }
            view.begin_edit(id).await?;
            view.edit_form(|form| {
                fields.apply(form);
                for field in clear {
                    form.clear(field.into());
                }
            })
            .await;
            let updated = view.submit().await?;
            println!("Updated #{}", updated.id);
            print_detail(&updated);
        }
        Command::Delete { kind, id, yes } => {
            let confirm: Arc<dyn ConfirmationProvider> = if yes {
                Arc::new(AutoConfirm)
            } else {
                Arc::new(StdinConfirm)
            };
            let view = admin_view(kind, transport, confirm, &settings);
            match view.delete(ContentId(id)).await? {
                RemoveOutcome::Removed => println!("Deleted #{id}"),
                RemoveOutcome::Cancelled => println!("Nothing deleted."),
            }
        }
        Command::UploadImage { id, path } => {
            let upload = read_upload(&path).await?;
            let view = admin_view(
                ContentKind::Announcement,
                transport,
                Arc::new(AutoConfirm),
                &settings,
            );
            let updated = view.upload_image(ContentId(id), upload).await?;
            print_detail(&updated);
        }
    }

    Ok(())
}

fn resolve_settings(config: Option<&Path>, base_url: Option<&str>) -> Result<ClientSettings> {
    let mut settings = match config {
        Some(path) => load_settings_from(path)?,
        None => load_settings()?,
    };
    if let Some(base_url) = base_url {
        settings.api_base_url = normalize_base_url(base_url)?;
    }
    Ok(settings)
}

fn admin_view(
    kind: ContentKind,
    transport: Arc<dyn ContentTransport>,
    confirm: Arc<dyn ConfirmationProvider>,
    settings: &ClientSettings,
) -> ListingView {
    ListingView::new(ListingProfile::admin_for(kind), transport, confirm, settings)
}

async fn list(
    view: &ListingView,
    query: Option<String>,
    page: u32,
    size: Option<u32>,
    sort: Option<SortKey>,
) -> Result<()> {
    if let Some(text) = &query {
        view.set_text(text).await;
    }
    // Size and sort changes fetch right away and pick up the pending text.
    let mut outcome = None;
    if let Some(size) = size {
        outcome = Some(view.set_page_size(size).await?);
    }
    if let Some(sort) = sort {
        outcome = Some(view.set_sort_key(sort).await?);
    }
    let outcome = match outcome {
        Some(outcome) => outcome,
        None => view.refresh().await,
    };
    if let FetchOutcome::Failed(err) = outcome {
        bail!("listing failed: {err}");
    }

    if page == 0 {
        bail!("pages are numbered from 1");
    }
    if page > 1 && !view.go_to_page(page - 1).await {
        bail!("page {page} is out of range");
    }

    let snapshot = view.snapshot().await;
    if let Some(err) = &snapshot.last_error {
        bail!("listing failed: {err}");
    }
    print_listing(&snapshot);
    Ok(())
}

async fn read_upload(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("image path has no file name")?
        .to_string();
    let mime_type = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => Some("image/png"),
        Some("jpg" | "jpeg") => Some("image/jpeg"),
        Some("gif") => Some("image/gif"),
        Some("webp") => Some("image/webp"),
        _ => None,
    };
    debug!(%filename, bytes = bytes.len(), "console: image read");
    Ok(ImageUpload {
        filename,
        mime_type: mime_type.map(str::to_string),
        bytes,
    })
}

fn print_listing(snapshot: &ViewSnapshot) {
    if snapshot.page.is_empty() {
        println!("No results.");
    }
    for item in &snapshot.page.items {
        print_row(item);
    }
    println!(
        "-- page {}/{} ({} items, {} per page, sort {})",
        snapshot.pager.page_number,
        snapshot.pager.total_pages,
        snapshot.page.total_items,
        snapshot.query.page_size(),
        snapshot.query.sort_key()
    );
}

fn print_row(item: &ContentItem) {
    let mut row = format!("#{:<5} {}", item.id, item.subject);
    if let Some(valid_until) = item.valid_until() {
        row.push_str(&format!("  (until {valid_until})"));
    }
    println!("{row}");
}

fn print_detail(item: &ContentItem) {
    println!("#{} [{}] {}", item.id, item.kind(), item.subject);
    if !item.content.is_empty() {
        println!("{}", item.content);
    }
    if let Some(url) = item.news_url() {
        println!("link: {url}");
    }
    if let Some(valid_until) = item.valid_until() {
        println!("valid until: {valid_until}");
    }
    if let Some(image) = item.image_path() {
        println!("image: {image}");
    }
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
