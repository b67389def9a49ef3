//! browse command - Interactive folder navigation
//!
//! Reads one command per line from stdin while pages load in the background.
//! Navigating away while a fetch is in flight drops that fetch; the listing
//! session discards anything that still arrives for a superseded prefix.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context as _;
use bv_core::path::folder_name;
use bv_core::{
    Error, FetchResponse, ListingClient, ListingEvent, ListingService, PageOutcome,
    PendingFetch, Status, child_prefix, parent_prefix,
};
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ListingOutput, listing_table, summary_line};

const HELP: &str = "\
Commands:
  ls               show the current listing
  more, m, <enter> load the next page
  cd <folder>      open a sub-folder (cd .. goes up)
  up               open the parent folder
  filter [text]    show only names containing text; no text clears
  reload           reopen the current folder
  help             show this help
  quit             leave";

/// Browse a bucket interactively
#[derive(Args, Debug)]
pub struct BrowseArgs {
    /// Remote path to start from (profile/bucket[/prefix])
    pub path: String,

    /// Keys requested per page (defaults to the configured page size)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=1000))]
    pub page_size: Option<i32>,
}

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    List,
    More,
    Enter(String),
    Up,
    Filter(String),
    Reload,
    Help,
    Quit,
}

impl FromStr for BrowseCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        match word {
            "" | "more" | "m" => Ok(BrowseCommand::More),
            "ls" | "l" => Ok(BrowseCommand::List),
            "cd" => match rest {
                "" => Err("cd needs a folder name".to_string()),
                ".." => Ok(BrowseCommand::Up),
                name => Ok(BrowseCommand::Enter(name.to_string())),
            },
            "up" | ".." => Ok(BrowseCommand::Up),
            "filter" | "f" => Ok(BrowseCommand::Filter(rest.to_string())),
            "reload" | "r" => Ok(BrowseCommand::Reload),
            "help" | "h" | "?" => Ok(BrowseCommand::Help),
            "quit" | "exit" | "q" => Ok(BrowseCommand::Quit),
            other => Err(format!("Unknown command '{other}', type 'help' for a list")),
        }
    }
}

/// Execute the browse command
pub(crate) async fn execute(args: BrowseArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter().clone();

    let path = match ctx.bucket_path(&args.path) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let service = match ctx.connect(&path.profile).await {
        Ok(client) => client,
        Err(code) => return code,
    };

    let events = formatter.clone();
    let observer = move |event: &ListingEvent| match event {
        ListingEvent::LoadingStarted { prefix, initial } => {
            let verb = if *initial { "Opening" } else { "Loading more of" };
            events.status(&format!("{verb} /{prefix}"));
        }
        ListingEvent::StaleDiscarded { prefix } => {
            events.status(&format!("Ignored late response for /{prefix}"));
        }
        ListingEvent::PageMerged { .. } | ListingEvent::Failed { .. } => {}
    };

    let mut client = ListingClient::new(service, ctx.listing_config(&path.bucket, args.page_size))
        .with_observer(Arc::new(observer));

    formatter.status("Type 'help' for commands");
    let stdin = BufReader::new(tokio::io::stdin());
    match run(&mut client, &path.prefix, stdin, &formatter).await {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            formatter.error(&format!("{e:#}"));
            ExitCode::GeneralError
        }
    }
}

/// Drive `client` from `input` until quit or end of input
async fn run<S, R>(
    client: &mut ListingClient<S>,
    start: &str,
    input: R,
    formatter: &Formatter,
) -> anyhow::Result<()>
where
    S: ListingService + ?Sized + 'static,
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut pending = Some(client.begin_open(start));

    loop {
        tokio::select! {
            // Deliver completed pages before reading further input.
            biased;

            response = next_response(&mut pending) => {
                pending = None;
                match client.finish(response) {
                    Ok(PageOutcome::Merged { .. }) => render(client, formatter),
                    Ok(PageOutcome::Discarded) => {}
                    Err(e) => {
                        formatter.error(&format!("Failed to list /{}: {e}", client.prefix()));
                        if let Some(hint) = retry_hint(&e, client.status()) {
                            formatter.status(hint);
                        }
                    }
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read input")? else {
                    break;
                };
                let command = line.parse::<BrowseCommand>();
                tracing::debug!(?command, "browse input");
                match command {
                    Ok(BrowseCommand::Quit) => break,
                    Ok(command) => apply(command, client, &mut pending, formatter),
                    Err(message) => formatter.warning(&message),
                }
            }
        }
    }

    Ok(())
}

/// Resolves with the in-flight fetch, or never when there is none
async fn next_response(pending: &mut Option<PendingFetch>) -> FetchResponse {
    match pending {
        Some(fetch) => fetch.await,
        None => std::future::pending().await,
    }
}

fn apply<S>(
    command: BrowseCommand,
    client: &mut ListingClient<S>,
    pending: &mut Option<PendingFetch>,
    formatter: &Formatter,
) where
    S: ListingService + ?Sized + 'static,
{
    match command {
        BrowseCommand::List => render(client, formatter),
        BrowseCommand::More => {
            if pending.is_some() {
                formatter.status("Still loading");
            } else if let Some(fetch) = client.begin_load_more() {
                *pending = Some(fetch);
            } else if client.status() == Status::Idle {
                formatter.warning("Nothing loaded, try 'reload'");
            } else {
                formatter.status("No more entries");
            }
        }
        BrowseCommand::Enter(name) => match find_folder(client.folders(), &name) {
            Some(folder) => {
                let target = child_prefix(client.prefix(), folder);
                client.set_filter("");
                *pending = Some(client.begin_open(&target));
            }
            None => formatter.warning(&format!("No folder named '{name}' in /{}", client.prefix())),
        },
        BrowseCommand::Up => match parent_prefix(client.prefix()) {
            Some(parent) => {
                client.set_filter("");
                *pending = Some(client.begin_open(&parent));
            }
            None => formatter.status("Already at the bucket root"),
        },
        BrowseCommand::Filter(query) => {
            client.set_filter(query);
            render(client, formatter);
        }
        BrowseCommand::Reload => {
            let current = client.prefix().to_string();
            *pending = Some(client.begin_open(&current));
        }
        BrowseCommand::Help => formatter.println(HELP),
        BrowseCommand::Quit => {}
    }
}

/// Command that repeats a failed fetch, for transient failures only
fn retry_hint(err: &Error, status: Status) -> Option<&'static str> {
    if !err.is_retryable() {
        return None;
    }
    match status {
        Status::Idle => Some("Type 'reload' to try again"),
        _ => Some("Type 'more' to try again"),
    }
}

/// Folder matching `name` by its last segment or its full prefix
fn find_folder<'a>(folders: &'a [String], name: &str) -> Option<&'a str> {
    let name = name.trim_end_matches('/');
    folders
        .iter()
        .map(String::as_str)
        .find(|folder| folder_name(folder) == name || folder.trim_end_matches('/') == name)
}

fn render<S>(client: &ListingClient<S>, formatter: &Formatter)
where
    S: ListingService + ?Sized + 'static,
{
    let session = client.session();
    if formatter.is_json() {
        formatter.json(&ListingOutput::new(&client.config().bucket, session));
        return;
    }

    formatter.println(&format!("{}/{}", client.config().bucket, session.prefix()));
    let view = session.filtered_view();
    if !view.is_empty() {
        formatter.println(&listing_table(&view, formatter.colors_enabled()).to_string());
    }
    formatter.status(&summary_line(session));
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bv_core::{BucketInfo, ListPage, ListRequest, ListingConfig, ObjectRef};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    use crate::output::OutputConfig;

    fn parse(line: &str) -> Result<BrowseCommand, String> {
        line.parse()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse(""), Ok(BrowseCommand::More));
        assert_eq!(parse("  m "), Ok(BrowseCommand::More));
        assert_eq!(parse("ls"), Ok(BrowseCommand::List));
        assert_eq!(parse("cd 2023"), Ok(BrowseCommand::Enter("2023".into())));
        assert_eq!(
            parse("cd  summer trip/"),
            Ok(BrowseCommand::Enter("summer trip/".into()))
        );
        assert_eq!(parse("cd .."), Ok(BrowseCommand::Up));
        assert_eq!(parse("up"), Ok(BrowseCommand::Up));
        assert_eq!(parse("filter  Jpg "), Ok(BrowseCommand::Filter("Jpg".into())));
        assert_eq!(parse("filter"), Ok(BrowseCommand::Filter(String::new())));
        assert_eq!(parse("q"), Ok(BrowseCommand::Quit));
        assert_eq!(parse("exit"), Ok(BrowseCommand::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse("cd").is_err());
        assert!(parse("rm everything").unwrap_err().contains("'rm'"));
    }

    #[test]
    fn test_retry_hint() {
        let reset = Error::Network("connection reset".into());
        assert_eq!(
            retry_hint(&reset, Status::Idle),
            Some("Type 'reload' to try again")
        );
        assert_eq!(
            retry_hint(&Error::Timeout(30), Status::Ready),
            Some("Type 'more' to try again")
        );
        assert_eq!(
            retry_hint(&Error::Auth("denied".into()), Status::Idle),
            None
        );
    }

    #[test]
    fn test_find_folder() {
        let folders = vec!["photos/2023/".to_string(), "photos/2024/".to_string()];
        assert_eq!(find_folder(&folders, "2023"), Some("photos/2023/"));
        assert_eq!(find_folder(&folders, "2024/"), Some("photos/2024/"));
        assert_eq!(find_folder(&folders, "photos/2024"), Some("photos/2024/"));
        assert_eq!(find_folder(&folders, "2025"), None);
    }

    /// Two-level bucket: a root folder and a `photos/` folder split over two pages
    struct FakeBucket;

    #[async_trait]
    impl ListingService for FakeBucket {
        async fn list_page(&self, request: ListRequest) -> bv_core::Result<ListPage> {
            let page = match (request.prefix.as_str(), request.continuation_token.as_deref()) {
                ("", None) => ListPage {
                    folder_prefixes: vec!["photos/".into()],
                    object_items: vec![ObjectRef::new("readme.txt", 10)],
                    ..Default::default()
                },
                ("photos/", None) => ListPage {
                    object_items: vec![ObjectRef::new("photos/1.jpg", 100)],
                    next_continuation_token: Some("t1".into()),
                    is_truncated: true,
                    ..Default::default()
                },
                ("photos/", Some("t1")) => ListPage {
                    object_items: vec![ObjectRef::new("photos/2.jpg", 200)],
                    ..Default::default()
                },
                _ => ListPage::default(),
            };
            Ok(page)
        }

        async fn list_buckets(&self) -> bv_core::Result<Vec<BucketInfo>> {
            Ok(vec![BucketInfo::new("media")])
        }
    }

    fn quiet() -> Formatter {
        Formatter::new(OutputConfig {
            quiet: true,
            ..Default::default()
        })
    }

    fn client() -> ListingClient<FakeBucket> {
        ListingClient::new(Arc::new(FakeBucket), ListingConfig::new("media"))
    }

    #[tokio::test]
    async fn test_run_navigates_and_pages() {
        let mut client = client();
        let input: &[u8] = b"cd photos\nmore\nfilter 2\n";

        run(&mut client, "", input, &quiet()).await.unwrap();

        assert_eq!(client.prefix(), "photos/");
        assert_eq!(client.files().len(), 2);
        assert!(!client.has_more());
        assert_eq!(client.filter(), "2");
        assert_eq!(client.filtered_view().len(), 1);
    }

    #[tokio::test]
    async fn test_run_up_clears_filter() {
        let mut client = client();
        let input: &[u8] = b"cd photos\nfilter jpg\nup\nquit\nls\n";

        run(&mut client, "", input, &quiet()).await.unwrap();

        assert_eq!(client.prefix(), "");
        assert_eq!(client.filter(), "");
        assert_eq!(client.folders(), ["photos/".to_string()]);
    }

    #[tokio::test]
    async fn test_run_unknown_folder_keeps_listing() {
        let mut client = client();
        let input: &[u8] = b"cd nowhere\nup\n";

        run(&mut client, "", input, &quiet()).await.unwrap();

        assert_eq!(client.prefix(), "");
        assert_eq!(client.session().len(), 2);
    }

    /// Root lists `slow/` and `fast/`; opening `slow/` blocks until the gate opens
    struct GatedBucket {
        gate: Arc<Notify>,
        slow_served: AtomicUsize,
    }

    #[async_trait]
    impl ListingService for GatedBucket {
        async fn list_page(&self, request: ListRequest) -> bv_core::Result<ListPage> {
            let page = match request.prefix.as_str() {
                "" => ListPage {
                    folder_prefixes: vec!["fast/".into(), "slow/".into()],
                    ..Default::default()
                },
                "slow/" => {
                    self.gate.notified().await;
                    self.slow_served.fetch_add(1, Ordering::SeqCst);
                    ListPage {
                        object_items: vec![ObjectRef::new("slow/late.txt", 1)],
                        ..Default::default()
                    }
                }
                "fast/" => {
                    self.gate.notify_waiters();
                    ListPage {
                        object_items: vec![ObjectRef::new("fast/a.txt", 1)],
                        ..Default::default()
                    }
                }
                _ => ListPage::default(),
            };
            Ok(page)
        }

        async fn list_buckets(&self) -> bv_core::Result<Vec<BucketInfo>> {
            Ok(Vec::new())
        }
    }

    fn gated() -> (Arc<GatedBucket>, ListingClient<GatedBucket>) {
        let service = Arc::new(GatedBucket {
            gate: Arc::new(Notify::new()),
            slow_served: AtomicUsize::new(0),
        });
        let client = ListingClient::new(Arc::clone(&service), ListingConfig::new("media"));
        (service, client)
    }

    fn keys<S: ListingService + ?Sized + 'static>(client: &ListingClient<S>) -> Vec<String> {
        client.files().iter().map(|f| f.key.clone()).collect()
    }

    #[tokio::test]
    async fn test_run_up_while_loading_drops_fetch() {
        let (service, mut client) = gated();
        let input: &[u8] = b"cd slow\nup\n";

        run(&mut client, "", input, &quiet()).await.unwrap();

        assert_eq!(client.prefix(), "");
        assert_eq!(client.folders(), ["fast/".to_string(), "slow/".to_string()]);
        assert!(keys(&client).iter().all(|key| !key.starts_with("slow/")));
        assert_eq!(service.slow_served.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_cd_while_loading_shows_only_new_folder() {
        let (service, mut client) = gated();
        // Opening fast/ releases the gate the slow/ fetch was waiting on.
        let input: &[u8] = b"cd slow\nup\ncd fast\nls\n";

        run(&mut client, "", input, &quiet()).await.unwrap();

        assert_eq!(client.prefix(), "fast/");
        assert_eq!(keys(&client), ["fast/a.txt".to_string()]);
        assert_eq!(service.slow_served.load(Ordering::SeqCst), 0);
    }
}
