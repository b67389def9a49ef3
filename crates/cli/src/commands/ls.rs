//! ls command - List one folder of a bucket
//!
//! Opens a listing at the given prefix, loads as many pages as requested and
//! prints the filtered view.

use std::sync::Arc;

use bv_core::{ListingClient, ListingService};
use clap::Args;

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, ListingOutput, Spinner, listing_table, summary_line};

/// List a folder
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Remote path (profile/bucket[/prefix])
    pub path: String,

    /// Only show entries whose name contains this text (case-insensitive)
    #[arg(short, long, default_value = "")]
    pub filter: String,

    /// Number of pages to load
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub pages: u32,

    /// Load every page
    #[arg(short, long, conflicts_with = "pages")]
    pub all: bool,

    /// Keys requested per page (defaults to the configured page size)
    #[arg(long, value_parser = clap::value_parser!(i32).range(1..=1000))]
    pub page_size: Option<i32>,
}

impl LsArgs {
    /// Continuation pages to load after the first, `None` for all of them
    fn extra_pages(&self) -> Option<usize> {
        if self.all {
            None
        } else {
            Some(self.pages.saturating_sub(1) as usize)
        }
    }
}

/// Execute the ls command
pub(crate) async fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let path = match ctx.bucket_path(&args.path) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let service = match ctx.connect(&path.profile).await {
        Ok(client) => client,
        Err(code) => return code,
    };

    let spinner = Arc::new(Spinner::new(formatter.config(), "Listing"));
    let mut client = ListingClient::new(service, ctx.listing_config(&path.bucket, args.page_size))
        .with_observer(spinner.clone());

    let target = path.to_string();
    list(&mut client, &path.prefix, &args, &target, &spinner, formatter).await
}

/// Open `prefix`, load the requested pages and print the filtered view
///
/// When a continuation page fails, the pages merged so far are printed and the
/// failure still decides the exit code.
async fn list<S>(
    client: &mut ListingClient<S>,
    prefix: &str,
    args: &LsArgs,
    target: &str,
    spinner: &Spinner,
    formatter: &Formatter,
) -> ExitCode
where
    S: ListingService + ?Sized + 'static,
{
    let result = match client.open(prefix).await {
        Ok(()) => client.load_pages(args.extra_pages()).await.map(|_| ()),
        Err(e) => Err(e),
    };
    spinner.finish_and_clear();

    let exit_code = match &result {
        Ok(()) => ExitCode::Success,
        Err(e) => ExitCode::from(e),
    };
    if let Err(e) = &result {
        formatter.error(&format!("Failed to list {target}: {e}"));
        if client.session().is_empty() {
            return exit_code;
        }
        formatter.warning("Listing is incomplete");
    }

    client.set_filter(args.filter.as_str());
    let session = client.session();

    if formatter.is_json() {
        formatter.json(&ListingOutput::new(&client.config().bucket, session));
    } else {
        let view = session.filtered_view();
        if !view.is_empty() {
            formatter.println(&listing_table(&view, formatter.colors_enabled()).to_string());
        }
        formatter.status(&summary_line(session));
    }

    exit_code
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bv_core::{BucketInfo, Error, ListPage, ListRequest, ListingConfig, ObjectRef};
    use clap::Parser;

    use crate::output::OutputConfig;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: LsArgs,
    }

    fn parse(argv: &[&str]) -> Result<LsArgs, clap::Error> {
        let argv = std::iter::once("ls").chain(argv.iter().copied());
        Harness::try_parse_from(argv).map(|h| h.args)
    }

    #[test]
    fn test_ls_defaults_to_one_page() {
        let args = parse(&["prod/media"]).unwrap();
        assert_eq!(args.path, "prod/media");
        assert_eq!(args.filter, "");
        assert_eq!(args.extra_pages(), Some(0));
        assert!(args.page_size.is_none());
    }

    #[test]
    fn test_ls_pages_and_all() {
        assert_eq!(
            parse(&["prod/media", "--pages", "3"]).unwrap().extra_pages(),
            Some(2)
        );
        assert_eq!(parse(&["prod/media", "--all"]).unwrap().extra_pages(), None);
        assert!(parse(&["prod/media", "--all", "--pages", "2"]).is_err());
        assert!(parse(&["prod/media", "--pages", "0"]).is_err());
    }

    #[test]
    fn test_ls_page_size_bounds() {
        let args = parse(&["prod/media", "--page-size", "50", "-f", "jpg"]).unwrap();
        assert_eq!(args.page_size, Some(50));
        assert_eq!(args.filter, "jpg");
        assert!(parse(&["prod/media", "--page-size", "0"]).is_err());
        assert!(parse(&["prod/media", "--page-size", "1001"]).is_err());
    }

    /// Continuation pages always fail; the first page fails only when `deny_open` is set
    struct FlakyBucket {
        deny_open: bool,
    }

    #[async_trait]
    impl ListingService for FlakyBucket {
        async fn list_page(&self, request: ListRequest) -> bv_core::Result<ListPage> {
            if request.continuation_token.is_some() {
                return Err(Error::Network("connection reset".into()));
            }
            if self.deny_open {
                return Err(Error::Auth("access denied".into()));
            }
            Ok(ListPage {
                object_items: vec![ObjectRef::new("photos/a.jpg", 1)],
                next_continuation_token: Some("t1".into()),
                is_truncated: true,
                ..Default::default()
            })
        }

        async fn list_buckets(&self) -> bv_core::Result<Vec<BucketInfo>> {
            Ok(Vec::new())
        }
    }

    fn quiet() -> (Spinner, Formatter) {
        let config = OutputConfig {
            quiet: true,
            ..Default::default()
        };
        (Spinner::new(&config, "Listing"), Formatter::new(config))
    }

    fn flaky(deny_open: bool) -> ListingClient<FlakyBucket> {
        ListingClient::new(Arc::new(FlakyBucket { deny_open }), ListingConfig::new("media"))
    }

    #[tokio::test]
    async fn test_list_single_page_succeeds() {
        let mut client = flaky(false);
        let args = parse(&["prod/media/photos"]).unwrap();
        let (spinner, formatter) = quiet();

        let code = list(
            &mut client,
            "photos/",
            &args,
            "prod/media/photos/",
            &spinner,
            &formatter,
        )
        .await;

        assert_eq!(code, ExitCode::Success);
        assert_eq!(client.files().len(), 1);
    }

    #[tokio::test]
    async fn test_list_failed_continuation_keeps_entries_and_error_code() {
        let mut client = flaky(false);
        let args = parse(&["prod/media/photos", "--all"]).unwrap();
        let (spinner, formatter) = quiet();

        let code = list(
            &mut client,
            "photos/",
            &args,
            "prod/media/photos/",
            &spinner,
            &formatter,
        )
        .await;

        assert_eq!(code, ExitCode::NetworkError);
        assert_eq!(client.files().len(), 1);
        assert!(client.has_more());
    }

    #[tokio::test]
    async fn test_list_failed_open_reports_error_code() {
        let mut client = flaky(true);
        let args = parse(&["prod/media"]).unwrap();
        let (spinner, formatter) = quiet();

        let code = list(&mut client, "", &args, "prod/media/", &spinner, &formatter).await;

        assert_eq!(code, ExitCode::AuthError);
        assert!(client.session().is_empty());
    }
}
