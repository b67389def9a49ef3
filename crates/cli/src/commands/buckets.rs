//! buckets command - List the buckets visible to a profile

use bv_core::BucketInfo;
use clap::Args;
use comfy_table::{Table, presets};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;
use crate::output::Spinner;

/// List buckets
#[derive(Args, Debug)]
pub struct BucketsArgs {
    /// Profile name
    pub profile: String,

    /// Only show buckets whose name contains this text (case-insensitive)
    #[arg(short, long, default_value = "")]
    pub filter: String,
}

/// Output structure for buckets command (JSON format)
#[derive(Debug, Serialize)]
struct BucketsOutput {
    profile: String,
    buckets: Vec<BucketInfo>,
}

/// Execute the buckets command
pub(crate) async fn execute(args: BucketsArgs, ctx: &Context) -> ExitCode {
    let formatter = ctx.formatter();

    let client = match ctx.connect(&args.profile).await {
        Ok(client) => client,
        Err(code) => return code,
    };

    let spinner = Spinner::new(formatter.config(), "Listing buckets");
    let result = bv_core::list_buckets(client.as_ref(), ctx.fetch_timeout()).await;
    spinner.finish_and_clear();

    let buckets = match result {
        Ok(buckets) => filter_buckets(buckets, &args.filter),
        Err(e) => {
            formatter.error(&format!("Failed to list buckets: {e}"));
            return ExitCode::from(&e);
        }
    };

    if formatter.is_json() {
        formatter.json(&BucketsOutput {
            profile: args.profile,
            buckets,
        });
    } else if buckets.is_empty() {
        if args.filter.is_empty() {
            formatter.status("No buckets");
        } else {
            formatter.status(&format!("No buckets matching '{}'", args.filter));
        }
    } else {
        formatter.println(&buckets_table(&buckets).to_string());
    }

    ExitCode::Success
}

/// Buckets whose name contains `query`, ignoring case
fn filter_buckets(buckets: Vec<BucketInfo>, query: &str) -> Vec<BucketInfo> {
    if query.is_empty() {
        return buckets;
    }
    let query = query.to_lowercase();
    buckets
        .into_iter()
        .filter(|bucket| bucket.name.to_lowercase().contains(&query))
        .collect()
}

fn buckets_table(buckets: &[BucketInfo]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING);
    table.set_header(vec!["NAME", "CREATED"]);
    for bucket in buckets {
        let created = bucket
            .created
            .map(|t| t.strftime("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        table.add_row(vec![format!("{}/", bucket.name), created]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buckets_table() {
        let mut dated = BucketInfo::new("media");
        dated.created = Some("2024-01-15T10:30:00Z".parse().unwrap());
        let rendered = buckets_table(&[dated, BucketInfo::new("logs")]).to_string();

        assert!(rendered.contains("media/"));
        assert!(rendered.contains("2024-01-15 10:30:00"));
        assert!(rendered.contains("logs/"));
    }

    #[test]
    fn test_filter_buckets() {
        let buckets = || {
            vec![
                BucketInfo::new("Media-Prod"),
                BucketInfo::new("logs"),
                BucketInfo::new("media-dev"),
            ]
        };

        let names = |found: Vec<BucketInfo>| -> Vec<String> {
            found.into_iter().map(|b| b.name).collect()
        };
        assert_eq!(
            names(filter_buckets(buckets(), "MEDIA")),
            ["Media-Prod", "media-dev"]
        );
        assert_eq!(names(filter_buckets(buckets(), "prod")), ["Media-Prod"]);
        assert_eq!(filter_buckets(buckets(), "").len(), 3);
        assert!(filter_buckets(buckets(), "backup").is_empty());
    }

    #[test]
    fn test_buckets_output_json() {
        let output = BucketsOutput {
            profile: "prod".into(),
            buckets: vec![BucketInfo::new("media")],
        };
        insta::assert_json_snapshot!(output, @r#"
        {
          "profile": "prod",
          "buckets": [
            {
              "name": "media"
            }
          ]
        }
        "#);
    }
}
