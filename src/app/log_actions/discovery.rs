//! Metadata discovery: log groups and their fields.

#![warn(clippy::all, rust_2018_idioms)]

use crate::app::data_plane::cloudwatch_logs::{Field, Frame, LogStoreClient};

use super::error::LogActionError;
use super::request::{DescribeLogGroupsParams, GetLogGroupFieldsParams};

pub const DEFAULT_DESCRIBE_LIMIT: i32 = 50;

/// List log groups in the order the store reports them, truncated to the
/// requested limit. An empty prefix is treated as no prefix.
pub async fn describe_log_groups(
    client: &dyn LogStoreClient,
    params: &DescribeLogGroupsParams,
    default_limit: i32,
) -> Result<Frame, LogActionError> {
    let prefix = params
        .log_group_name_prefix
        .as_deref()
        .filter(|p| !p.is_empty());
    let limit = params.limit.unwrap_or(default_limit);

    let groups = client.describe_log_groups(prefix, limit).await?;
    let keep = usize::try_from(limit).unwrap_or(0);

    trace_debug!(
        "DescribeLogGroups(prefix={:?}, limit={}) -> {} groups",
        prefix,
        limit,
        groups.len()
    );

    Ok(Frame::try_new(
        "logGroups",
        vec![Field::strings(
            "logGroupName",
            groups.into_iter().take(keep).map(|g| g.name),
        )],
    )?)
}

/// Field names of a log group with the share of sampled records holding each
pub async fn get_log_group_fields(
    client: &dyn LogStoreClient,
    ref_id: &str,
    params: &GetLogGroupFieldsParams,
) -> Result<Frame, LogActionError> {
    let fields = client
        .get_log_group_fields(&params.log_group_name, params.time)
        .await?;

    let mut names = Vec::with_capacity(fields.len());
    let mut percents = Vec::with_capacity(fields.len());

    for field in fields {
        if !(0..=100).contains(&field.percent) {
            log_warn!(
                "Field {} of {} reported out-of-range percentage {}",
                field.name,
                params.log_group_name,
                field.percent
            );
        }
        percents.push(field.percent.clamp(0, 100));
        names.push(field.name);
    }

    Ok(Frame::try_new(
        ref_id,
        vec![Field::strings("name", names), Field::int64s("percent", percents)],
    )?
    .with_ref_id(ref_id))
}
