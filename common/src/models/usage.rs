//! Usage statistics snapshots attached to catalog entities.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::validation::{check_rules, FieldShape, ValidationError};
use crate::models::reader::{read_count, read_date, read_number, FieldReader};

/// Access count and its percentile rank for one aggregation window.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    /// Number of accesses in the window.
    pub count: u64,

    /// Rank of `count` among entities of the same kind, 0–100.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile_rank: Option<f64>,
}

#[derive(Debug, Default, Validate)]
struct UsageStatsDraft {
    count: Option<u64>,

    #[validate(range(min = 0.0, max = 100.0))]
    percentile_rank: Option<f64>,
}

impl UsageStats {
    pub(crate) fn read(
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Self> {
        let reader = FieldReader::open(value, path, FieldShape::UsageStats, errors)?;
        let draft = UsageStatsDraft {
            count: reader.required("count", errors, read_count),
            percentile_rank: reader.optional("percentileRank", errors, read_number),
        };
        check_rules(&draft, path, errors);

        Some(Self {
            count: draft.count?,
            percentile_rank: draft.percentile_rank,
        })
    }
}

/// Latest usage snapshot for an entity: daily stats plus optional weekly and
/// monthly roll-ups, as of `date`.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsageDetails {
    pub daily_stats: UsageStats,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekly_stats: Option<UsageStats>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_stats: Option<UsageStats>,

    /// Date the snapshot was computed for.
    pub date: NaiveDate,
}

impl UsageDetails {
    /// Every window is read and checked, even when a sibling is malformed.
    pub(crate) fn read(
        value: &Value,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Option<Self> {
        let reader = FieldReader::open(value, path, FieldShape::UsageDetails, errors)?;
        let before = errors.len();
        let daily_stats = reader.required("dailyStats", errors, UsageStats::read);
        let weekly_stats = reader.optional("weeklyStats", errors, UsageStats::read);
        let monthly_stats = reader.optional("monthlyStats", errors, UsageStats::read);
        let date = reader.required("date", errors, read_date);

        if errors.len() != before {
            return None;
        }
        Some(Self {
            daily_stats: daily_stats?,
            weekly_stats,
            monthly_stats,
            date: date?,
        })
    }
}
