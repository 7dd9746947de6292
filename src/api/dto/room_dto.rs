//! Room DTOs for the inspection endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::common_dto::PaginationMeta;
use crate::domain::{Action, RoomSummary};

/// Room summary for `GET /rooms` and `GET /rooms/{room_id}`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummaryDto {
    /// Room identifier.
    pub room_id: String,
    /// Connected sessions.
    pub session_count: usize,
    /// Entries currently in the log.
    pub action_count: usize,
    /// Complete strokes currently in the log.
    pub stroke_count: usize,
    /// Actions appended since creation, including undone ones.
    pub appended_total: u64,
    /// Undo commands applied since creation.
    pub undo_total: u64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Timestamp of the last join, leave, append, or undo.
    pub last_activity_at: DateTime<Utc>,
}

impl From<RoomSummary> for RoomSummaryDto {
    fn from(summary: RoomSummary) -> Self {
        Self {
            room_id: summary.room_id.to_string(),
            session_count: summary.session_count,
            action_count: summary.action_count,
            stroke_count: summary.stroke_count,
            appended_total: summary.appended_total,
            undo_total: summary.undo_total,
            created_at: summary.created_at,
            last_activity_at: summary.last_activity_at,
        }
    }
}

/// Paginated response for `GET /rooms`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomListResponse {
    /// Room summaries on this page, sorted by room id.
    pub data: Vec<RoomSummaryDto>,
    /// Pagination metadata.
    pub pagination: PaginationMeta,
}

/// Response for `GET /rooms/{room_id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomDetailResponse {
    /// Room summary.
    pub room: RoomSummaryDto,
    /// Current log, in the same shape as a `reset` payload.
    #[schema(value_type = Vec<Object>)]
    pub actions: Vec<Action>,
}
