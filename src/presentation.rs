// src/presentation.rs

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{TaskDetail, User};

/// Date format used on task cards (month/day/year).
const CARD_DATE_FORMAT: &str = "%m/%d/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    pub url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Avatar {
    pub user_id: String,
    pub username: String,
    pub picture_url: Option<String>,
}

impl From<&User> for Avatar {
    fn from(user: &User) -> Self {
        Avatar {
            user_id: user.id.clone(),
            username: user.username.clone(),
            picture_url: user.profile_picture_url.clone(),
        }
    }
}

/// Display fields of one card on the board. Built purely from an
/// already-fetched record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCard {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: Option<String>,
    pub tags: Vec<String>,
    pub start_date: String,
    pub due_date: String,
    pub points: Option<String>,
    pub comment_count: usize,
    pub cover_image: Option<CoverImage>,
    /// Assignee first, then author.
    pub avatars: Vec<Avatar>,
}

impl TaskCard {
    pub fn from_detail(detail: &TaskDetail) -> Self {
        let task = &detail.task;
        let cover_image = detail.attachments.first().map(|attachment| CoverImage {
            url: attachment.file_url.clone(),
            alt: attachment.file_name.clone().unwrap_or_default(),
        });
        let avatars = detail
            .assignee
            .iter()
            .chain(detail.author.iter())
            .map(Avatar::from)
            .collect();

        TaskCard {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            status: task.status.to_string(),
            priority: task.priority.map(|p| p.to_string()),
            tags: task.tag_list(),
            start_date: format_card_date(task.start_date),
            due_date: format_card_date(task.due_date),
            points: task.points.map(|points| format!("{} pts", points)),
            comment_count: detail.comments.len(),
            cover_image,
            avatars,
        }
    }

    /// "start - due", leaving out whichever side is unset.
    pub fn date_range(&self) -> String {
        match (self.start_date.is_empty(), self.due_date.is_empty()) {
            (false, false) => format!("{} - {}", self.start_date, self.due_date),
            (false, true) => self.start_date.clone(),
            (true, false) => self.due_date.clone(),
            (true, true) => String::new(),
        }
    }
}

/// Empty string when the date is absent.
pub fn format_card_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format(CARD_DATE_FORMAT).to_string())
        .unwrap_or_default()
}
