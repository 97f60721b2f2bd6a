use crate::dtos::{ReminderDTO, ScanReportDTO};
use calendar_reminders_domain::Share;
use serde::{Deserialize, Serialize};

pub mod sync_object_reminders {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
    #[serde(rename_all = "camelCase")]
    pub enum ObjectAction {
        Created,
        Updated,
        Deleted,
    }

    #[derive(Serialize, Deserialize, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct CalendarMeta {
        pub id: i64,
        pub principal_uri: Option<String>,
        pub display_name: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct ObjectMeta {
        pub uri: String,
        /// Raw iCalendar data, not needed for deletions
        pub calendar_data: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug, Clone)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub action: ObjectAction,
        pub calendar: CalendarMeta,
        #[serde(default)]
        pub shares: Vec<Share>,
        pub object: ObjectMeta,
        /// The user that performed the mutation
        pub session_user: Option<String>,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub reminders: Vec<ReminderDTO>,
    }
}

pub mod delete_calendar_reminders {
    use super::*;

    #[derive(Deserialize)]
    pub struct PathParams {
        pub calendar_id: i64,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub deleted_count: i64,
    }
}

pub mod send_due_reminders {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, Default)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        /// Millis, defaults to the current time
        pub now: Option<i64>,
    }

    pub type APIResponse = ScanReportDTO;
}

pub mod render_notification {
    use super::*;
    use calendar_reminders_domain::InAppNotification;

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct RequestBody {
        pub notification: InAppNotification,
        pub locale: Option<String>,
        /// Millis, defaults to the current time
        pub now: Option<i64>,
    }

    #[derive(Serialize, Deserialize, Debug)]
    #[serde(rename_all = "camelCase")]
    pub struct APIResponse {
        pub subject: String,
        pub message: Option<String>,
    }
}
