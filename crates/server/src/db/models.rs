use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Npo,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Donor => "donor",
            Role::Npo => "npo",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "donor" => Ok(Role::Donor),
            "npo" => Ok(Role::Npo),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Lifecycle of a pickup. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl PickupStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PickupStatus::Scheduled => "Scheduled",
            PickupStatus::Completed => "Completed",
            PickupStatus::Cancelled => "Cancelled",
        }
    }

    pub fn can_transition_to(self, next: PickupStatus) -> bool {
        matches!(
            (self, next),
            (PickupStatus::Scheduled, PickupStatus::Completed)
                | (PickupStatus::Scheduled, PickupStatus::Cancelled)
        )
    }
}

impl fmt::Display for PickupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickupStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scheduled" => Ok(PickupStatus::Scheduled),
            "completed" => Ok(PickupStatus::Completed),
            "cancelled" | "canceled" => Ok(PickupStatus::Cancelled),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonorProfile {
    pub donor_store_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub date_of_birth: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NpoProfile {
    pub npo_id: i64,
    pub npo_name: String,
    pub contact_person: Option<String>,
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonationRecord {
    pub donation_id: i64,
    pub donor_store_id: Option<i64>,
    pub donation_date: String,
    pub donation_amount: f64,
    pub donation_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DonationItem {
    pub item_id: i64,
    pub donation_id: i64,
    pub item_name: String,
    pub item_description: Option<String>,
    pub item_quantity: i64,
    pub item_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Pickup {
    pub pickup_id: i64,
    pub donor_store_id: Option<i64>,
    pub scheduled_date: String,
    pub pickup_address: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DistributionCenter {
    pub center_id: i64,
    pub center_name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub contact_person: Option<String>,
    pub contact_phone: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InventoryItem {
    pub inventory_id: i64,
    pub center_id: i64,
    pub center_name: Option<String>,
    pub item_name: String,
    pub quantity: i64,
    pub last_updated: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DistributedItem {
    pub distribution_id: i64,
    pub center_id: Option<i64>,
    pub item_name: String,
    pub item_quantity: i64,
    pub distribution_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeliveryConfirmation {
    pub confirmation_id: i64,
    pub distribution_id: i64,
    pub received_by: Option<String>,
    pub received_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackReview {
    pub review_id: i64,
    pub donor_store_id: Option<i64>,
    pub npo_id: i64,
    pub rating: i64,
    pub comments: Option<String>,
    pub review_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub notification_id: i64,
    pub sender_role: Option<String>,
    pub recipient_role: Option<String>,
    pub message: String,
    pub related_item_id: Option<i64>,
    pub notification_type: Option<String>,
    pub sent_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminLog {
    pub log_id: i64,
    pub admin_id: Option<i64>,
    pub action_type: String,
    pub target_table: String,
    pub target_id: Option<i64>,
    pub timestamp: String,
    pub notes: Option<String>,
}
