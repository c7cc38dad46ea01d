use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pvz_auth::{Role, User};
use pvz_core::{PickupPointId, ProductId, ReceptionId, UserId};
use pvz_pickup_points::{City, PickupPoint};
use pvz_products::{Product, ProductType};
use pvz_receptions::{Reception, ReceptionStatus};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct DummyLoginRequest {
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePickupPointRequest {
    pub city: String,
    pub registration_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenReceptionRequest {
    pub pvz_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProductRequest {
    #[serde(rename = "type")]
    pub product_type: String,
    pub pvz_id: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub role: Role,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PickupPointResponse {
    pub id: PickupPointId,
    pub registration_date: DateTime<Utc>,
    pub city: City,
}

impl From<&PickupPoint> for PickupPointResponse {
    fn from(p: &PickupPoint) -> Self {
        Self {
            id: p.id_typed(),
            registration_date: p.registered_at(),
            city: p.city(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceptionResponse {
    pub id: ReceptionId,
    pub date_time: DateTime<Utc>,
    pub pvz_id: PickupPointId,
    pub status: ReceptionStatus,
}

impl From<&Reception> for ReceptionResponse {
    fn from(r: &Reception) -> Self {
        Self {
            id: r.id_typed(),
            date_time: r.created_at(),
            pvz_id: r.pickup_point_id(),
            status: r.status(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
    pub date_time: DateTime<Utc>,
    #[serde(rename = "type")]
    pub product_type: ProductType,
    pub reception_id: ReceptionId,
}

impl From<&Product> for ProductResponse {
    fn from(p: &Product) -> Self {
        Self {
            id: p.id_typed(),
            date_time: p.created_at(),
            product_type: p.product_type(),
            reception_id: p.reception_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_request_reads_type_and_pvz_id() {
        let req: AddProductRequest =
            serde_json::from_str(r#"{"type":"обувь","pvzId":"0190b2a4-0000-7000-8000-000000000001"}"#).unwrap();
        assert_eq!(req.product_type, "обувь");
        assert_eq!(req.pvz_id, "0190b2a4-0000-7000-8000-000000000001");
    }

    #[test]
    fn reception_response_uses_camel_case() {
        let reception = Reception::restore(
            ReceptionId::new(),
            PickupPointId::new(),
            ReceptionStatus::InProgress,
            Utc::now(),
            None,
            UserId::new(),
        );
        let json = serde_json::to_value(ReceptionResponse::from(&reception)).unwrap();
        assert_eq!(json["status"], "in_progress");
        assert_eq!(json["pvzId"], reception.pickup_point_id().to_string());
        assert!(json.get("dateTime").is_some());
    }
}
