use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::error;

use pvz_core::DomainError;
use pvz_infra::services::{AuthError, ServiceError};
use pvz_infra::store::StoreError;
use pvz_products::LedgerError;
use pvz_receptions::ReceptionError;

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        ServiceError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),

        ServiceError::Reception(ReceptionError::InvalidPickupPoint(_)) => {
            json_error(StatusCode::NOT_FOUND, "pickup_point_not_found", message)
        }
        ServiceError::Reception(ReceptionError::ConflictOpenReceptionExists { .. }) => {
            json_error(StatusCode::CONFLICT, "reception_in_progress", message)
        }
        ServiceError::Reception(ReceptionError::AlreadyClosed(_)) => {
            json_error(StatusCode::CONFLICT, "reception_already_closed", message)
        }

        ServiceError::Ledger(LedgerError::UnsupportedProductType(_)) => {
            json_error(StatusCode::BAD_REQUEST, "unsupported_product_type", message)
        }
        ServiceError::Ledger(LedgerError::NoActiveReception { .. }) => {
            json_error(StatusCode::CONFLICT, "no_active_reception", message)
        }
        ServiceError::Ledger(LedgerError::NothingToRemove(_)) => {
            json_error(StatusCode::CONFLICT, "nothing_to_remove", message)
        }

        ServiceError::Auth(AuthError::Credentials(_)) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_credentials", message)
        }
        ServiceError::Auth(AuthError::EmailTaken(_)) => json_error(StatusCode::CONFLICT, "email_taken", message),
        ServiceError::Auth(AuthError::UnknownEmail(_)) => json_error(StatusCode::NOT_FOUND, "user_not_found", message),
        ServiceError::Auth(AuthError::WrongPassword) => {
            json_error(StatusCode::UNAUTHORIZED, "invalid_credentials", message)
        }
        ServiceError::Auth(AuthError::Password(_) | AuthError::Token(_)) => {
            error!(error = %message, "credential processing failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "auth_error", "internal error")
        }

        ServiceError::Store(StoreError::Conflict(_)) => {
            json_error(StatusCode::CONFLICT, "write_conflict", "concurrent update, retry the request")
        }
        ServiceError::Store(e) => {
            error!(error = %e, "storage failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "internal error")
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Parse a path/body identifier, answering 400 on garbage.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse()
        .map_err(|e: DomainError| json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))
}

#[cfg(test)]
mod tests {
    use pvz_core::{PickupPointId, ReceptionId};

    use super::*;

    #[test]
    fn conflict_kinds_map_to_409() {
        let pvz = PickupPointId::new();
        let cases = [
            ServiceError::from(ReceptionError::ConflictOpenReceptionExists {
                pickup_point_id: pvz,
                reception_id: None,
            }),
            ServiceError::from(ReceptionError::AlreadyClosed(ReceptionId::new())),
            ServiceError::from(LedgerError::NothingToRemove(ReceptionId::new())),
            ServiceError::from(StoreError::Conflict("reception changed".into())),
        ];
        for err in cases {
            assert_eq!(service_error_to_response(err).status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn unknown_pickup_point_is_404_and_bad_type_is_400() {
        let missing = ServiceError::from(ReceptionError::InvalidPickupPoint(PickupPointId::new()));
        assert_eq!(service_error_to_response(missing).status(), StatusCode::NOT_FOUND);

        let bad_type = ServiceError::from(LedgerError::UnsupportedProductType("мебель".into()));
        assert_eq!(service_error_to_response(bad_type).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn backend_failures_stay_opaque_500s() {
        let res = service_error_to_response(ServiceError::from(StoreError::Backend("connection reset".into())));
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn garbage_id_is_rejected() {
        let res = parse_id::<PickupPointId>("not-a-uuid").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
