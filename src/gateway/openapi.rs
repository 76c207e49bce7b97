//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:5001/docs`
//! - OpenAPI JSON: `http://localhost:5001/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::types::{
    BalanceResponse, ErrorResponse, HealthResponse, SendPaymentRequest, SendPaymentResponse,
};

/// Bearer JWT (the `jwt` cookie is accepted too)
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "HS256 token whose `sub` is the user id. Also read from the `jwt` cookie.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Chat Payments API",
        version = "1.0.0",
        description = "Peer-to-peer payments between chat users, with realtime `paymentReceived` pushes over `GET /ws?userId=`."
    ),
    servers(
        (url = "http://localhost:5001", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::payment::send_payment,
        crate::gateway::handlers::payment::get_balance,
    ),
    components(
        schemas(
            SendPaymentRequest,
            SendPaymentResponse,
            BalanceResponse,
            HealthResponse,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Payments", description = "Send payments and read balances"),
        (name = "System", description = "Health")
    )
)]
pub struct ApiDoc;
