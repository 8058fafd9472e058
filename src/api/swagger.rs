use utoipa::OpenApi;
use utoipa::openapi::security::{SecurityScheme, HttpAuthScheme, HttpBuilder};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Alumni Connect API",
        version = "1.0.0",
        description = "REST API for the alumni and student networking platform.\n\n**Authentication:** every `/api/v1` endpoint expects an identity-provider ID token as `Authorization: Bearer <token>`.\n\n**Features:**\n- Registration with college-domain role assignment\n- Admin verification and role management\n- Department discussion boards\n- Job postings\n- Events with registrations and Excel export\n- Direct messaging (REST + `/ws` relay)\n- Achievement showcase",
        contact(
            name = "Alumni Connect Team"
        )
    ),
    paths(
        // Auth
        crate::api::auth::register,
        crate::api::auth::get_me,
        crate::api::auth::verify_token,

        // Users
        crate::api::users::list_users,
        crate::api::users::list_alumni,
        crate::api::users::get_my_profile,
        crate::api::users::update_my_profile,
        crate::api::users::get_user,

        // Health & Metrics
        crate::api::health::health_check,
        crate::api::metrics::get_metrics,
    ),
    components(
        schemas(
            crate::models::Role,
            crate::models::Department,
            crate::models::RegisterUserRequest,
            crate::models::UpdateProfileRequest,
            crate::models::ChangeRoleRequest,
            crate::models::VerifyUserRequest,
            crate::models::UserResponse,
            crate::models::WorkMode,
            crate::models::CreateJobRequest,
            crate::models::UpdateJobRequest,
            crate::models::JobResponse,
            crate::models::PosterSummary,
            crate::models::EventStatus,
            crate::models::EventCreator,
            crate::models::CreateEventRequest,
            crate::models::UpdateEventRequest,
            crate::models::EventResponse,

            // Health & Metrics
            crate::api::health::HealthResponse,
            crate::api::metrics::MetricsResponse,
        )
    ),
    tags(
        (name = "Auth", description = "Profile registration against the identity provider's token."),
        (name = "Users", description = "User directory and the caller's own profile."),
        (name = "Health", description = "Health check and system metrics endpoints for monitoring service status."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Identity-provider ID token"))
                        .build()
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_core_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/auth/register"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
        assert!(doc.components.unwrap().security_schemes.contains_key("bearer_auth"));
    }
}
