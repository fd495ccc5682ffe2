use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Mainstreet API",
        version = "0.1.0",
        description = r#"
# Mainstreet Business Directory API

Backend for a business-directory platform: business profiles with branding and
photo galleries, a hierarchical menu (category → subcategory → item) with
cascading deletes, guest WiFi credential sharing, and admin moderation.

## Authentication

Mutating endpoints require a JWT access token:

```
Authorization: Bearer <your-jwt-token>
```

Tokens are obtained from `/auth/login` and renewed via `/auth/refresh`.
Directory reads (business list, menus, WiFi) are public.
"#,
        contact(name = "Mainstreet", email = "support@mainstreet.example")
    ),
    servers(
        (url = "/", description = "Current host")
    ),
    tags(
        (name = "Businesses", description = "Business directory and profiles"),
        (name = "Menu", description = "Menu hierarchy management"),
        (name = "WiFi", description = "Guest WiFi credentials"),
        (name = "Users", description = "Account moderation"),
        (name = "Auth", description = "Sessions and tokens")
    ),
    paths(
        // Menu hierarchy (the core workflow)
        crate::handlers::menu::list_categories,
        crate::handlers::menu::create_category,
        crate::handlers::menu::update_category,
        crate::handlers::menu::delete_category,
        crate::handlers::menu::list_subcategories,
        crate::handlers::menu::delete_subcategory,
        crate::handlers::menu::list_items,
        crate::handlers::menu::create_item,

        // Directory
        crate::handlers::businesses::list_businesses,
        crate::handlers::businesses::create_business,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            crate::services::menu::CascadeOutcome,
            crate::services::menu::CreateCategoryInput,
            crate::services::menu::UpdateCategoryInput,
            crate::services::menu::CreateSubcategoryInput,
            crate::services::menu::UpdateSubcategoryInput,
            crate::services::menu::CreateItemInput,
            crate::services::menu::UpdateItemInput,
            crate::services::directory::CreateBusinessInput,
            crate::services::directory::UpdateBusinessInput,
            crate::services::directory::BusinessCascadeOutcome,
            crate::services::wifi::CreateWifiInput,
            crate::services::wifi::UpdateWifiInput,
            crate::entities::wifi_network::SecurityType,
            crate::entities::user::Role,
            crate::auth::SessionInfo,
            crate::auth::TokenPair,
        )
    )
)]
pub struct ApiDoc;

/// Mounts Swagger UI backed by the generated document
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_builds() {
        let doc = ApiDoc::openapi();
        let json = doc.to_json().expect("openapi serializes");
        assert!(json.contains("Mainstreet"));
        assert!(json.contains("/api/v1/menu/categories"));
    }
}
