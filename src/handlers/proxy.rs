use actix_web::{web, HttpRequest, HttpResponse, Result as ActixResult};

use crate::proxy::forward_request;
use crate::settings::SmartHireSettings;

/// Path prefix the browser uses for upstream API calls
pub const API_PROXY_PREFIX: &str = "/api/v1";

/// Proxy `ANY /api/v1/{tail}` to `{api_base}/{tail}`
///
/// # Errors
///
/// Never fails; upstream and configuration errors are rendered as JSON
/// responses by [`forward_request`].
pub async fn proxy_api(
    req: HttpRequest,
    tail: web::Path<String>,
    body: web::Bytes,
    settings: web::Data<SmartHireSettings>,
) -> ActixResult<HttpResponse> {
    let upstream_path = format!("/{}", tail.into_inner());
    Ok(forward_request(&req, body, &settings.api.base_url, &upstream_path).await)
}
