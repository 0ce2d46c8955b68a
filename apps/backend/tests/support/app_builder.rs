use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App, Error};
use tenancy_backend::middleware::{RequestTrace, StructuredLogger, TraceSpan};
use tenancy_backend::routes;
use tenancy_backend::state::app_state::AppState;

/// Build the test service with the production routes and middleware stack
/// (CORS excepted).
pub async fn create_test_app(
    state: AppState,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = Error> {
    test::init_service(
        App::new()
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(web::Data::new(state))
            .configure(routes::configure),
    )
    .await
}
