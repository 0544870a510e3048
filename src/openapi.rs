use utoipa::OpenApi;

/// OpenAPI documentation for the checkout surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Checkout API",
        description = "Checkout settlement and payment confirmation endpoints"
    ),
    paths(
        crate::handlers::checkout::create_checkout_session,
        crate::handlers::webhooks::payment_webhook,
        crate::handlers::orders::last_order,
    ),
    components(schemas(
        crate::handlers::checkout::CreateCheckoutSessionRequest,
        crate::handlers::checkout::CheckoutSessionResponse,
        crate::handlers::orders::OrderDetail,
        crate::handlers::orders::OrderItemDetail,
        crate::handlers::orders::ShippingInfo,
        crate::errors::ErrorResponse,
    )),
    tags(
        (name = "Checkout", description = "Checkout session creation"),
        (name = "Payments", description = "Payment confirmation webhook"),
        (name = "Orders", description = "Order convenience lookups"),
    )
)]
pub struct ApiDoc;
