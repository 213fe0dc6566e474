//! Car booking actions
//!
//! Placeholder business logic: every action answers with a confirmation
//! string built from its arguments. What matters here is the access policy
//! attached to each one.

use a2a_actions::{
    ActionArgs, ActionDescriptor, ActionRegistry, AuthPredicate, HandlerError, RegistryError,
};
use a2a_http_server::BasicAuthResolver;
use serde_json::{Value, json};
use tracing::info;

pub const AGENT_NAME: &str = "car booking";
pub const AGENT_DESCRIPTION: &str = "actions related to car booking";

pub const ROLE_USER: &str = "USER";
pub const ROLE_ADMIN: &str = "ADMIN";

/// `(path, required roles, body)` of the access-probe routes
pub fn content_routes() -> Vec<(&'static str, AuthPredicate, &'static str)> {
    vec![
        ("/public", AuthPredicate::Any, "Public content"),
        ("/secured", AuthPredicate::all([ROLE_USER]), "Secured content"),
        ("/admin", AuthPredicate::all([ROLE_ADMIN]), "Admin content"),
    ]
}

/// Demo accounts
pub fn demo_users(realm: &str) -> BasicAuthResolver {
    BasicAuthResolver::new(realm)
        .user("user", "password", [ROLE_USER])
        .user("admin", "admin", [ROLE_ADMIN, ROLE_USER])
}

/// Register every car booking action
pub fn register(registry: &ActionRegistry) -> Result<(), RegistryError> {
    registry.register_all(actions()?)?;
    info!(actions = registry.len(), "Registered car booking actions");
    Ok(())
}

fn actions() -> Result<Vec<ActionDescriptor>, RegistryError> {
    Ok(vec![
        ActionDescriptor::builder("bookCar")
            .description("Book a car for the given details")
            .string_param("carType")
            .string_param("pickupLocation")
            .string_param("dropLocation")
            .requires(AuthPredicate::any_of([ROLE_USER]))
            .handler_fn(|args: ActionArgs| async move {
                let (car_type, pickup, drop) = (args.str(0)?, args.str(1)?, args.str(2)?);
                info!(car_type, pickup, drop, "Booking car");
                Ok::<Value, HandlerError>(json!(format!(
                    "Car of type {} has been booked from {} to {}",
                    car_type, pickup, drop
                )))
            })
            .build()?,
        ActionDescriptor::builder("cancelCarBooking")
            .description("Cancel a car booking")
            .string_param("bookingId")
            .requires(AuthPredicate::all([ROLE_ADMIN]))
            .handler_fn(|args: ActionArgs| async move {
                let booking_id = args.str(0)?;
                info!(booking_id, "Cancelling car booking");
                Ok::<Value, HandlerError>(json!(format!(
                    "Car booking with ID {} has been cancelled",
                    booking_id
                )))
            })
            .build()?,
        ActionDescriptor::builder("getBookingStatus")
            .description("Get booking status of a car")
            .string_param("bookingId")
            .handler_fn(|args: ActionArgs| async move {
                Ok::<Value, HandlerError>(json!(format!(
                    "The status of booking ID {} is confirmed",
                    args.str(0)?
                )))
            })
            .build()?,
        ActionDescriptor::builder("blockCarForMaintenance")
            .description("Block a car for maintenance")
            .string_param("carId")
            .string_param("reason")
            .requires(AuthPredicate::all([ROLE_ADMIN]))
            .handler_fn(|args: ActionArgs| async move {
                let (car_id, reason) = (args.str(0)?, args.str(1)?);
                info!(car_id, "Blocking car for maintenance");
                Ok::<Value, HandlerError>(json!(format!(
                    "Car {} blocked for maintenance: {}",
                    car_id, reason
                )))
            })
            .build()?,
        ActionDescriptor::builder("listCarTypes")
            .description("View available car types")
            .handler_fn(|_args: ActionArgs| async {
                Ok::<Value, HandlerError>(json!("Available car types: Economy, Compact, SUV, Luxury"))
            })
            .build()?,
        ActionDescriptor::builder("updatePickupLocation")
            .description("Update pickup location for booking")
            .string_param("bookingId")
            .string_param("newLocation")
            .requires(AuthPredicate::any_of([ROLE_USER, ROLE_ADMIN]))
            .handler_fn(|args: ActionArgs| async move {
                let (booking_id, location) = (args.str(0)?, args.str(1)?);
                info!(booking_id, "Updating pickup location");
                Ok::<Value, HandlerError>(json!(format!(
                    "Pickup location updated to {} for booking {}",
                    location, booking_id
                )))
            })
            .build()?,
        ActionDescriptor::builder("getCarPricing")
            .description("Get pricing for car type")
            .string_param("carType")
            .handler_fn(|args: ActionArgs| async move {
                Ok::<Value, HandlerError>(json!(format!(
                    "Pricing for {} is $50 per day",
                    args.str(0)?
                )))
            })
            .build()?,
        ActionDescriptor::builder("generateBookingReport")
            .description("Generate booking report")
            .string_param("dateRange")
            .requires(AuthPredicate::all([ROLE_ADMIN]))
            .handler_fn(|args: ActionArgs| async move {
                let date_range = args.str(0)?;
                info!(date_range, "Generating booking report");
                Ok::<Value, HandlerError>(json!(format!(
                    "Booking report generated for period: {}",
                    date_range
                )))
            })
            .build()?,
    ])
}
