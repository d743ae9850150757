//! Business services for the COMANDA backend.
//!
//! Each service is generic over the repository traits it uses (and the
//! entitlement checker where actions are plan-gated), so this crate has
//! no dependency on the database layer. Route handlers never touch
//! repositories for gated actions; they call a service, and the service
//! checks entitlements before acting.

pub mod access_code;
pub mod feedback;
pub mod hq;
pub mod menu;
pub mod order;
pub mod staff;

pub use access_code::{AccessCodeService, MintAccessCode};
pub use feedback::FeedbackService;
pub use hq::HqService;
pub use menu::MenuService;
pub use order::{OrderService, OrderView, PlaceOrder, PlaceOrderLine};
pub use staff::StaffService;
