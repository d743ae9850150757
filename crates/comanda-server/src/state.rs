//! Application state: concretely-typed services over the SurrealDB
//! repositories, shared across handlers.

use std::sync::Arc;

use comanda_auth::{AuthConfig, AuthService, HqAuthService};
use comanda_db::DbManager;
use comanda_db::repository::{
    SurrealAccessCodeRepository, SurrealClientRepository, SurrealFeedbackRepository,
    SurrealHqOperatorRepository, SurrealMenuItemRepository, SurrealOrderRepository,
    SurrealSessionRepository, SurrealSnapshotRepository, SurrealStaffRepository,
    SurrealSubscriptionEventRepository,
};
use comanda_entitle::EntitlementService;
use comanda_service::{
    AccessCodeService, FeedbackService, HqService, MenuService, OrderService, StaffService,
};
use surrealdb::engine::any::Any;

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

pub type Entitle =
    EntitlementService<SurrealClientRepository<Any>, SurrealSnapshotRepository<Any>>;
pub type Orders =
    OrderService<SurrealOrderRepository<Any>, SurrealMenuItemRepository<Any>, Entitle>;
pub type Menu = MenuService<SurrealMenuItemRepository<Any>, Entitle>;
pub type CustomerFeedback = FeedbackService<SurrealFeedbackRepository<Any>, Entitle>;
pub type AccessCodes = AccessCodeService<SurrealAccessCodeRepository<Any>, Entitle>;
pub type Staff =
    StaffService<SurrealStaffRepository<Any>, SurrealSessionRepository<Any>, Entitle>;
pub type Hq = HqService<SurrealClientRepository<Any>, SurrealSubscriptionEventRepository<Any>>;
pub type StaffAuth = AuthService<SurrealStaffRepository<Any>, SurrealSessionRepository<Any>>;
pub type HqAuth = HqAuthService<SurrealHqOperatorRepository<Any>, SurrealSessionRepository<Any>>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub auth: Arc<AuthConfig>,
    pub db: DbManager,
    /// Tenant slug resolution for the public routes.
    pub clients: SurrealClientRepository<Any>,
    /// Customer table sessions opened by access-code redemption.
    pub sessions: SurrealSessionRepository<Any>,
    pub orders: Arc<Orders>,
    pub menu: Arc<Menu>,
    pub feedback: Arc<CustomerFeedback>,
    pub access_codes: Arc<AccessCodes>,
    pub staff: Arc<Staff>,
    pub hq: Arc<Hq>,
    pub staff_auth: Arc<StaffAuth>,
    pub hq_auth: Arc<HqAuth>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(db: DbManager, config: ServerConfig) -> Self {
        let conn = db.client().clone();

        let clients = SurrealClientRepository::new(conn.clone());
        let snapshots = SurrealSnapshotRepository::new(conn.clone());
        let sessions = SurrealSessionRepository::new(conn.clone());
        let staff_repo = match &config.auth.pepper {
            Some(pepper) => SurrealStaffRepository::with_pepper(conn.clone(), pepper.clone()),
            None => SurrealStaffRepository::new(conn.clone()),
        };
        let operators = match &config.auth.pepper {
            Some(pepper) => {
                SurrealHqOperatorRepository::with_pepper(conn.clone(), pepper.clone())
            }
            None => SurrealHqOperatorRepository::new(conn.clone()),
        };

        // Every gated service gets its own authority-plus-snapshot
        // resolver over the same connection.
        let entitle = || EntitlementService::new(clients.clone(), snapshots.clone());

        let orders = OrderService::new(
            SurrealOrderRepository::new(conn.clone()),
            SurrealMenuItemRepository::new(conn.clone()),
            entitle(),
        );
        let menu = MenuService::new(SurrealMenuItemRepository::new(conn.clone()), entitle());
        let feedback =
            FeedbackService::new(SurrealFeedbackRepository::new(conn.clone()), entitle());
        let access_codes =
            AccessCodeService::new(SurrealAccessCodeRepository::new(conn.clone()), entitle());
        let staff = StaffService::new(staff_repo.clone(), sessions.clone(), entitle());
        let hq = HqService::new(
            clients.clone(),
            SurrealSubscriptionEventRepository::new(conn.clone()),
        );
        let staff_auth = AuthService::new(staff_repo, sessions.clone(), config.auth.clone());
        let hq_auth = HqAuthService::new(operators, sessions.clone(), config.auth.clone());

        Self {
            auth: Arc::new(config.auth.clone()),
            config: Arc::new(config),
            db,
            clients,
            sessions,
            orders: Arc::new(orders),
            menu: Arc::new(menu),
            feedback: Arc::new(feedback),
            access_codes: Arc::new(access_codes),
            staff: Arc::new(staff),
            hq: Arc::new(hq),
            staff_auth: Arc::new(staff_auth),
            hq_auth: Arc::new(hq_auth),
            limiter: Arc::new(RateLimiter::default()),
        }
    }
}
